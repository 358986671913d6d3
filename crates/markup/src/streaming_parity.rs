//! Chunk-boundary parity for the streaming tokenizer.
//!
//! Invariant under test: for any document and any partition of its bytes into
//! chunks, the normalised event stream equals the one produced by a single
//! `write` of the whole document. Deterministic plans cover fixed sizes,
//! every single split point and token-adjacent boundaries; seeded fuzz plans
//! add reproducible random partitions.
//!
//! Set `MARKUP_PARITY_SEEDS` to raise the fuzz coverage locally.

use crate::test_utils::{Collector, Event, normalize};
use crate::{Tokenizer, TokenizerConfig};

const DEFAULT_SEEDS: usize = 40;
const SEED_MIX: u64 = 0x9e3779b97f4a7c15;

fn cases() -> Vec<(&'static str, TokenizerConfig, &'static str)> {
    let decoding = TokenizerConfig {
        decode_entities: true,
        ..TokenizerConfig::default()
    };
    let xml_decoding = TokenizerConfig {
        xml_mode: true,
        decode_entities: true,
        ..TokenizerConfig::default()
    };
    let with_div = TokenizerConfig {
        special_tags: vec!["div".into()],
        ..TokenizerConfig::default()
    };
    vec![
        ("plain", TokenizerConfig::default(), "hello world"),
        (
            "tags",
            TokenizerConfig::default(),
            r#"<p class="x" id='y' z=1>hi</p><br/>"#,
        ),
        (
            "entities",
            decoding.clone(),
            "a&amp;b &#65;&#x41; &ampx; &bogus; &amp",
        ),
        (
            "script",
            TokenizerConfig::default(),
            "<script>let x = 1 < 2;</script>tail",
        ),
        (
            "markup-asides",
            TokenizerConfig::default(),
            "<!--c--><![CDATA[d]]><!DOCTYPE html><?pi?>",
        ),
        ("utf8", decoding.clone(), "café<tag attr='é😀'>π&amp;σ</tag>"),
        ("custom-special", with_div, "<div>a<b</div><DIV>x</DIV>"),
        (
            "xml",
            xml_decoding,
            "<script>a</script>&amp;&bogus;<![CDATA[x]]>",
        ),
        (
            "attr-entities",
            decoding,
            r#"<a b="&amp" c=x&amp=1 d='&lt;'>"#,
        ),
    ]
}

#[test]
fn every_single_split_point_matches_the_whole_document() {
    for (label, config, input) in cases() {
        let expected = run_whole(&config, input);
        for split in 1..input.len() {
            let got = run_byte_chunks(&config, input, &[split]);
            assert_eq!(
                got, expected,
                "case={label} split={split} diverged from single-chunk run"
            );
        }
    }
}

#[test]
fn fixed_size_chunk_plans_match_the_whole_document() {
    for (label, config, input) in cases() {
        let expected = run_whole(&config, input);
        for size in [1usize, 2, 3, 4, 7, 16] {
            let boundaries: Vec<usize> = (1..input.len())
                .filter(|idx| idx % size == 0)
                .collect();
            let got = run_byte_chunks(&config, input, &boundaries);
            assert_eq!(
                got, expected,
                "case={label} size={size} diverged from single-chunk run"
            );
        }
    }
}

#[test]
fn seeded_fuzz_chunk_plans_match_the_whole_document() {
    let seeds = seed_count();
    for (case_idx, (label, config, input)) in cases().into_iter().enumerate() {
        let expected = run_whole(&config, input);
        let base_seed = 0x6d61726b75703a5f ^ (case_idx as u64);
        for iter in 0..seeds {
            let seed = base_seed ^ (iter as u64).wrapping_mul(SEED_MIX);
            let mut rng = Lcg::new(seed);
            let boundaries = random_boundaries(&mut rng, input.len());
            let got = run_byte_chunks(&config, input, &boundaries);
            assert_eq!(
                got, expected,
                "case={label} seed=0x{seed:016x} boundaries={boundaries:?}"
            );
        }
    }
}

#[test]
fn str_chunking_at_char_boundaries_matches_the_whole_document() {
    for (label, config, input) in cases() {
        let expected = run_whole(&config, input);
        let boundaries: Vec<usize> = input
            .char_indices()
            .map(|(idx, _)| idx)
            .filter(|&idx| idx != 0)
            .collect();
        let mut tokenizer = Tokenizer::new(config, Collector::default());
        let mut last = 0;
        for &idx in &boundaries {
            tokenizer.write(&input[last..idx]);
            last = idx;
        }
        tokenizer.write(&input[last..]);
        tokenizer.end();
        let got = normalize(&tokenizer.into_sink().events);
        assert_eq!(got, expected, "case={label} per-char str chunks diverged");
    }
}

fn run_whole(config: &TokenizerConfig, input: &str) -> Vec<Event> {
    let mut tokenizer = Tokenizer::new(config.clone(), Collector::default());
    tokenizer.write(input);
    tokenizer.end();
    normalize(&tokenizer.into_sink().events)
}

fn run_byte_chunks(config: &TokenizerConfig, input: &str, boundaries: &[usize]) -> Vec<Event> {
    let bytes = input.as_bytes();
    let mut tokenizer = Tokenizer::new(config.clone(), Collector::default());
    let mut last = 0;
    for &idx in boundaries {
        assert!(idx > last && idx <= bytes.len(), "invalid boundary {idx}");
        tokenizer.write_bytes(&bytes[last..idx]);
        last = idx;
    }
    tokenizer.write_bytes(&bytes[last..]);
    tokenizer.end();
    normalize(&tokenizer.into_sink().events)
}

fn seed_count() -> usize {
    if let Ok(value) = std::env::var("MARKUP_PARITY_SEEDS")
        && let Ok(parsed) = value.parse::<usize>()
        && parsed > 0
    {
        return parsed;
    }
    DEFAULT_SEEDS
}

fn random_boundaries(rng: &mut Lcg, len: usize) -> Vec<usize> {
    if len <= 1 {
        return Vec::new();
    }
    let count = rng.gen_range(len.min(24));
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        out.push(1 + rng.gen_range(len - 1));
    }
    out.sort_unstable();
    out.dedup();
    out
}

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        let state = if seed == 0 { SEED_MIX } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.state
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() >> 32) as usize % upper
    }
}
