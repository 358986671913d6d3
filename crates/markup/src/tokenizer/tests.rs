use crate::test_utils::{Collector, Event, normalize, tokenize_chunks, tokenize_normalized};
use crate::{Tokenizer, TokenizerConfig, TokenizerError};

fn html() -> TokenizerConfig {
    TokenizerConfig::default()
}

fn decoding() -> TokenizerConfig {
    TokenizerConfig {
        decode_entities: true,
        ..TokenizerConfig::default()
    }
}

fn xml() -> TokenizerConfig {
    TokenizerConfig {
        xml_mode: true,
        ..TokenizerConfig::default()
    }
}

fn xml_decoding() -> TokenizerConfig {
    TokenizerConfig {
        xml_mode: true,
        decode_entities: true,
        ..TokenizerConfig::default()
    }
}

fn with_special(names: &[&str]) -> TokenizerConfig {
    TokenizerConfig {
        special_tags: names.iter().map(|s| s.to_string()).collect(),
        ..TokenizerConfig::default()
    }
}

fn text(s: &str) -> Event {
    Event::Text(s.to_owned())
}

fn open(s: &str) -> Event {
    Event::OpenTagName(s.to_owned())
}

fn close(s: &str) -> Event {
    Event::CloseTag(s.to_owned())
}

fn aname(s: &str) -> Event {
    Event::AttribName(s.to_owned())
}

fn adata(s: &str) -> Event {
    Event::AttribData(s.to_owned())
}

// --- tags and attributes ---

#[test]
fn open_tag_with_attribute_text_and_close() {
    let events = tokenize_chunks(html(), &[r#"<p class="x">hi</p>"#]);
    assert_eq!(
        events,
        vec![
            open("p"),
            aname("class"),
            adata("x"),
            Event::AttribEnd,
            Event::OpenTagEnd,
            text("hi"),
            close("p"),
            Event::End,
        ]
    );
}

#[test]
fn attribute_value_quoting_styles() {
    let events = tokenize_chunks(html(), &[r#"<x a b=1 c='y' d="z"/>"#]);
    assert_eq!(
        events,
        vec![
            open("x"),
            aname("a"),
            Event::AttribEnd,
            aname("b"),
            adata("1"),
            Event::AttribEnd,
            aname("c"),
            adata("y"),
            Event::AttribEnd,
            aname("d"),
            adata("z"),
            Event::AttribEnd,
            Event::SelfClosingTag,
            Event::End,
        ]
    );
}

#[test]
fn bare_attributes_end_without_data() {
    let events = tokenize_chunks(html(), &["<x a b>"]);
    assert_eq!(
        events,
        vec![
            open("x"),
            aname("a"),
            Event::AttribEnd,
            aname("b"),
            Event::AttribEnd,
            Event::OpenTagEnd,
            Event::End,
        ]
    );
}

#[test]
fn self_closing_tag_tolerates_whitespace() {
    let events = tokenize_chunks(html(), &["<br / >"]);
    assert_eq!(
        events,
        vec![open("br"), Event::SelfClosingTag, Event::End]
    );
}

#[test]
fn closing_tag_junk_is_skipped_until_gt() {
    let events = tokenize_chunks(html(), &["a</p  junk>b"]);
    assert_eq!(events, vec![text("a"), close("p"), text("b"), Event::End]);
}

#[test]
fn stray_lt_stays_literal_text() {
    let events = tokenize_normalized(html(), &["a < b <5> c"]);
    // `< ` falls back to text; `<5` opens tag-name scanning. The tokenizer
    // is maximally permissive either way.
    assert_eq!(
        events,
        vec![
            text("a < b "),
            open("5"),
            Event::OpenTagEnd,
            text(" c"),
            Event::End,
        ]
    );
}

// --- comments, CDATA, declarations, processing instructions ---

#[test]
fn comment_bodies_drop_the_closing_dashes() {
    assert_eq!(
        tokenize_chunks(html(), &["<!--x-->"]),
        vec![Event::Comment("x".into()), Event::End]
    );
    assert_eq!(
        tokenize_chunks(html(), &["<!--x--->"]),
        vec![Event::Comment("x-".into()), Event::End]
    );
    assert_eq!(
        tokenize_chunks(html(), &["<!---->"]),
        vec![Event::Comment("".into()), Event::End]
    );
    assert_eq!(
        tokenize_chunks(html(), &["<!----->"]),
        vec![Event::Comment("-".into()), Event::End]
    );
}

#[test]
fn comment_with_inner_dashes_keeps_them() {
    assert_eq!(
        tokenize_chunks(html(), &["<!--a-b--c-->"]),
        vec![Event::Comment("a-b--c".into()), Event::End]
    );
}

#[test]
fn cdata_bodies_drop_the_closing_brackets() {
    assert_eq!(
        tokenize_chunks(html(), &["<![CDATA[x]]>"]),
        vec![Event::Cdata("x".into()), Event::End]
    );
    assert_eq!(
        tokenize_chunks(html(), &["<![CDATA[]]]>"]),
        vec![Event::Cdata("]".into()), Event::End]
    );
}

#[test]
fn lowercase_cdata_prefix_degrades_to_declaration() {
    assert_eq!(
        tokenize_chunks(html(), &["<![cdata[x]]>"]),
        vec![Event::Declaration("[cdata[x]]".into()), Event::End]
    );
}

#[test]
fn declaration_and_processing_instruction_payloads() {
    assert_eq!(
        tokenize_chunks(html(), &["<!DOCTYPE html>"]),
        vec![Event::Declaration("DOCTYPE html".into()), Event::End]
    );
    assert_eq!(
        tokenize_chunks(html(), &["<?php echo ?>"]),
        vec![
            Event::ProcessingInstruction("php echo ?".into()),
            Event::End,
        ]
    );
}

// --- special tags ---

#[test]
fn script_contents_are_opaque_text() {
    let events = tokenize_normalized(html(), &["<script>let x = 1 < 2;</script>"]);
    assert_eq!(
        events,
        vec![
            open("script"),
            Event::OpenTagEnd,
            text("let x = 1 < 2;"),
            close("script"),
            Event::End,
        ]
    );
}

#[test]
fn false_closing_tag_inside_script_is_text() {
    let events = tokenize_normalized(html(), &["<script></scriptx></script>"]);
    assert_eq!(
        events,
        vec![
            open("script"),
            Event::OpenTagEnd,
            text("</scriptx>"),
            close("script"),
            Event::End,
        ]
    );
}

#[test]
fn special_matching_is_case_insensitive_and_keeps_raw_names() {
    let events = tokenize_normalized(html(), &["<SCRIPT>a</SCRIPT >"]);
    assert_eq!(
        events,
        vec![
            open("SCRIPT"),
            Event::OpenTagEnd,
            text("a"),
            close("SCRIPT"),
            Event::End,
        ]
    );
}

#[test]
fn configured_special_tag_split_across_chunks() {
    let events = tokenize_chunks(with_special(&["div"]), &["<di", "v>x</div>"]);
    assert_eq!(
        events,
        vec![
            open("div"),
            Event::OpenTagEnd,
            text("x"),
            close("div"),
            Event::End,
        ]
    );
}

#[test]
fn special_prefix_that_diverges_is_an_ordinary_tag() {
    let events = tokenize_normalized(html(), &["<scripty>a<b></scripty>"]);
    assert_eq!(
        events,
        vec![
            open("scripty"),
            Event::OpenTagEnd,
            text("a"),
            open("b"),
            Event::OpenTagEnd,
            close("scripty"),
            Event::End,
        ]
    );
}

#[test]
fn entities_are_not_decoded_inside_special_contents() {
    let config = TokenizerConfig {
        decode_entities: true,
        special_tags: vec!["textarea".into()],
        ..TokenizerConfig::default()
    };
    let events = tokenize_normalized(config, &["<textarea>a&amp;b</textarea>"]);
    assert_eq!(
        events,
        vec![
            open("textarea"),
            Event::OpenTagEnd,
            text("a&amp;b"),
            close("textarea"),
            Event::End,
        ]
    );
}

#[test]
fn closing_attempt_abandoned_midway_returns_to_text() {
    let events = tokenize_normalized(html(), &["<style>a</st b</style>"]);
    assert_eq!(
        events,
        vec![
            open("style"),
            Event::OpenTagEnd,
            text("a</st b"),
            close("style"),
            Event::End,
        ]
    );
}

#[test]
#[should_panic(expected = "at least two characters")]
fn single_character_special_names_are_rejected() {
    let _ = Tokenizer::new(with_special(&["x"]), Collector::default());
}

// --- character references ---

#[test]
fn decoded_named_entity_splits_the_text_run() {
    let events = tokenize_chunks(decoding(), &["a&amp;b"]);
    assert_eq!(
        events,
        vec![text("a"), text("&"), text("b"), Event::End]
    );
}

#[test]
fn numeric_and_hex_references_decode() {
    assert_eq!(
        tokenize_normalized(decoding(), &["&#65;&#x41;&#X41;"]),
        vec![text("AAA"), Event::End]
    );
}

#[test]
fn numeric_reference_without_semicolon_decodes_in_html() {
    assert_eq!(
        tokenize_normalized(decoding(), &["&#65 x"]),
        vec![text("A x"), Event::End]
    );
    assert_eq!(
        tokenize_normalized(decoding(), &["&#x2F"]),
        vec![text("/"), Event::End]
    );
}

#[test]
fn numeric_reference_without_digits_stays_literal() {
    assert_eq!(
        tokenize_normalized(decoding(), &["&#;&#x;"]),
        vec![text("&#;&#x;"), Event::End]
    );
}

#[test]
fn out_of_range_code_points_become_replacement() {
    assert_eq!(
        tokenize_normalized(decoding(), &["&#x110000;&#xD800;"]),
        vec![text("\u{FFFD}\u{FFFD}"), Event::End]
    );
}

#[test]
fn c1_code_points_remap_through_windows_1252() {
    assert_eq!(
        tokenize_normalized(decoding(), &["&#128;&#x93;"]),
        vec![text("\u{20AC}\u{201C}"), Event::End]
    );
}

#[test]
fn legacy_reference_without_semicolon() {
    assert_eq!(
        tokenize_normalized(decoding(), &["&amp x"]),
        vec![text("& x"), Event::End]
    );
    // End-of-input salvage takes the same path.
    assert_eq!(
        tokenize_normalized(decoding(), &["&amp"]),
        vec![text("&"), Event::End]
    );
}

#[test]
fn legacy_prefix_decodes_and_keeps_the_tail() {
    // `amp` is the longest legacy prefix of `ampx`.
    assert_eq!(
        tokenize_normalized(decoding(), &["&ampx;"]),
        vec![text("&x;"), Event::End]
    );
}

#[test]
fn unknown_references_pass_through() {
    assert_eq!(
        tokenize_normalized(decoding(), &["&bogus;&"]),
        vec![text("&bogus;&"), Event::End]
    );
}

#[test]
fn consecutive_references_each_decode() {
    assert_eq!(
        tokenize_normalized(decoding(), &["&lt;&gt;"]),
        vec![text("<>"), Event::End]
    );
}

#[test]
fn references_split_across_chunks_decode_identically() {
    assert_eq!(
        tokenize_chunks(decoding(), &["a&am", "p;b"]),
        vec![text("a"), text("&"), text("b"), Event::End]
    );
}

#[test]
fn xml_mode_requires_semicolons_and_knows_only_the_predefined_five() {
    assert_eq!(
        tokenize_normalized(xml_decoding(), &["&amp"]),
        vec![text("&amp"), Event::End]
    );
    assert_eq!(
        tokenize_normalized(xml_decoding(), &["&amp;&eacute;"]),
        vec![text("&&eacute;"), Event::End]
    );
    // Numeric references still decode when terminated.
    assert_eq!(
        tokenize_normalized(xml_decoding(), &["&#65;&#65 "]),
        vec![text("A&#65 "), Event::End]
    );
}

#[test]
fn attribute_values_decode_references() {
    let events = tokenize_normalized(
        decoding(),
        &[r#"<a x="1&lt;2" y='3&gt;4' z=5&amp;6>"#],
    );
    assert_eq!(
        events,
        vec![
            open("a"),
            aname("x"),
            adata("1<2"),
            Event::AttribEnd,
            aname("y"),
            adata("3>4"),
            Event::AttribEnd,
            aname("z"),
            adata("5&6"),
            Event::AttribEnd,
            Event::OpenTagEnd,
            Event::End,
        ]
    );
}

#[test]
fn attribute_reference_decodes_strictly_at_the_closing_quote() {
    let events = tokenize_normalized(decoding(), &[r#"<a b="&amp">"#]);
    assert_eq!(
        events,
        vec![
            open("a"),
            aname("b"),
            adata("&"),
            Event::AttribEnd,
            Event::OpenTagEnd,
            Event::End,
        ]
    );
}

#[test]
fn semicolon_less_attribute_reference_keeps_the_terminator() {
    // The strict lookup consumes the name only; the data byte that ended it
    // stays in the value.
    let events = tokenize_normalized(decoding(), &[r#"<a b="x&amp.">"#]);
    assert_eq!(
        events,
        vec![
            open("a"),
            aname("b"),
            adata("x&."),
            Event::AttribEnd,
            Event::OpenTagEnd,
            Event::End,
        ]
    );
    let events = tokenize_normalized(decoding(), &["<a b=x&amp.y>"]);
    assert_eq!(
        events,
        vec![
            open("a"),
            aname("b"),
            adata("x&.y"),
            Event::AttribEnd,
            Event::OpenTagEnd,
            Event::End,
        ]
    );
}

#[test]
fn attribute_reference_before_equals_stays_literal() {
    // Query strings like `?x&amp=1` must survive undecoded.
    let events = tokenize_normalized(decoding(), &["<a href=foo?x&amp=1>"]);
    assert_eq!(
        events,
        vec![
            open("a"),
            aname("href"),
            adata("foo?x&amp=1"),
            Event::AttribEnd,
            Event::OpenTagEnd,
            Event::End,
        ]
    );
}

// --- finalisation ---

#[test]
fn unterminated_constructs_are_salvaged() {
    assert_eq!(
        tokenize_chunks(html(), &["<!--x"]),
        vec![Event::Comment("x".into()), Event::End]
    );
    assert_eq!(
        tokenize_chunks(html(), &["<![CDATA[y"]),
        vec![Event::Cdata("y".into()), Event::End]
    );
    assert_eq!(
        tokenize_normalized(html(), &["text<"]),
        vec![text("text<"), Event::End]
    );
    assert_eq!(
        tokenize_chunks(html(), &["<!decl"]),
        vec![text("decl"), Event::End]
    );
}

#[test]
fn unterminated_tag_structure_is_dropped() {
    assert_eq!(
        tokenize_chunks(html(), &["<div cl"]),
        vec![open("div"), Event::End]
    );
    assert_eq!(
        tokenize_chunks(html(), &[r#"<div class="x"#]),
        vec![open("div"), aname("class"), Event::End]
    );
    assert_eq!(tokenize_chunks(html(), &["</div"]), vec![Event::End]);
}

#[test]
fn empty_input_still_ends() {
    assert_eq!(tokenize_chunks(html(), &[]), vec![Event::End]);
    assert_eq!(tokenize_chunks(html(), &[""]), vec![Event::End]);
}

// --- driver API ---

#[test]
fn write_after_end_reports_and_drops_the_chunk() {
    let mut tokenizer = Tokenizer::new(html(), Collector::default());
    tokenizer.write("a");
    tokenizer.end();
    tokenizer.write("b");
    tokenizer.end();
    assert_eq!(
        tokenizer.into_sink().events,
        vec![
            text("a"),
            Event::End,
            Event::Error(TokenizerError::WriteAfterEnd),
            Event::Error(TokenizerError::EndAfterEnd),
        ]
    );
}

#[test]
fn pause_buffers_input_until_resume() {
    let mut tokenizer = Tokenizer::new(html(), Collector::default());
    tokenizer.pause();
    tokenizer.write("<p>hi");
    assert!(tokenizer.sink().events.is_empty());
    tokenizer.resume();
    assert_eq!(
        tokenizer.sink().events,
        vec![open("p"), Event::OpenTagEnd, text("hi")]
    );
    tokenizer.write("</p>");
    tokenizer.end();
    assert_eq!(
        tokenizer.into_sink().events,
        vec![
            open("p"),
            Event::OpenTagEnd,
            text("hi"),
            close("p"),
            Event::End,
        ]
    );
}

#[test]
fn end_while_paused_defers_finalisation_to_resume() {
    let mut tokenizer = Tokenizer::new(html(), Collector::default());
    tokenizer.write("a<!--b");
    tokenizer.pause();
    tokenizer.end();
    assert_eq!(tokenizer.sink().events, vec![text("a")]);
    tokenizer.resume();
    assert_eq!(
        tokenizer.into_sink().events,
        vec![text("a"), Event::Comment("b".into()), Event::End]
    );
}

#[test]
fn end_with_writes_the_final_chunk_first() {
    let mut tokenizer = Tokenizer::new(html(), Collector::default());
    tokenizer.write("<p>");
    tokenizer.end_with("x");
    assert_eq!(
        tokenizer.into_sink().events,
        vec![open("p"), Event::OpenTagEnd, text("x"), Event::End]
    );
}

#[test]
fn reset_replays_like_a_fresh_instance() {
    let doc = r#"<p class="x">hi &amp; bye</p>"#;
    let mut tokenizer = Tokenizer::new(decoding(), Collector::default());
    tokenizer.write(doc);
    tokenizer.end();
    let first = tokenizer.sink().events.clone();

    tokenizer.reset();
    assert_eq!(tokenizer.absolute_index(), 0);
    tokenizer.write(doc);
    tokenizer.end();
    let events = tokenizer.into_sink().events;
    assert_eq!(&events[..first.len()], &first[..]);
    assert_eq!(&events[first.len()..], &first[..]);
}

#[test]
fn absolute_index_tracks_the_logical_stream() {
    let mut tokenizer = Tokenizer::new(html(), Collector::default());
    let mut written = 0;
    let mut last = 0;
    for chunk in ["<div ", "class=x>", "hello", "<!--tail"] {
        tokenizer.write(chunk);
        written += chunk.len();
        let absolute = tokenizer.absolute_index();
        assert_eq!(absolute, written, "everything written is consumed");
        assert!(absolute >= last, "absolute index must not decrease");
        last = absolute;
    }
    let stats = tokenizer.stats();
    assert_eq!(stats.chunks_written, 4);
    assert!(stats.bytes_compacted > 0);
    assert!(stats.peak_buffered > 0);
}

#[test]
fn write_bytes_reassembles_split_scalars() {
    let mut tokenizer = Tokenizer::new(html(), Collector::default());
    tokenizer.write_bytes(&[0xC3]);
    tokenizer.write_bytes(&[0xA9, b'x']);
    tokenizer.end();
    assert_eq!(
        normalize(&tokenizer.into_sink().events),
        vec![text("éx"), Event::End]
    );
}

#[test]
fn end_flushes_an_incomplete_byte_suffix_lossily() {
    let mut tokenizer = Tokenizer::new(html(), Collector::default());
    tokenizer.write_bytes(&[b'a', 0xE2, 0x82]);
    tokenizer.end();
    assert_eq!(
        normalize(&tokenizer.into_sink().events),
        vec![text("a\u{FFFD}"), Event::End]
    );
}

#[test]
fn xml_mode_has_no_special_tags() {
    let events = tokenize_normalized(xml(), &["<script>a<b>c</b>d</script>"]);
    assert_eq!(
        events,
        vec![
            open("script"),
            Event::OpenTagEnd,
            text("a"),
            open("b"),
            Event::OpenTagEnd,
            text("c"),
            close("b"),
            text("d"),
            close("script"),
            Event::End,
        ]
    );
}
