//! End-to-end parsing scenarios for the TTML adapter.
//!
//! Each test feeds a complete document through [`TtmlAdapter::parse`] and
//! checks the cues, regions and recorded errors a renderer would see.

use cue_core::{
    group_by_region,
    model::EntityKind,
    ttml::{AdapterOptions, CaptionAdapter, TtmlAdapter},
    CoreError, CueNode, ParseResult,
};
use pretty_assertions::assert_eq;

fn parse(document: &str) -> ParseResult {
    TtmlAdapter::new()
        .parse(document)
        .expect("document should parse")
}

fn timeline(cues: &[CueNode]) -> Vec<(&str, f64, f64)> {
    cues.iter()
        .map(|cue| (cue.content(), cue.start_time(), cue.end_time()))
        .collect()
}

#[test]
fn inline_region_under_bound_div_prunes_paragraph() {
    let result = parse(
        r#"<tt>
          <head><layout><region xml:id="r1" tts:origin="0% 80%"/></layout></head>
          <body><div region="r1">
            <p><region tts:backgroundColor="red"/><span>X</span></p>
            <p>Y</p>
          </div></body>
        </tt>"#,
    );
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.data[0].content(), "Y");
    assert_eq!(result.data[0].region().map(|r| r.id()), Some("r1"));
    assert!(result.errors.is_empty());
}

#[test]
fn descendants_naming_another_region_are_pruned() {
    let result = parse(
        r#"<tt>
          <head><layout><region xml:id="r1"/><region xml:id="r2"/></layout></head>
          <body region="r1">
            <div region="r2"><p>gone</p></div>
            <div><p region="r1">kept <span region="r2">not this</span></p></div>
          </body>
        </tt>"#,
    );
    let contents: Vec<_> = result.data.iter().map(CueNode::content).collect();
    assert_eq!(contents, ["kept"]);
}

#[test]
fn out_of_line_regions_are_shared() {
    let result = parse(
        r#"<tt>
          <head><layout><region xml:id="bottom"/></layout></head>
          <body><div region="bottom"><p>one</p><p>two</p></div></body>
        </tt>"#,
    );
    let first = result.data[0].region().expect("region");
    let second = result.data[1].region().expect("region");
    assert!(std::sync::Arc::ptr_eq(first, second));
}

#[test]
fn unknown_region_is_reported_and_dropped() {
    let result = parse(r#"<tt><body><div><p region="nowhere">text</p></div></body></tt>"#);
    assert_eq!(result.data.len(), 1);
    assert!(result.data[0].region().is_none());
    assert!(matches!(
        result.errors[0].error,
        CoreError::UnknownReference { ref kind, ref id } if kind == "region" && id == "nowhere"
    ));
}

#[test]
fn inline_region_on_div_times_untimed_paragraphs() {
    let result = parse(
        r#"<tt><body><div>
            <region xml:id="box" begin="1s" end="5s" tts:extent="50% 10%"/>
            <p>boxed</p>
            <p begin="6s" end="7s">own timing</p>
        </div></body></tt>"#,
    );
    assert_eq!(
        timeline(&result.data),
        [("boxed", 1000.0, 5000.0), ("own timing", 6000.0, 7000.0)]
    );
    let region = result.data[0].region().expect("inline region");
    assert_eq!(region.id(), "box");
    assert!(region.is_inline());
}

#[test]
fn style_chains_and_renamed_duplicates() {
    let result = parse(
        r#"<tt><head><styling>
            <style xml:id="base" tts:color="white" tts:fontSize="80%"/>
            <style xml:id="base" tts:color="red"/>
            <style xml:id="child" style="base" tts:fontSize="50%"/>
          </styling></head>
          <body><div><p style="child base--1">styled</p></div></body>
        </tt>"#,
    );
    assert!(result.errors.is_empty());
    let styles = result.data[0].styles();
    let ids: Vec<_> = styles.iter().map(|style| style.id()).collect();
    assert_eq!(ids, ["child", "base--1"]);
    assert_eq!(styles[0].get("tts:color"), Some("white"));
    assert_eq!(styles[0].get("tts:fontSize"), Some("50%"));
    assert_eq!(styles[1].get("tts:color"), Some("red"));
}

#[test]
fn forward_style_reference_is_recoverable() {
    let result = parse(
        r#"<tt><head><styling>
            <style xml:id="a" style="b"/>
            <style xml:id="b" tts:color="lime"/>
          </styling></head>
          <body><div><p style="a">x</p></div></body>
        </tt>"#,
    );
    assert_eq!(result.data.len(), 1);
    assert_eq!(result.errors.len(), 1);
    assert!(!result.has_critical());
}

#[test]
fn timed_spans_split_into_suffixed_cues() {
    let document = r#"<tt><body><div>
        <p xml:id="line" begin="0s" end="6s">Before <span begin="2s" end="3s">one</span> middle <span begin="4s">two</span></p>
    </div></body></tt>"#;

    let result = parse(document);
    let ids: Vec<_> = result.data.iter().map(CueNode::id).collect();
    assert_eq!(ids, ["line", "line-1", "line-2"]);
    assert_eq!(
        timeline(&result.data),
        [
            ("Before middle", 0.0, 6000.0),
            ("one", 2000.0, 3000.0),
            ("two", 4000.0, f64::INFINITY),
        ]
    );

    let merged = TtmlAdapter::with_options(AdapterOptions::default().with_split_timed_spans(false))
        .parse(document)
        .expect("document should parse");
    assert_eq!(merged.data.len(), 1);
    assert_eq!(merged.data[0].content(), "Before one middle two");
}

#[test]
fn seq_container_children_start_with_the_container() {
    let result = parse(
        r#"<tt><body><div timeContainer="seq" begin="10s">
            <p dur="2s">first</p>
            <p begin="1s" dur="1s">second</p>
        </div></body></tt>"#,
    );
    assert_eq!(
        timeline(&result.data),
        [("first", 10_000.0, 12_000.0), ("second", 11_000.0, 12_000.0)]
    );
}

#[test]
fn clock_time_base() {
    let result = parse(
        r#"<tt ttp:timeBase="clock"><body><div>
            <p begin="00:00:01.500" end="00:00:02">ok</p>
            <p begin="00:00:01:10">frames are refused</p>
        </div></body></tt>"#,
    );
    assert_eq!(timeline(&result.data), [("ok", 1500.0, 2000.0)]);
    assert!(matches!(
        result.errors[0].error,
        CoreError::UnsupportedTimeExpression { .. }
    ));
}

#[test]
fn smpte_time_base_with_frames() {
    let result = parse(
        r#"<tt ttp:timeBase="smpte" ttp:frameRate="30"><body><div>
            <p begin="01:00:00:00" end="01:00:01:15">hour</p>
        </div></body></tt>"#,
    );
    let cue = &result.data[0];
    assert!((cue.start_time() - 3_600_000.0).abs() < 1e-6);
    assert!((cue.end_time() - 3_601_500.0).abs() < 1e-6);
}

#[test]
fn smpte_drop_frame_document() {
    let result = parse(
        r#"<tt ttp:timeBase="smpte" ttp:frameRate="30" ttp:frameRateMultiplier="1000 1001" ttp:dropMode="dropNTSC">
          <body><div><p begin="00:59:56;12">late</p></div></body>
        </tt>"#,
    );
    assert_eq!((result.data[0].start_time() / 1000.0).trunc(), 3596.0);
}

#[test]
fn entities_are_sorted_and_typed() {
    let result = parse(
        r#"<tt><body><div>
            <p><span ttm:agent="host">Welcome</span><br/><span tts:fontStyle="italic">back <span tts:fontWeight="bold">now</span></span></p>
        </div></body></tt>"#,
    );
    let cue = &result.data[0];
    assert_eq!(cue.content(), "Welcome\nback now");
    let entities: Vec<_> = cue
        .entities()
        .iter()
        .map(|entity| (entity.kind.clone(), cue.entity_text(entity).unwrap_or_default()))
        .collect();
    assert_eq!(
        entities,
        [
            (EntityKind::Voice("host".into()), "Welcome"),
            (EntityKind::LineBreak, "\n"),
            (EntityKind::Span, "back now"),
            (EntityKind::Span, "now"),
        ]
    );
}

#[test]
fn grouping_by_region() {
    let two_regions = parse(
        r#"<tt><head><layout><region xml:id="a"/><region xml:id="b"/></layout></head>
          <body><div><p region="a">1</p><p region="b">2</p></div></body></tt>"#,
    );
    let ids: Vec<_> = group_by_region(&two_regions.data)
        .into_iter()
        .map(|group| group.id)
        .collect();
    assert_eq!(ids, ["a", "b"]);

    let with_default = parse(
        r#"<tt><head><layout><region xml:id="a"/></layout></head>
          <body><div><p region="a">1</p><p>2</p></div></body></tt>"#,
    );
    let groups = group_by_region(&with_default.data);
    let ids: Vec<_> = groups.iter().map(|group| group.id.as_str()).collect();
    assert_eq!(ids, ["a", "default"]);
}

#[test]
fn malformed_documents() {
    let adapter = TtmlAdapter::new();
    assert!(matches!(
        adapter.parse("<root/>"),
        Err(CoreError::MalformedRoot { .. })
    ));

    let empty = adapter.parse("").expect("empty input is not an error");
    assert!(empty.data.is_empty());
    assert!(empty.has_critical());

    let truncated = adapter
        .parse("<tt><body><div><p>unterminated <!-- comment")
        .expect("truncated input still parses");
    assert_eq!(truncated.data[0].content(), "unterminated");
    assert!(truncated
        .errors
        .iter()
        .any(|error| matches!(error.error, CoreError::Tokenization(_))));
}

#[test]
fn grammar_violations_skip_subtrees() {
    let result = parse(
        r#"<tt><body><div>
            <p>ok</p>
            <span>not allowed here</span>
            <p>still ok<div>nor here</div></p>
        </div></body></tt>"#,
    );
    let contents: Vec<_> = result.data.iter().map(CueNode::content).collect();
    assert_eq!(contents, ["ok", "still ok"]);
    assert_eq!(result.errors.len(), 2);
    assert!(result
        .errors
        .iter()
        .all(|error| matches!(error.error, CoreError::InvalidNesting { .. })));
}

#[test]
fn tick_offsets_default_to_thirty_ticks_per_second() {
    let result = parse(r#"<tt><body><div><p begin="30t" end="60t">x</p></div></body></tt>"#);
    assert_eq!(timeline(&result.data), [("x", 1000.0, 2000.0)]);
}

#[test]
fn paragraph_outside_a_division_aborts_the_parse() {
    let err = TtmlAdapter::new()
        .parse(r#"<tt><body><p begin="0s" end="1s">loose</p></body></tt>"#)
        .unwrap_err();
    assert!(matches!(err, CoreError::Adapter { ref adapter, .. } if adapter == "ttml"));
    assert!(matches!(
        err.root_cause(),
        CoreError::MinimumElementViolation { element } if element == "div"
    ));
}

#[test]
fn whitespace_between_adjacent_spans_is_dropped() {
    let result = parse(
        r#"<tt><body><div><p begin="0s" end="1s"><span>Hello</span> <span>world</span></p></div></body></tt>"#,
    );
    assert_eq!(timeline(&result.data), [("Helloworld", 0.0, 1000.0)]);
}
