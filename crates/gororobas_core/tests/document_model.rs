use gororobas_core::model::document::{MarkKind, ShapeViolation, ELLIPSIS};
use gororobas_core::{truncate, Document, Mark, Node, NodeKind};
use serde_json::json;

fn paragraph_doc(runs: &[Node]) -> Document {
    let mut document = Document::new();
    let paragraph = document
        .append(document.root(), Node::new(NodeKind::Paragraph))
        .unwrap();
    for run in runs {
        document.append(paragraph, run.clone()).unwrap();
    }
    document
}

fn parse(value: serde_json::Value) -> Document {
    Document::from_json_str(&value.to_string()).unwrap()
}

#[test]
fn editor_json_round_trips_through_the_arena() {
    let value = json!({
        "type": "doc",
        "content": [
            {
                "type": "heading",
                "attrs": { "level": 2 },
                "content": [{ "type": "text", "text": "Compostagem" }]
            },
            {
                "type": "paragraph",
                "content": [
                    { "type": "text", "text": "Veja " },
                    {
                        "type": "text",
                        "text": "o guia",
                        "marks": [
                            { "type": "link", "attrs": { "href": "https://gororobas.com", "target": "_blank" } },
                            { "type": "bold" }
                        ]
                    }
                ]
            }
        ]
    });

    let document = parse(value.clone());
    assert!(document.validate().is_ok());
    assert_eq!(document.node_count(), 6);

    let encoded: serde_json::Value =
        serde_json::from_str(&document.to_json_string().unwrap()).unwrap();
    assert_eq!(encoded, value);
}

#[test]
fn plain_text_joins_blocks_with_newlines() {
    let document = parse(json!({
        "type": "doc",
        "content": [
            { "type": "paragraph", "content": [{ "type": "text", "text": "Plantar" }] },
            { "type": "paragraph" },
            {
                "type": "bulletList",
                "content": [
                    { "type": "listItem", "content": [
                        { "type": "paragraph", "content": [{ "type": "text", "text": "milho" }] }
                    ]},
                    { "type": "listItem", "content": [
                        { "type": "paragraph", "content": [
                            { "type": "text", "text": "feijão" },
                            { "type": "hardBreak" },
                            { "type": "text", "text": "abóbora" }
                        ]}
                    ]}
                ]
            }
        ]
    }));

    assert_eq!(document.to_plain_text(), "Plantar\nmilho\nfeijão\nabóbora");
}

#[test]
fn plain_text_ignores_marks_and_skips_unknown_nodes() {
    let document = parse(json!({
        "type": "doc",
        "content": [
            { "type": "paragraph", "content": [
                { "type": "text", "text": "agro", "marks": [{ "type": "italic" }] },
                { "type": "text", "text": "floresta" }
            ]},
            { "type": "youtube", "attrs": { "src": "x" } }
        ]
    }));

    assert_eq!(document.to_plain_text(), "agrofloresta");
    let err = document.validate().unwrap_err();
    assert_eq!(err.path(), "doc/1");
    assert_eq!(
        err.violation(),
        &ShapeViolation::UnknownKind("youtube".to_string())
    );
}

#[test]
fn validate_reports_the_offending_path() {
    let heading_without_level = parse(json!({
        "type": "doc",
        "content": [
            { "type": "paragraph" },
            { "type": "heading", "content": [{ "type": "text", "text": "x" }] }
        ]
    }));
    let err = heading_without_level.validate().unwrap_err();
    assert_eq!(err.path(), "doc/1");
    assert_eq!(err.violation(), &ShapeViolation::MissingAttribute("level"));

    let empty_run = parse(json!({
        "type": "doc",
        "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "" }] }]
    }));
    let err = empty_run.validate().unwrap_err();
    assert_eq!(err.path(), "doc/0/0");
    assert_eq!(err.violation(), &ShapeViolation::EmptyText);

    let list_with_paragraph = parse(json!({
        "type": "doc",
        "content": [{ "type": "orderedList", "content": [{ "type": "paragraph" }] }]
    }));
    let err = list_with_paragraph.validate().unwrap_err();
    assert!(matches!(
        err.violation(),
        ShapeViolation::IllegalChild { parent, child }
            if parent == "orderedList" && child == "paragraph"
    ));
}

#[test]
fn validate_rejects_wrong_root_and_bad_marks() {
    let root = parse(json!({ "type": "paragraph" }));
    assert!(matches!(
        root.validate().unwrap_err().violation(),
        ShapeViolation::RootNotDoc(kind) if kind == "paragraph"
    ));

    let link_without_href =
        paragraph_doc(&[Node::text_run("sem destino").with_mark(Mark::new(MarkKind::Link))]);
    assert_eq!(
        link_without_href.validate().unwrap_err().violation(),
        &ShapeViolation::LinkWithoutHref
    );

    let marked_paragraph = parse(json!({
        "type": "doc",
        "content": [{ "type": "paragraph", "marks": [{ "type": "bold" }] }]
    }));
    assert_eq!(
        marked_paragraph.validate().unwrap_err().violation(),
        &ShapeViolation::UnexpectedMarks
    );
}

#[test]
fn equality_is_structural_and_mark_order_sensitive() {
    let bold_italic = paragraph_doc(&[Node::text_run("horta")
        .with_mark(Mark::bold())
        .with_mark(Mark::italic())]);
    let italic_bold = paragraph_doc(&[Node::text_run("horta")
        .with_mark(Mark::italic())
        .with_mark(Mark::bold())]);

    assert_eq!(bold_italic.to_plain_text(), italic_bold.to_plain_text());
    assert_ne!(bold_italic, italic_bold);

    let rebuilt = Document::from_json_str(&bold_italic.to_json_string().unwrap()).unwrap();
    assert_eq!(rebuilt, bold_italic);
}

#[test]
fn attribute_order_does_not_affect_equality() {
    let first = parse(json!({
        "type": "doc",
        "content": [{ "type": "heading", "attrs": { "level": 3, "textAlign": "left" } }]
    }));
    let second = parse(json!({
        "type": "doc",
        "content": [{ "type": "heading", "attrs": { "textAlign": "left", "level": 3 } }]
    }));
    assert_eq!(first, second);
}

#[test]
fn truncate_boundaries() {
    assert_eq!(truncate("", 5), "");
    assert_eq!(truncate("abc", 3), "abc");
    assert_eq!(truncate("abcd", 3), format!("abc{ELLIPSIS}"));
    assert_eq!(truncate("abc", 0), ELLIPSIS);
    assert_eq!(truncate("abcdef", 6), "abcdef");
    assert_eq!(truncate("abcdefg", 6), format!("abcdef{ELLIPSIS}"));
    // Family emoji is one grapheme made of several code points.
    let family = "👨‍👩‍👧";
    assert_eq!(truncate(&format!("{family}{family}"), 1), format!("{family}{ELLIPSIS}"));
}

#[test]
fn preview_uses_plain_text_projection() {
    let document = Document::from_plain_text("Como fazer\nbokashi em casa");
    assert_eq!(document.preview(14), format!("Como fazer\nbok{ELLIPSIS}"));
    assert_eq!(document.preview(100), "Como fazer\nbokashi em casa");
}

#[test]
fn blank_detection_matches_the_editor_empty_state() {
    assert!(Document::empty().is_blank());
    assert!(Document::new().is_blank());
    assert!(Document::from_plain_text("").is_blank());
    assert!(!Document::from_plain_text("oi").is_blank());
    assert_eq!(Document::default(), Document::empty());
}

#[test]
fn plain_text_is_total_over_empty_and_textless_trees() {
    assert_eq!(Document::new().to_plain_text(), "");
    assert_eq!(Document::empty().to_plain_text(), "");

    let rule_only = parse(json!({
        "type": "doc",
        "content": [{ "type": "horizontalRule" }, { "type": "paragraph", "content": [{ "type": "hardBreak" }] }]
    }));
    assert_eq!(rule_only.to_plain_text(), "\n");
}
