use std::fs;

use pretty_assertions::assert_eq;
use research_core::{ResearchResult, ResultsView};
use research_engine::{build_document, export_document, DocLine, ExportOptions};
use serde_json::json;
use tempfile::TempDir;

fn acme_fields() -> Vec<(String, String)> {
    let result = ResearchResult::from_payload(
        "Acme",
        &json!({"info": {"industry": "Tech", "founded_year": 1990}}),
    );
    match result.view() {
        ResultsView::Success { fields, .. } => fields
            .into_iter()
            .map(|field| (field.heading, field.body))
            .collect(),
        ResultsView::Failure { message } => panic!("unexpected failure: {message}"),
    }
}

#[test]
fn document_lists_humanized_fields_under_the_company_title() {
    let doc = build_document("Acme", &acme_fields(), &ExportOptions::default());

    assert_eq!(doc.pages.len(), 1);
    assert_eq!(doc.pages[0].header.as_deref(), Some("Acme"));
    assert_eq!(
        doc.pages[0].lines,
        vec![
            DocLine::Heading("Industry".into()),
            DocLine::Text("Tech".into()),
            DocLine::Blank,
            DocLine::Heading("Founded Year".into()),
            DocLine::Text("1990".into()),
            DocLine::Blank,
        ]
    );
}

#[test]
fn rendered_pages_are_numbered_and_separated() {
    let options = ExportOptions {
        lines_per_page: 4,
        wrap_width: 40,
    };
    let doc = build_document("Acme", &acme_fields(), &options);
    let text = doc.render();

    assert_eq!(doc.pages.len(), 2);
    assert!(text.starts_with("Acme\n====\n\nIndustry\n  Tech\n"));
    assert!(text.contains("-- Page 1 of 2 --"));
    assert!(text.contains("\u{c}Founded Year\n  1990\n"));
    assert!(text.ends_with("-- Page 2 of 2 --\n"));
}

#[test]
fn long_values_are_wrapped_to_the_page_width() {
    let body = "word ".repeat(30);
    let doc = build_document(
        "Acme",
        &[("Description".to_string(), body.trim_end().to_string())],
        &ExportOptions {
            lines_per_page: 48,
            wrap_width: 20,
        },
    );
    let texts: Vec<&str> = doc.pages[0]
        .lines
        .iter()
        .filter_map(|line| match line {
            DocLine::Text(text) => Some(text.as_str()),
            _ => None,
        })
        .collect();
    assert!(texts.len() > 1);
    assert!(texts.iter().all(|text| text.chars().count() <= 20));
}

#[test]
fn export_writes_the_document_named_after_the_company() {
    let temp = TempDir::new().unwrap();
    let summary = export_document(
        temp.path(),
        "Acme Corp",
        &acme_fields(),
        &ExportOptions::default(),
    )
    .unwrap();

    assert_eq!(summary.page_count, 1);
    assert_eq!(summary.field_count, 2);
    assert_eq!(
        summary.output_path.file_name().unwrap(),
        "acme_corp_research.txt"
    );
    let written = fs::read_to_string(&summary.output_path).unwrap();
    assert!(written.starts_with("Acme Corp\n"));
    assert!(written.contains("Founded Year\n  1990"));
}
