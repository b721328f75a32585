//! Extraction reports for display consumers
//!
//! A report pairs a result with a success flag. Records with missing expected
//! fields are flagged as incomplete, never treated as failures.

use std::fmt::Write;

use serde::Serialize;

use crate::record::{ExtractionResult, Record};
use crate::schema::ExtractionSchema;

/// Outcome of one fetch-and-extract run.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub success: bool,
    /// URL or path the document came from
    pub source: String,
    /// Schema label
    pub schema: String,
    pub record_count: usize,
    pub records: ExtractionResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionReport {
    pub fn succeeded(
        source: impl Into<String>,
        schema: &ExtractionSchema,
        records: ExtractionResult,
    ) -> Self {
        Self {
            success: true,
            source: source.into(),
            schema: schema.name().to_string(),
            record_count: records.len(),
            records,
            error: None,
        }
    }

    pub fn failed(
        source: impl Into<String>,
        schema: &ExtractionSchema,
        error: impl ToString,
    ) -> Self {
        Self {
            success: false,
            source: source.into(),
            schema: schema.name().to_string(),
            record_count: 0,
            records: ExtractionResult::default(),
            error: Some(error.to_string()),
        }
    }

    /// Per-record completeness for every record missing at least one
    /// expected field.
    pub fn incomplete(&self, expected: &[String]) -> Vec<RecordCompleteness> {
        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| RecordCompleteness::check(index, record, expected))
            .filter(|c| !c.is_complete())
            .collect()
    }
}

/// Which expected fields of one record resolved to nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordCompleteness {
    pub index: usize,
    pub missing: Vec<String>,
}

impl RecordCompleteness {
    pub fn check(index: usize, record: &Record, expected: &[String]) -> Self {
        let missing = record
            .missing_fields(expected)
            .into_iter()
            .map(String::from)
            .collect();
        Self { index, missing }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Fields to check for completeness: the configured list, or every schema
/// field when the list is empty.
pub fn expected_fields(schema: &ExtractionSchema, required: &[String]) -> Vec<String> {
    if required.is_empty() {
        schema.field_names().map(String::from).collect()
    } else {
        required.to_vec()
    }
}

/// Plain-text rendering: one labeled panel per record.
pub fn render_panels(report: &ExtractionReport, expected: &[String]) -> String {
    let mut out = String::new();

    if !report.success {
        let error = report.error.as_deref().unwrap_or("unknown error");
        let _ = writeln!(out, "Extraction from {} failed: {error}", report.source);
        return out;
    }

    let _ = writeln!(
        out,
        "{}: {} record(s) from {}",
        report.schema, report.record_count, report.source
    );
    if report.records.is_empty() {
        let _ = writeln!(out, "No records extracted.");
        return out;
    }

    let width = report
        .records
        .iter()
        .flat_map(|r| r.iter().map(|(name, _)| name.chars().count()))
        .max()
        .unwrap_or(0);

    for (index, record) in report.records.iter().enumerate() {
        let _ = writeln!(out, "{}", "-".repeat(40));
        let _ = writeln!(out, "#{}", index + 1);
        for (name, value) in record.iter() {
            let value = value.unwrap_or("(missing)");
            let _ = writeln!(out, "  {name:<width$}  {value}");
        }

        let completeness = RecordCompleteness::check(index, record, expected);
        if !completeness.is_complete() {
            let _ = writeln!(out, "  missing: {}", completeness.missing.join(", "));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::extract;
    use crate::schema::FieldDefinition;
    use pretty_assertions::assert_eq;

    fn schema() -> ExtractionSchema {
        ExtractionSchema::new(
            "Produkty",
            "article",
            vec![
                FieldDefinition::text("name", "h2"),
                FieldDefinition::attribute("img", "img", "src"),
            ],
        )
        .unwrap()
    }

    fn report() -> ExtractionReport {
        let html = r#"
            <article><h2>Gel</h2><img src="/gel.png"></article>
            <article><h2></h2></article>
        "#;
        ExtractionReport::succeeded("page.html", &schema(), extract(html, &schema()))
    }

    #[test]
    fn test_incomplete_records() {
        let expected = expected_fields(&schema(), &[]);
        assert_eq!(
            report().incomplete(&expected),
            vec![RecordCompleteness {
                index: 1,
                missing: vec!["name".to_string(), "img".to_string()],
            }]
        );

        let only_img = vec!["img".to_string()];
        assert_eq!(report().incomplete(&only_img)[0].missing, vec!["img"]);
    }

    #[test]
    fn test_render_panels() {
        let expected = expected_fields(&schema(), &[]);
        let text = render_panels(&report(), &expected);

        assert_eq!(
            text,
            "Produkty: 2 record(s) from page.html\n\
             ----------------------------------------\n\
             #1\n  name  Gel\n  img   /gel.png\n\
             ----------------------------------------\n\
             #2\n  name  \n  img   (missing)\n  missing: name, img\n"
        );
    }

    #[test]
    fn test_render_panels_aligns_non_ascii_names() {
        let schema = ExtractionSchema::new(
            "Produkty",
            "article",
            vec![
                FieldDefinition::text("cena", "span"),
                FieldDefinition::text("źródło", "cite"),
            ],
        )
        .unwrap();
        let html = "<article><span>12,99</span><cite>sportfuel</cite></article>";
        let report = ExtractionReport::succeeded("page.html", &schema, extract(html, &schema));

        let text = render_panels(&report, &expected_fields(&schema, &[]));
        assert!(text.contains("\n  cena    12,99\n  źródło  sportfuel\n"), "{text}");
    }

    #[test]
    fn test_failed_report() {
        let report = ExtractionReport::failed("https://sportfuel.pl", &schema(), "HTTP 503");
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["success"], false);
        assert_eq!(json["records"], serde_json::json!([]));
        assert_eq!(json["error"], "HTTP 503");
        assert!(render_panels(&report, &[]).contains("failed: HTTP 503"));
    }

    #[test]
    fn test_successful_report_omits_error() {
        let json = serde_json::to_value(report()).unwrap();
        assert!(json.get("error").is_none());
        assert_eq!(json["record_count"], 2);
        assert_eq!(json["records"][1]["img"], serde_json::Value::Null);
    }
}
