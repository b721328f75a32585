//! Schema-driven record extraction
//!
//! One record per base-selector match, one value per schema field. A field
//! whose selector matches nothing inside its base element is `None`; nothing
//! that happens while extracting is an error.

use scraper::{ElementRef, Html};
use tracing::{debug, trace};

use super::css_extractor::{element_attr, element_inner_html, element_text, first_match};
use crate::config::ExtractorConfig;
use crate::error::ParseError;
use crate::record::{ExtractionResult, Record};
use crate::schema::{ExtractionSchema, Field, FieldAccessor};

/// Extracts records from HTML with a fixed configuration.
///
/// Holds no per-document state, so one extractor can serve any number of
/// documents and threads.
#[derive(Debug, Clone, Default)]
pub struct SchemaExtractor {
    config: ExtractorConfig,
}

impl SchemaExtractor {
    pub fn new(config: ExtractorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Extract all records from an HTML document.
    ///
    /// Malformed markup is repaired by the HTML5 parser; an empty document
    /// yields an empty result.
    pub fn extract(&self, html: &str, schema: &ExtractionSchema) -> ExtractionResult {
        // The parser adds implied html/head/body elements even to empty input
        if html.trim().is_empty() {
            debug!(schema = schema.name(), "empty document");
            return ExtractionResult::default();
        }

        let document = Html::parse_document(html);

        let records: Vec<Record> = document
            .select(schema.base())
            .map(|base| self.extract_record(base, schema))
            .collect();

        debug!(
            schema = schema.name(),
            base_selector = schema.base_selector(),
            records = records.len(),
            "extracted records"
        );

        ExtractionResult::new(records)
    }

    /// Decode `bytes` as UTF-8 and extract. Fails only when the bytes are not
    /// text.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        schema: &ExtractionSchema,
    ) -> Result<ExtractionResult, ParseError> {
        let html = decode_document(bytes)?;
        Ok(self.extract(html, schema))
    }

    fn extract_record(&self, base: ElementRef<'_>, schema: &ExtractionSchema) -> Record {
        let mut record = Record::with_capacity(schema.fields().len());

        for field in schema.fields() {
            let value = self.extract_field(base, field);
            if value.is_none() {
                trace!(field = field.name(), "field matched nothing");
            }
            record.push(field.name(), value);
        }

        record
    }

    fn extract_field(&self, base: ElementRef<'_>, field: &Field) -> Option<String> {
        let element = first_match(base, field.selector())?;

        match field.accessor() {
            FieldAccessor::Text => Some(element_text(element, &self.config.invisible_tags)),
            FieldAccessor::Attribute(name) => element_attr(element, name),
            FieldAccessor::Html => Some(element_inner_html(element)),
        }
    }
}

/// Decode raw document bytes as UTF-8, skipping a leading byte-order mark.
pub fn decode_document(bytes: &[u8]) -> Result<&str, ParseError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidEncoding {
        offset: e.valid_up_to(),
    })
}

/// Extract with the default configuration.
pub fn extract(html: &str, schema: &ExtractionSchema) -> ExtractionResult {
    SchemaExtractor::default().extract(html, schema)
}

/// Decode and extract with the default configuration.
pub fn extract_bytes(
    bytes: &[u8],
    schema: &ExtractionSchema,
) -> Result<ExtractionResult, ParseError> {
    SchemaExtractor::default().extract_bytes(bytes, schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldDefinition;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn article_schema() -> ExtractionSchema {
        ExtractionSchema::new(
            "Dane o produkcie",
            "article",
            vec![
                FieldDefinition::text("name", "h2"),
                FieldDefinition::attribute("price", "span[itemprop='price']", "content"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_three_articles_one_without_price() {
        let html = r#"
        <html><body>
            <article><h2>Gel</h2><span itemprop="price" content="12.99">12,99 zł</span></article>
            <article><h2>Bar</h2></article>
            <article><h2>Drink</h2><span itemprop="price" content="7.50">7,50 zł</span></article>
        </body></html>
        "#;

        let result = extract(html, &article_schema());

        assert_eq!(result.len(), 3);
        let prices: Vec<_> = result.iter().map(|r| r.get("price")).collect();
        assert_eq!(prices, vec![Some("12.99"), None, Some("7.50")]);
        assert_eq!(result.records()[1].get("name"), Some("Bar"));
        assert!(result.records()[1].has_field("price"));
    }

    #[test]
    fn test_empty_document_yields_empty_result() {
        assert!(extract("", &article_schema()).is_empty());
    }

    #[rstest]
    #[case::body("body")]
    #[case::html("html")]
    #[case::head("head")]
    #[case::universal("*")]
    #[case::selector_list("body, article")]
    fn test_empty_document_has_no_implied_base_matches(#[case] base: &str) {
        let schema =
            ExtractionSchema::new("page", base, vec![FieldDefinition::text("t", "h2")]).unwrap();

        assert!(extract("", &schema).is_empty());
        assert!(extract(" \n\t", &schema).is_empty());
        assert!(extract_bytes(b"\xEF\xBB\xBF", &schema).unwrap().is_empty());
    }

    #[test]
    fn test_no_base_matches() {
        let result = extract("<div><h2>Not an article</h2></div>", &article_schema());
        assert!(result.is_empty());
    }

    #[test]
    fn test_malformed_markup_is_tolerated() {
        let html = "<article><h2>Unclosed <b>bold</article><article><h2>Next";

        let result = extract(html, &article_schema());
        let names: Vec<_> = result.iter().map(|r| r.get("name")).collect();
        assert_eq!(names, vec![Some("Unclosed bold"), Some("Next")]);
    }

    #[test]
    fn test_field_does_not_leak_from_sibling_record() {
        let html = r#"
            <article><h2>First</h2></article>
            <span itemprop="price" content="1.00"></span>
            <article><h2>Second</h2><span itemprop="price" content="2.00"></span></article>
        "#;

        let result = extract(html, &article_schema());
        assert_eq!(result.records()[0].get("price"), None);
        assert_eq!(result.records()[1].get("price"), Some("2.00"));
    }

    #[test]
    fn test_first_match_wins() {
        let schema = ExtractionSchema::new(
            "links",
            "li",
            vec![
                FieldDefinition::attribute("href", "a", "href"),
                FieldDefinition::html("body", "p"),
            ],
        )
        .unwrap();
        let html = r#"<ul><li><p>one <i>1</i></p><a href="/a">a</a><a href="/b">b</a><p>two</p></li></ul>"#;

        let result = extract(html, &schema);
        assert_eq!(result.records()[0].get("href"), Some("/a"));
        assert_eq!(result.records()[0].get("body"), Some("one <i>1</i>"));
    }

    #[test]
    fn test_matched_element_without_attribute_is_none() {
        let schema = ExtractionSchema::new(
            "img",
            "div",
            vec![FieldDefinition::attribute("src", "img", "src")],
        )
        .unwrap();

        let result = extract(r#"<div><img alt="no source"></div>"#, &schema);
        assert_eq!(result.records()[0].get("src"), None);
    }

    #[test]
    fn test_nested_base_matches_each_produce_a_record() {
        let schema =
            ExtractionSchema::new("div", "div", vec![FieldDefinition::text("t", "span")]).unwrap();
        let html = "<div><span>outer</span><div><span>inner</span></div></div>";

        let result = extract(html, &schema);
        let texts: Vec<_> = result.iter().map(|r| r.get("t")).collect();
        assert_eq!(texts, vec![Some("outer"), Some("inner")]);
    }

    #[test]
    fn test_configured_invisible_tags() {
        let schema =
            ExtractionSchema::new("p", "div", vec![FieldDefinition::text("t", "p")]).unwrap();
        let html = "<div><p>Price <small>incl. VAT</small></p></div>";

        let extractor = SchemaExtractor::new(ExtractorConfig {
            invisible_tags: vec!["small".to_string()],
        });
        assert_eq!(extractor.extract(html, &schema).records()[0].get("t"), Some("Price"));
        assert_eq!(
            extract(html, &schema).records()[0].get("t"),
            Some("Price incl. VAT")
        );
    }

    #[test]
    fn test_extract_bytes() {
        let mut html = b"\xEF\xBB\xBF".to_vec();
        html.extend_from_slice("<article><h2>Odżywka</h2></article>".as_bytes());
        let result = extract_bytes(&html, &article_schema()).unwrap();
        assert_eq!(result.records()[0].get("name"), Some("Odżywka"));

        let err = extract_bytes(b"<article>\xFF\xFE</article>", &article_schema()).unwrap_err();
        assert!(matches!(err, ParseError::InvalidEncoding { offset: 9 }));
    }

    #[test]
    fn test_deterministic() {
        let html = "<article><h2> A </h2></article><article><span itemprop='price' content=' 3 '></span></article>";
        let schema = article_schema();

        assert_eq!(extract(html, &schema), extract(html, &schema));
        assert_eq!(extract(html, &schema).records()[1].get("price"), Some(" 3 "));
    }
}
