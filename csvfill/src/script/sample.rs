//! Built-in sample script: rows of `samplexml.csv` as XML elements.
//!
//! Expects the columns `name`, `locale` and `created_at`.

use super::ConversionScript;
use crate::error::ScriptResult;
use crate::functions::{Argument, FunctionRegistry};
use crate::models::ConversionModel;

const STATEMENT: &str = r#"<thing>
    <name>~name~</name>
    <country>~locale~</country>
    <language>~language~</language>
    <territory>~upper:locale~</territory>
    <created>~iso8601:created_at~</created>
    <updated_at>~datetime~</updated_at>
    <locale>~enLocale~</locale>
</thing>"#;

#[derive(Debug, Clone, Copy, Default)]
pub struct SampleXml;

impl ConversionScript for SampleXml {
    fn name(&self) -> &str {
        "sampleXml"
    }

    fn description(&self) -> &str {
        "Sample conversion of samplexml.csv to XML"
    }

    fn model(&self) -> ConversionModel {
        ConversionModel::builder()
            .files("samplexml.csv", "samplexml.xml")
            .prefix("<things>")
            .statement(STATEMENT)
            .suffix("</things>")
            .build()
    }

    fn register(&self, registry: &mut FunctionRegistry) -> ScriptResult<()> {
        registry.register("enLocale", |arg: Argument<'_>| {
            let locale = arg.row().and_then(|row| row.get("locale")).unwrap_or_default();
            Ok(format!("en_{}", locale))
        })?;
        registry.register("language", |arg: Argument<'_>| {
            let locale = arg.row().and_then(|row| row.get("locale")).or(arg.value()).unwrap_or_default();
            Ok(locale.chars().take(2).collect())
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Row;
    use crate::transform::PlaceholderResolver;

    #[test]
    fn test_sample_functions() {
        let mut registry = FunctionRegistry::new();
        SampleXml.register(&mut registry).unwrap();

        let row = Row::from_pairs([("name", "Ann"), ("locale", "SE"), ("created_at", "2024-01-02 03:04:05")]);
        let resolver = PlaceholderResolver::new(SampleXml.marker().unwrap(), &registry);

        let resolved = resolver.resolve("~enLocale~ ~language~ ~upper:locale~", &row).unwrap();
        assert_eq!(resolved.text, "en_SE SE SE");
    }

    #[test]
    fn test_sample_statement_resolves() {
        let mut registry = FunctionRegistry::new();
        SampleXml.register(&mut registry).unwrap();

        let row = Row::from_pairs([("name", "Bo"), ("locale", "de"), ("created_at", "2024-01-02 03:04:05")]);
        let resolver = PlaceholderResolver::new(SampleXml.marker().unwrap(), &registry);

        let resolved = resolver.resolve(STATEMENT, &row).unwrap();
        assert!(resolved.text.contains("<territory>DE</territory>"));
        assert!(resolved.text.contains("<created>2024-01-02T03:04:05.000Z</created>"));
        assert!(resolved.text.contains("<locale>en_de</locale>"));
        assert!(resolved.absent_columns.is_empty());
    }
}
