//! Renders a compiled [`Format`] against a source's [`PlaceholderTranslations`], producing one
//! rendered string per id plus (optionally) a default-value template for ids with no match.
//!
//! Grounded on `offline/_format_applier.py`.

use std::collections::HashMap;

use super::{CompiledFormat, Format, FormatError, PlaceholderTranslations};
use crate::types::{Identifier, Value, ID};

/// Stateless renderer binding one [`Format`] to the placeholder set a particular source offers.
pub struct FormatApplier<'a> {
    format: &'a Format,
}

impl<'a> FormatApplier<'a> {
    pub fn new(format: &'a Format) -> Self {
        Self { format }
    }

    /// Renders every record in `translations` to a string, keyed by the record's id.
    ///
    /// `wanted` restricts which of the source's placeholders are considered available (e.g. the
    /// caller may have asked for a subset); when `None`, every placeholder the source offers is
    /// used. Fails if the format requires a placeholder the source doesn't have at all.
    pub fn apply(
        &self,
        translations: &PlaceholderTranslations,
        wanted: Option<&[String]>,
    ) -> Result<HashMap<Identifier, String>, FormatError> {
        let id_pos = translations.id_pos().ok_or_else(|| FormatError::MissingRequired {
            format_string: self.format.source().to_string(),
            name: ID.to_string(),
        })?;

        let available: Vec<String> = match wanted {
            Some(w) => translations
                .placeholders
                .iter()
                .filter(|p| w.contains(p))
                .cloned()
                .collect(),
            None => translations.placeholders.clone(),
        };
        let compiled = self.format.compile(&available)?;

        let mut out = HashMap::with_capacity(translations.records.len());
        for record in &translations.records {
            let id = identifier_from(&record[id_pos]);
            let rendered = render_record(&compiled, &translations.placeholders, record)?;
            out.insert(id, rendered);
        }
        Ok(out)
    }

    /// Compiles a default-value template using only the `id` placeholder plus whatever static
    /// defaults are supplied, for ids a source never returned a row for.
    pub fn compile_default(&self, defaults: &HashMap<String, Value>) -> Result<CompiledFormat, FormatError> {
        let mut available: Vec<String> = vec![ID.to_string()];
        available.extend(defaults.keys().cloned());
        self.format.compile(&available)
    }
}

fn render_record(compiled: &CompiledFormat, placeholders: &[String], record: &[Value]) -> Result<String, FormatError> {
    compiled.render(|name| placeholders.iter().position(|p| p == name).map(|i| record[i].clone()))
}

fn identifier_from(value: &Value) -> Identifier {
    match value {
        Value::Int(i) => Identifier::Int(*i),
        Value::Str(s) => Identifier::Str(s.clone()),
        other => Identifier::Str(other.display()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translations() -> PlaceholderTranslations {
        PlaceholderTranslations::new(
            "people",
            vec![ID.to_string(), "name".to_string()],
            vec![
                vec![Value::Int(1), Value::Str("sofia".to_string())],
                vec![Value::Int(2), Value::Str("malte".to_string())],
            ],
        )
    }

    #[test]
    fn renders_one_string_per_record() {
        let format = Format::parse("{id}:{name}").unwrap();
        let applier = FormatApplier::new(&format);
        let out = applier.apply(&translations(), None).unwrap();
        assert_eq!(out.get(&Identifier::Int(1)).unwrap(), "1:sofia");
        assert_eq!(out.get(&Identifier::Int(2)).unwrap(), "2:malte");
    }

    #[test]
    fn fails_without_an_id_column() {
        let format = Format::parse("{id}").unwrap();
        let applier = FormatApplier::new(&format);
        let translations = PlaceholderTranslations::new("people", vec!["name".to_string()], vec![]);
        assert!(applier.apply(&translations, None).is_err());
    }

    #[test]
    fn compiles_default_template_from_id_and_static_defaults() {
        let format = Format::parse("{id}:{name}").unwrap();
        let applier = FormatApplier::new(&format);
        let mut defaults = HashMap::new();
        defaults.insert("name".to_string(), Value::Str("<unknown>".to_string()));
        let compiled = applier.compile_default(&defaults).unwrap();
        let rendered = compiled
            .render(|p| match p {
                "id" => Some(Value::Int(9)),
                "name" => Some(Value::Str("<unknown>".to_string())),
                _ => None,
            })
            .unwrap();
        assert_eq!(rendered, "9:<unknown>");
    }
}
