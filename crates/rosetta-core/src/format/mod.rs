//! Translation format templates: `{name[.attr][!conv][:spec]}` placeholders inside `[...]`
//! optional blocks.
//!
//! Grounded on `offline/_format.py` and `offline/parse_format_string.py`. An [`Element`] is one
//! bracket-delimited span of the source template (the whole string minus any optional blocks
//! counts as a single, always-required element); [`Format::compile`] resolves which elements
//! survive for a given placeholder set and flattens them into a [`CompiledFormat`] ready to
//! render per record.

mod applier;
mod parser;
mod spec;

pub use applier::FormatApplier;
pub use parser::Piece;

use thiserror::Error;

use crate::types::{Value, ID};

#[derive(Debug, Error)]
pub enum FormatError {
    #[error("unbalanced optional-block delimiter in format string '{format_string}' (open={open_idx}, close={idx})")]
    BadDelimiter {
        format_string: String,
        open_idx: i64,
        idx: i64,
    },

    #[error("could not parse block '{block}': {reason}")]
    Field { block: String, reason: String },

    #[error("format '{format_string}' requires placeholder '{name}', which is not available")]
    MissingRequired { format_string: String, name: String },

    #[error("unknown format spec '{spec}': {reason}")]
    BadSpec { spec: String, reason: String },

    #[error("duplicate key '{0}' after UUID canonicalization; disable enable_uuid_heuristics or fix the source data")]
    DuplicateKey(String),

    #[error("no format given and none configured at construction")]
    NoFormat,

    #[error("unknown source or name '{0}'")]
    UnknownSource(String),
}

/// One bracket-delimited span of a [`Format`]'s source template.
#[derive(Debug, Clone)]
pub struct Element {
    pieces: Vec<Piece>,
    placeholders: Vec<String>,
    required: bool,
}

impl Element {
    fn new(raw: &str, required: bool) -> Result<Self, FormatError> {
        let unescaped = parser::unescape_brackets(raw);
        let (pieces, placeholders) = parser::scan_placeholders(&unescaped)?;
        Ok(Self {
            pieces,
            placeholders,
            required,
        })
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn required(&self) -> bool {
        self.required
    }
}

/// A parsed translation format template.
#[derive(Debug, Clone)]
pub struct Format {
    source: String,
    elements: Vec<Element>,
}

impl Format {
    /// Parses a format string into its elements.
    ///
    /// Optional blocks (`[...]`) that contain no placeholder at all are promoted to required
    /// literal text, matching the original: a block with nothing to omit isn't really optional.
    pub fn parse(fmt: &str) -> Result<Self, FormatError> {
        let blocks = parser::split_optional_blocks(fmt)?;
        let elements = blocks
            .into_iter()
            .map(|(text, in_optional)| {
                let mut element = Element::new(&text, !in_optional)?;
                if in_optional && element.placeholders.is_empty() {
                    element.required = true;
                }
                Ok(element)
            })
            .collect::<Result<Vec<_>, FormatError>>()?;
        Ok(Self {
            source: fmt.to_string(),
            elements,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// All placeholder names referenced anywhere in the format, in order of first appearance,
    /// without duplicates.
    pub fn placeholders(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for element in &self.elements {
            for name in &element.placeholders {
                if !seen.contains(name) {
                    seen.push(name.clone());
                }
            }
        }
        seen
    }

    /// Placeholders that appear in a required (non-optional) element.
    pub fn required_placeholders(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for element in self.elements.iter().filter(|e| e.required) {
            for name in &element.placeholders {
                if !seen.contains(name) {
                    seen.push(name.clone());
                }
            }
        }
        seen
    }

    /// Resolves which elements survive for the given `available` placeholder set and flattens
    /// them into a single renderable template.
    ///
    /// An optional element survives only if every placeholder it references is available; a
    /// required element whose placeholder is missing is an error, since the caller cannot satisfy
    /// the template at all.
    pub fn compile(&self, available: &[String]) -> Result<CompiledFormat, FormatError> {
        let mut pieces = Vec::new();
        for element in &self.elements {
            let satisfied = element.placeholders.iter().all(|p| available.contains(p));
            if element.required && !satisfied {
                let missing = element
                    .placeholders
                    .iter()
                    .find(|p| !available.contains(*p))
                    .cloned()
                    .unwrap_or_default();
                return Err(FormatError::MissingRequired {
                    format_string: self.source.clone(),
                    name: missing,
                });
            }
            if satisfied {
                pieces.extend(element.pieces.iter().cloned());
            }
        }
        Ok(CompiledFormat { pieces })
    }
}

/// A [`Format`] with its optional elements already resolved for one fixed placeholder set,
/// ready to render many records without re-parsing.
#[derive(Debug, Clone)]
pub struct CompiledFormat {
    pieces: Vec<Piece>,
}

impl CompiledFormat {
    /// Renders the template against a lookup function from placeholder name to value.
    pub fn render(&self, lookup: impl Fn(&str) -> Option<Value>) -> Result<String, FormatError> {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(text) => out.push_str(text),
                Piece::Placeholder { name, conversion, spec: raw_spec, .. } => {
                    let value = lookup(name).unwrap_or(Value::Null);
                    let parsed_spec = raw_spec
                        .as_deref()
                        .map(spec::FormatSpec::parse)
                        .transpose()
                        .map_err(|reason| FormatError::BadSpec {
                            spec: raw_spec.clone().unwrap_or_default(),
                            reason,
                        })?;
                    out.push_str(&spec::render_value(&value, *conversion, parsed_spec.as_ref()));
                }
            }
        }
        Ok(out)
    }
}

/// One source's worth of raw translation data: a name for the source, the placeholder (column)
/// names, and one record per id, positionally aligned with `placeholders`.
///
/// Grounded on `offline/types.py::PlaceholderTranslations` (its dataframe-backed factory methods
/// are out of scope; records are plain rows here).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PlaceholderTranslations {
    pub source: String,
    pub placeholders: Vec<String>,
    pub records: Vec<Vec<Value>>,
}

impl PlaceholderTranslations {
    pub fn new(source: impl Into<String>, placeholders: Vec<String>, records: Vec<Vec<Value>>) -> Self {
        Self {
            source: source.into(),
            placeholders,
            records,
        }
    }

    /// Index of the `id` placeholder column, if present.
    pub fn id_pos(&self) -> Option<usize> {
        self.placeholders.iter().position(|p| p == ID)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn promotes_placeholder_less_optional_block_to_required() {
        let fmt = Format::parse("{id}[, constant]").unwrap();
        assert!(fmt.elements[1].required);
    }

    #[test]
    fn required_placeholders_exclude_optional_ones() {
        let fmt = Format::parse("{id}[, name={name}]").unwrap();
        assert_eq!(fmt.required_placeholders(), vec!["id".to_string()]);
        assert_eq!(fmt.placeholders(), vec!["id".to_string(), "name".to_string()]);
    }

    #[test]
    fn compile_drops_optional_element_when_placeholder_missing() {
        let fmt = Format::parse("{id}[, name={name}]").unwrap();
        let compiled = fmt.compile(&["id".to_string()]).unwrap();
        let rendered = compiled.render(|p| if p == "id" { Some(Value::Int(7)) } else { None }).unwrap();
        assert_eq!(rendered, "7");
    }

    #[test]
    fn compile_keeps_optional_element_when_placeholder_present() {
        let fmt = Format::parse("{id}[, name={name}]").unwrap();
        let compiled = fmt.compile(&["id".to_string(), "name".to_string()]).unwrap();
        let rendered = compiled
            .render(|p| match p {
                "id" => Some(Value::Int(7)),
                "name" => Some(Value::Str("sofia".to_string())),
                _ => None,
            })
            .unwrap();
        assert_eq!(rendered, "7, name=sofia");
    }

    #[test]
    fn compile_fails_when_required_placeholder_missing() {
        let fmt = Format::parse("{id}:{name}").unwrap();
        assert!(fmt.compile(&["id".to_string()]).is_err());
    }
}
