//! Adapter for `Vec<Identifier>` (Python's list/tuple/numpy-array adapter, collapsed to one
//! owned-`Vec` shape since Rust has no single array type spanning all three).
//!
//! Grounded on `dio/_sequence.py`. The original also supports a "wide row" mode where `names` has
//! one entry per element and each element is itself independently translatable (zipped,
//! recursively dispatched through `resolve_io`); that mode is out of scope here — every element
//! of the sequence is translated against the single name `names[0]`, which is what every use in
//! this crate needs ("translate this list of ids").

use std::any::Any;

use indexmap::IndexMap;

use super::{DataStructureIO, DioError};
use crate::offline::{TranslationMap, Translations};
use crate::types::Identifier;

pub struct SequenceIO;

impl DataStructureIO for SequenceIO {
    fn handles_type(&self, arg: &dyn Any) -> bool {
        arg.is::<Vec<Identifier>>()
    }

    fn extract(&self, arg: &dyn Any, names: &[String]) -> Result<IndexMap<String, Vec<Identifier>>, DioError> {
        let seq = arg.downcast_ref::<Vec<Identifier>>().expect("handles_type checked this");
        verify_names(seq.len(), names)?;
        let mut out = IndexMap::with_capacity(1);
        out.insert(names[0].clone(), seq.clone());
        Ok(out)
    }

    fn insert(
        &self,
        arg: &dyn Any,
        names: &[String],
        tmap: &TranslationMap,
        copy: bool,
    ) -> Result<Box<dyn Any>, DioError> {
        if !copy {
            return Err(DioError::NotInplaceTranslatable("Vec<Identifier>".to_string()));
        }
        let seq = arg.downcast_ref::<Vec<Identifier>>().expect("handles_type checked this");
        verify_names(seq.len(), names)?;
        let translations = tmap.apply(&names[0], None, None)?;
        let magic = match translations {
            Translations::Forward(magic) => magic,
            Translations::Reverse(_) => {
                return Err(DioError::NotInplaceTranslatable("reverse-mode sequence".to_string()))
            }
        };
        let translated = seq
            .iter()
            .map(|id| magic.get(id).ok_or_else(|| DioError::NoTranslation(id.display())))
            .collect::<Result<Vec<String>, DioError>>()?;
        Ok(Box::new(translated))
    }
}

fn verify_names(data_len: usize, names: &[String]) -> Result<(), DioError> {
    if names.len() == 1 || names.len() == data_len {
        Ok(())
    } else {
        Err(DioError::BadNames { given: names.len(), data_len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{Format, PlaceholderTranslations};
    use crate::offline::DefaultPlaceholders;
    use crate::types::{Value, ID};
    use std::collections::HashMap;

    fn tmap() -> TranslationMap {
        let translations = PlaceholderTranslations::new(
            "people",
            vec![ID.to_string(), "name".to_string()],
            vec![
                vec![Value::Int(1), Value::Str("sofia".to_string())],
                vec![Value::Int(2), Value::Str("richard".to_string())],
            ],
        );
        TranslationMap::new(
            [("people".to_string(), translations)],
            HashMap::new(),
            Some(Format::parse("{id}:{name}").unwrap()),
            None,
            DefaultPlaceholders::default(),
            true,
        )
    }

    #[test]
    fn extracts_sequence_under_single_name() {
        let seq = vec![Identifier::Int(1), Identifier::Int(2)];
        let names = vec!["people".to_string()];
        let out = SequenceIO.extract(&seq, &names).unwrap();
        assert_eq!(out.get("people").unwrap(), &seq);
    }

    #[test]
    fn insert_preserves_order() {
        let seq = vec![Identifier::Int(2), Identifier::Int(1)];
        let names = vec!["people".to_string()];
        let out = SequenceIO.insert(&seq, &names, &tmap(), true).unwrap();
        let translated = out.downcast::<Vec<String>>().unwrap();
        assert_eq!(*translated, vec!["2:richard".to_string(), "1:sofia".to_string()]);
    }

    #[test]
    fn insert_fails_on_untranslated_element() {
        let seq = vec![Identifier::Int(404)];
        let names = vec!["people".to_string()];
        assert!(SequenceIO.insert(&seq, &names, &tmap(), true).is_err());
    }
}
