//! Adapter for `IndexMap<String, Identifier>` — names are the map's own keys, one id per name.
//!
//! Grounded on `dio/_dict.py`. The original's dict adapter is fully recursive (a dict value may
//! itself be any translatable shape, dispatched back through `resolve_io`); this crate covers the
//! one shape the spec calls out as core — an ordered map from name to a single id — matching
//! every concrete use (`{name: id}` style input).

use std::any::Any;

use indexmap::IndexMap;

use super::{DataStructureIO, DioError};
use crate::offline::{TranslationMap, Translations};
use crate::types::Identifier;

pub struct MapIO;

impl DataStructureIO for MapIO {
    fn handles_type(&self, arg: &dyn Any) -> bool {
        arg.is::<IndexMap<String, Identifier>>()
    }

    /// A map's own keys are its names — no explicit name list is required to use it.
    fn names(&self, arg: &dyn Any) -> Option<Vec<String>> {
        arg.downcast_ref::<IndexMap<String, Identifier>>().map(|m| m.keys().cloned().collect())
    }

    fn extract(&self, arg: &dyn Any, names: &[String]) -> Result<IndexMap<String, Vec<Identifier>>, DioError> {
        let map = arg.downcast_ref::<IndexMap<String, Identifier>>().expect("handles_type checked this");
        let mut out = IndexMap::with_capacity(names.len());
        for name in names {
            let id = map
                .get(name)
                .ok_or_else(|| DioError::Untranslatable(format!("name '{name}' not present in map")))?;
            out.insert(name.clone(), vec![id.clone()]);
        }
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
            return Err(DioError::NotInplaceTranslatable("IndexMap<String, Identifier>".to_string()));
        }
        let map = arg.downcast_ref::<IndexMap<String, Identifier>>().expect("handles_type checked this");

        let mut out: IndexMap<String, String> = IndexMap::with_capacity(map.len());
        for (key, id) in map {
            if !names.contains(key) {
                continue;
            }
            let translations = tmap.apply(key, None, None)?;
            let translated = match translations {
                Translations::Forward(magic) => {
                    magic.get(id).ok_or_else(|| DioError::NoTranslation(id.display()))?
                }
                Translations::Reverse(_) => {
                    return Err(DioError::NotInplaceTranslatable("reverse-mode map".to_string()))
                }
            };
            out.insert(key.clone(), translated);
        }
        Ok(Box::new(out))
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
        let people = PlaceholderTranslations::new(
            "people",
            vec![ID.to_string(), "name".to_string()],
            vec![vec![Value::Int(1), Value::Str("sofia".to_string())]],
        );
        let animals = PlaceholderTranslations::new(
            "animals",
            vec![ID.to_string(), "name".to_string()],
            vec![vec![Value::Int(7), Value::Str("rex".to_string())]],
        );
        TranslationMap::new(
            [("people".to_string(), people), ("animals".to_string(), animals)],
            HashMap::new(),
            Some(Format::parse("{id}:{name}").unwrap()),
            None,
            DefaultPlaceholders::default(),
            true,
        )
    }

    #[test]
    fn names_are_derived_from_map_keys() {
        let mut map = IndexMap::new();
        map.insert("people".to_string(), Identifier::Int(1));
        assert_eq!(MapIO.names(&map), Some(vec!["people".to_string()]));
    }

    #[test]
    fn insert_translates_each_named_entry_against_its_own_source() {
        let mut map = IndexMap::new();
        map.insert("people".to_string(), Identifier::Int(1));
        map.insert("animals".to_string(), Identifier::Int(7));
        let names = vec!["people".to_string(), "animals".to_string()];
        let out = MapIO.insert(&map, &names, &tmap(), true).unwrap();
        let translated = out.downcast::<IndexMap<String, String>>().unwrap();
        assert_eq!(translated.get("people").unwrap(), "1:sofia");
        assert_eq!(translated.get("animals").unwrap(), "7:rex");
    }
}
