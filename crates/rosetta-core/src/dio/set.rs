//! Adapter for `HashSet<Identifier>`.
//!
//! Grounded on `dio/_set.py`. Unlike the sequence/single-value adapters, missing translations are
//! silent (`None`) rather than an error — the original calls `magic_dict.get(e)`, not
//! `__getitem__`, for set elements.

use std::any::Any;
use std::collections::HashSet;

use indexmap::IndexMap;

use super::{DataStructureIO, DioError};
use crate::offline::{TranslationMap, Translations};
use crate::types::Identifier;

pub struct SetIO;

impl DataStructureIO for SetIO {
    fn handles_type(&self, arg: &dyn Any) -> bool {
        arg.is::<HashSet<Identifier>>()
    }

    fn extract(&self, arg: &dyn Any, names: &[String]) -> Result<IndexMap<String, Vec<Identifier>>, DioError> {
        let set = arg.downcast_ref::<HashSet<Identifier>>().expect("handles_type checked this");
        if names.len() != 1 {
            return Err(DioError::BadNames { given: names.len(), data_len: set.len() });
        }
        let mut out = IndexMap::with_capacity(1);
        out.insert(names[0].clone(), set.iter().cloned().collect());
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
            return Err(DioError::NotInplaceTranslatable("HashSet<Identifier>".to_string()));
        }
        let set = arg.downcast_ref::<HashSet<Identifier>>().expect("handles_type checked this");
        let translations = tmap.apply(&names[0], None, None)?;
        let translated: HashSet<Option<String>> = match translations {
            Translations::Forward(magic) => set.iter().map(|id| magic.get(id)).collect(),
            Translations::Reverse(_) => {
                return Err(DioError::NotInplaceTranslatable("reverse-mode set".to_string()))
            }
        };
        Ok(Box::new(translated))
    }
}
