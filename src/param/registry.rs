//! Parameter registry: id to definition over the flattened tree.
//!
//! Every id anywhere in the tree, nested hyperparameter children included,
//! maps to exactly one definition. A hyperparameter's entry holds a full copy
//! of its subtree, so every write to a nested id is also patched into the
//! copies held by its ancestors.

use std::collections::{HashMap, HashSet};

use super::{Param, ParamId, ParamKind, ParamValue};

/// Mutable id to definition mapping for the selected node.
#[derive(Debug, Default)]
pub struct ParamRegistry {
    params: HashMap<ParamId, Param>,
}

impl ParamRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge definitions into the registry, recursing into hyperparameters.
    ///
    /// Existing entries for the same ids are replaced. Ids the previous
    /// definition nested and the new one no longer does are dropped.
    pub fn flatten<'a>(&mut self, params: impl IntoIterator<Item = &'a Param>) {
        for param in params {
            if let Some(previous) = self.params.get(&param.id) {
                let kept: HashSet<ParamId> = param.descendant_ids().into_iter().collect();
                let dropped: Vec<ParamId> = previous
                    .descendant_ids()
                    .into_iter()
                    .filter(|id| !kept.contains(id))
                    .collect();
                for id in dropped {
                    log::debug!("[Registry] {} no longer defined, dropping", id);
                    self.params.remove(&id);
                }
            }
            self.insert_tree(param);
            self.patch_ancestors(param);
        }
    }

    fn insert_tree(&mut self, param: &Param) {
        for child in param.children() {
            self.insert_tree(child);
        }
        self.params.insert(param.id, param.clone());
    }

    /// Replace the nested copy of `param` in every entry that holds one.
    fn patch_ancestors(&mut self, param: &Param) {
        for entry in self.params.values_mut() {
            if entry.id != param.id {
                entry.replace_descendant(param);
            }
        }
    }

    /// Drop every definition.
    pub fn clear(&mut self) {
        self.params.clear();
    }

    /// Definition for `id`.
    pub fn get(&self, id: ParamId) -> Option<&Param> {
        self.params.get(&id)
    }

    /// Number of known ids.
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if no definitions are stored.
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// Iterate all stored ids.
    pub fn ids(&self) -> impl Iterator<Item = &ParamId> {
        self.params.keys()
    }

    /// Overwrite the stored value of `id` in place.
    ///
    /// Returns `false` if the id is unknown or the value does not fit the
    /// parameter's variant.
    pub fn set_value(&mut self, id: ParamId, val: &ParamValue) -> bool {
        let Some(param) = self.params.get_mut(&id) else {
            return false;
        };
        match (&mut param.kind, val) {
            (ParamKind::Numeric(n), v) => match v.as_f64() {
                Some(x) => n.val = x,
                None => return false,
            },
            (ParamKind::Vector(v), new) => match new.as_f64_vec() {
                Some(new) if new.len() == v.val.len() => v.val = new,
                _ => return false,
            },
            (ParamKind::Enum(e), v) => e.val = v.clone(),
            (ParamKind::Bool(b), ParamValue::Bool(new)) => *b = *new,
            (ParamKind::Text(s), ParamValue::Text(new)) => s.clone_from(new),
            _ => return false,
        }
        let updated = param.clone();
        self.patch_ancestors(&updated);
        true
    }
}
