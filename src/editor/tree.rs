//! Arena of editor instances keyed by parameter id.
//!
//! The tree owns every editor. Composites only refer to their children by id
//! (see [`PanelItem::Editor`](super::PanelItem::Editor)), so an editor can be
//! rebound and repainted without disturbing the instances around it.

// Rust guideline compliant 2026-02

use std::collections::HashMap;
use std::mem::discriminant;

use super::{create_editor, Editor, Interaction, Mount};
use crate::error::TunerError;
use crate::param::{Param, ParamId, ParamValue};

/// All live editors for the selected node.
#[derive(Debug, Default)]
pub struct EditorTree {
    editors: HashMap<ParamId, Box<dyn Editor>>,
    parents: HashMap<ParamId, ParamId>,
    roots: Vec<ParamId>,
    next_instance: u64,
}

impl EditorTree {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop every editor and build fresh ones for `params`, all labelled.
    pub fn load(&mut self, params: &[Param]) {
        self.clear();
        for param in params {
            self.roots.push(param.id);
            self.mount(Mount::labelled(param), None);
        }
        log::debug!(
            "[EditorTree] Loaded {} root(s), {} editor(s)",
            self.roots.len(),
            self.editors.len()
        );
    }

    /// Rebind the editor for `param.id` to the new definition and rebuild it.
    ///
    /// The instance is kept unless the parameter changed kind. An id without
    /// an editor of its own (hidden, or a spliced Optional value) is patched
    /// into the nearest composite holding it, which is then rebuilt. Fails
    /// with [`TunerError::UnknownParameterId`] if no editor holds the id.
    pub fn reconcile(&mut self, param: Param) -> Result<(), TunerError> {
        let id = param.id;
        if let Some(labelled) = self.editors.get(&id).map(|e| e.core().labelled) {
            let parent = self.parents.get(&id).copied();
            self.mount(Mount { param, labelled }, parent);
            self.sync_ancestors(id);
            return Ok(());
        }

        let host = self
            .nearest_host(id)
            .ok_or(TunerError::UnknownParameterId(id))?;
        let Some((mut bound, labelled)) = self
            .editors
            .get(&host)
            .map(|e| (e.param().clone(), e.core().labelled))
        else {
            return Err(TunerError::UnknownParameterId(id));
        };
        bound.replace_descendant(&param);
        log::debug!("[EditorTree] {} has no editor, rebuilding {}", id, host);

        let parent = self.parents.get(&host).copied();
        self.mount(Mount { param: bound, labelled }, parent);
        self.sync_ancestors(host);
        Ok(())
    }

    /// Apply a local interaction to the editor for `id`.
    ///
    /// Returns the value to send to the node, if any.
    pub fn interact(
        &mut self,
        id: ParamId,
        interaction: Interaction,
    ) -> Result<Option<ParamValue>, TunerError> {
        let editor = self
            .editors
            .get_mut(&id)
            .ok_or(TunerError::UnknownParameterId(id))?;
        let sent = editor.interact(interaction)?;
        if sent.is_some() {
            self.sync_ancestors(id);
        }
        Ok(sent)
    }

    /// Apply a pushed value to the editor for `id` without rebuilding it.
    pub fn bind_value(&mut self, id: ParamId, val: &ParamValue) -> Result<(), TunerError> {
        let editor = self
            .editors
            .get_mut(&id)
            .ok_or(TunerError::UnknownParameterId(id))?;
        editor.bind_value(val)?;
        self.sync_ancestors(id);
        Ok(())
    }

    /// Editor bound to `id`.
    pub fn get(&self, id: ParamId) -> Option<&dyn Editor> {
        self.editors.get(&id).map(|editor| &**editor)
    }

    /// Whether an editor exists for `id`.
    pub fn contains(&self, id: ParamId) -> bool {
        self.editors.contains_key(&id)
    }

    /// Composite whose panel shows `id`, `None` for roots.
    pub fn parent(&self, id: ParamId) -> Option<ParamId> {
        self.parents.get(&id).copied()
    }

    /// Top-level editors in load order.
    pub fn roots(&self) -> &[ParamId] {
        &self.roots
    }

    /// Number of live editors.
    pub fn len(&self) -> usize {
        self.editors.len()
    }

    /// True if no editors are live.
    pub fn is_empty(&self) -> bool {
        self.editors.is_empty()
    }

    /// Drop every editor.
    pub fn clear(&mut self) {
        self.editors.clear();
        self.parents.clear();
        self.roots.clear();
    }

    /// Deepest editor whose bound definition nests `id`.
    fn nearest_host(&self, id: ParamId) -> Option<ParamId> {
        self.editors
            .iter()
            .filter(|(_, editor)| editor.param().has_descendant(id))
            .map(|(host, _)| *host)
            .max_by_key(|host| self.depth(*host))
    }

    fn depth(&self, id: ParamId) -> usize {
        let mut depth = 0;
        let mut cursor = self.parents.get(&id);
        while let Some(parent) = cursor {
            depth += 1;
            cursor = self.parents.get(parent);
        }
        depth
    }

    fn next_serial(&mut self) -> u64 {
        self.next_instance += 1;
        self.next_instance
    }

    /// Bind `mount` to its existing editor, or create one, then repaint it and
    /// mount its children. Children the new paint no longer shows are removed.
    fn mount(&mut self, mount: Mount, parent: Option<ParamId>) {
        let Mount { param, labelled } = mount;
        let id = param.id;

        let mut previous = Vec::new();
        let mut editor = match self.editors.remove(&id) {
            Some(mut editor)
                if discriminant(&editor.param().kind) == discriminant(&param.kind) =>
            {
                previous = editor.view().child_ids();
                editor.bind(param);
                editor.set_labelled(labelled);
                editor
            }
            existing => {
                if let Some(old) = existing {
                    log::debug!(
                        "[EditorTree] {} changed kind {} -> {}, replacing editor",
                        id,
                        old.param().kind.label(),
                        param.kind.label()
                    );
                    previous = old.view().child_ids();
                }
                let serial = self.next_serial();
                create_editor(param, labelled, serial)
            }
        };
        let children = editor.rebuild();
        self.editors.insert(id, editor);

        match parent {
            Some(parent) => self.parents.insert(id, parent),
            None => self.parents.remove(&id),
        };

        let current: Vec<ParamId> = children.iter().map(|m| m.param.id).collect();
        for child in children {
            self.mount(child, Some(id));
        }
        for stale in previous.into_iter().filter(|c| !current.contains(c)) {
            self.remove(stale);
        }
    }

    fn remove(&mut self, id: ParamId) {
        let Some(editor) = self.editors.remove(&id) else {
            return;
        };
        self.parents.remove(&id);
        for child in editor.view().child_ids() {
            self.remove(child);
        }
    }

    /// Copy the definition held by `id`'s editor into every composite above it
    /// so a later rebuild of an ancestor does not resurrect stale values.
    fn sync_ancestors(&mut self, id: ParamId) {
        let Some(current) = self.editors.get(&id).map(|e| e.param().clone()) else {
            return;
        };
        let mut cursor = self.parents.get(&id).copied();
        while let Some(ancestor) = cursor {
            if let Some(editor) = self.editors.get_mut(&ancestor) {
                let mut bound = editor.param().clone();
                if bound.replace_descendant(&current) {
                    editor.bind(bound);
                }
            }
            cursor = self.parents.get(&ancestor).copied();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::{PanelItem, Widget};
    use crate::param::{resolve, ParamKind, WireParam};
    use serde_json::json;

    fn param(value: serde_json::Value) -> Param {
        let wire: WireParam = serde_json::from_value(value).expect("valid wire definition");
        resolve(&wire).expect("resolves")
    }

    fn filter(cutoff_max: f64) -> Param {
        param(json!({
            "id": 1, "name": "filter", "val": null, "hidden": [],
            "params": {
                "cutoff": {"id": 2, "name": "cutoff", "val": 1.0, "min": 0, "max": cutoff_max, "log_scale": false},
                "order": {"id": 3, "name": "order", "val": 2, "oneof": [1, 2, 4]}
            }
        }))
    }

    fn max_of(tree: &EditorTree, id: i64) -> f64 {
        match &tree.get(ParamId(id)).expect("editor exists").param().kind {
            ParamKind::Numeric(n) => n.max,
            other => panic!("expected numeric, got {other:?}"),
        }
    }

    #[test]
    fn test_load_creates_one_editor_per_visible_param() {
        let mut tree = EditorTree::new();
        tree.load(&[filter(5.0)]);

        assert_eq!(tree.len(), 3);
        assert_eq!(tree.roots(), &[ParamId(1)]);
        assert_eq!(tree.parent(ParamId(2)), Some(ParamId(1)));
        assert_eq!(
            tree.get(ParamId(1)).expect("root").view().child_ids(),
            vec![ParamId(2), ParamId(3)]
        );
    }

    #[test]
    fn test_leaf_redefinition_keeps_parent_expanded() {
        let mut tree = EditorTree::new();
        tree.load(&[filter(5.0)]);
        tree.interact(ParamId(1), Interaction::Toggle)
            .expect("toggle accepted");
        let parent_instance = tree.get(ParamId(1)).expect("root").instance();
        let leaf_instance = tree.get(ParamId(2)).expect("leaf").instance();

        let ParamKind::Hyper(h) = filter(20.0).kind else {
            panic!("expected hyper");
        };
        tree.reconcile(h.params["cutoff"].clone())
            .expect("known id");

        let root = tree.get(ParamId(1)).expect("root");
        assert_eq!(root.expanded(), Some(true));
        assert_eq!(root.instance(), parent_instance);
        assert_eq!(tree.get(ParamId(2)).expect("leaf").instance(), leaf_instance);
        assert_eq!(max_of(&tree, 2), 20.0);
    }

    #[test]
    fn test_parent_redefinition_keeps_expanded_and_children() {
        let mut tree = EditorTree::new();
        tree.load(&[filter(5.0)]);
        tree.interact(ParamId(1), Interaction::Toggle)
            .expect("toggle accepted");
        let leaf_instance = tree.get(ParamId(2)).expect("leaf").instance();

        tree.reconcile(filter(20.0)).expect("known id");

        let root = tree.get(ParamId(1)).expect("root");
        assert_eq!(root.expanded(), Some(true));
        let Widget::Accordion { expanded, .. } = &root.view().widget else {
            panic!("expected accordion");
        };
        assert!(*expanded);
        assert_eq!(tree.get(ParamId(2)).expect("leaf").instance(), leaf_instance);
        assert_eq!(max_of(&tree, 2), 20.0);
    }

    #[test]
    fn test_leaf_update_survives_parent_rebuild() {
        let mut tree = EditorTree::new();
        tree.load(&[filter(5.0)]);

        let ParamKind::Hyper(h) = filter(20.0).kind else {
            panic!("expected hyper");
        };
        tree.reconcile(h.params["cutoff"].clone())
            .expect("known id");
        tree.interact(ParamId(1), Interaction::Toggle)
            .expect("toggle accepted");

        // A rebuild from the parent's bound copy must see max 20, not 5.
        let bound = tree.get(ParamId(1)).expect("root").param().clone();
        tree.reconcile(bound).expect("known id");
        assert_eq!(max_of(&tree, 2), 20.0);
    }

    #[test]
    fn test_unknown_id_is_reported() {
        let mut tree = EditorTree::new();
        tree.load(&[filter(5.0)]);

        let stray = param(json!({"id": 99, "name": "stray", "val": true}));
        let err = tree.reconcile(stray).expect_err("unknown id");
        assert!(matches!(err, TunerError::UnknownParameterId(id) if id == ParamId(99)));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn test_kind_change_replaces_instance() {
        let mut tree = EditorTree::new();
        tree.load(&[param(json!({"id": 5, "name": "mode", "val": "fast"}))]);
        let before = tree.get(ParamId(5)).expect("editor").instance();

        tree.reconcile(param(json!({"id": 5, "name": "mode", "val": true})))
            .expect("known id");

        let editor = tree.get(ParamId(5)).expect("editor");
        assert_ne!(editor.instance(), before);
        assert_eq!(editor.view().widget, Widget::Checkbox { checked: true });
    }

    #[test]
    fn test_hidden_child_is_dropped_on_redefinition() {
        let mut tree = EditorTree::new();
        tree.load(&[filter(5.0)]);

        let mut narrowed = filter(5.0);
        if let ParamKind::Hyper(h) = &mut narrowed.kind {
            h.hidden.push("order".into());
        }
        tree.reconcile(narrowed).expect("known id");

        assert!(!tree.contains(ParamId(3)));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_optional_renders_inline_pair() {
        let mut tree = EditorTree::new();
        tree.load(&[param(json!({
            "id": 10, "name": "clip", "val": null, "hidden": [],
            "params": {
                "enabled": {"id": 11, "name": ".enabled", "val": true},
                "enabled_value": {"id": 12, "name": ".enabled_value", "val": 5, "min": 0, "max": 10}
            }
        }))]);

        let Widget::Accordion { panel, .. } = &tree.get(ParamId(10)).expect("root").view().widget
        else {
            panic!("expected accordion");
        };
        assert_eq!(
            panel,
            &vec![PanelItem::Editor(ParamId(11)), PanelItem::Editor(ParamId(12))]
        );
        assert_eq!(
            tree.get(ParamId(11)).expect("flag").view().label.as_deref(),
            Some(".enabled")
        );
        let value = tree.get(ParamId(12)).expect("value").view();
        assert_eq!(value.label, None);
        assert!(matches!(value.widget, Widget::Slider(_)));
    }

    fn optional_range(mean_max: f64) -> Param {
        param(json!({
            "id": 1, "name": "range", "val": null, "hidden": [],
            "params": {
                "enabled": {"id": 2, "name": ".enabled", "val": true},
                "enabled_value": optional_value(mean_max)
            }
        }))
    }

    fn optional_value(mean_max: f64) -> serde_json::Value {
        json!({
            "id": 3, "name": ".enabled_value", "val": null, "hidden": [],
            "params": {
                "mean": {"id": 4, "name": "mean", "val": 0.5, "min": 0, "max": mean_max}
            }
        })
    }

    #[test]
    fn test_spliced_value_redefinition_rebuilds_through_host() {
        let mut tree = EditorTree::new();
        tree.load(&[optional_range(1.0)]);
        assert!(!tree.contains(ParamId(3)));
        let host = tree.get(ParamId(1)).expect("editor").instance();
        let mean = tree.get(ParamId(4)).expect("editor").instance();

        let value = param(optional_value(50.0));
        tree.reconcile(value).expect("held by the Optional");

        assert_eq!(max_of(&tree, 4), 50.0);
        assert_eq!(tree.get(ParamId(1)).expect("editor").instance(), host);
        assert_eq!(tree.get(ParamId(4)).expect("editor").instance(), mean);
        assert_eq!(tree.parent(ParamId(4)), Some(ParamId(1)));
        assert!(tree
            .get(ParamId(1))
            .expect("editor")
            .param()
            .has_descendant(ParamId(4)));
    }
}
