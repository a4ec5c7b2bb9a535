//! Collapsible editor for hyperparameters.
//!
//! The panel lists the visible (non-hidden) children in wire order. One shape
//! gets special treatment, the "Optional" convention: when the visible
//! children are exactly `.enabled` followed by `.enabled_value`,
//!
//! - `.enabled` is mounted as a normal labelled child, and
//! - `.enabled_value` is either spliced (if it is itself a hyperparameter, its
//!   visible children take its place) or mounted without a label.
//!
//! Anything that does not match exactly (extra visible fields, other order)
//! falls back to the plain listing.

use super::{Editor, EditorCore, Interaction, Mount, PanelItem, Widget};
use crate::error::TunerError;
use crate::param::{HyperParam, Param, ParamKind, ParamValue};

/// Name of the flag child in the Optional convention.
pub const ENABLED: &str = ".enabled";
/// Name of the value child in the Optional convention.
pub const ENABLED_VALUE: &str = ".enabled_value";

/// Editor for [`ParamKind::Hyper`].
#[derive(Debug)]
pub struct HyperEditor {
    core: EditorCore,
    expanded: bool,
}

impl HyperEditor {
    /// Wrap a core bound to a hyperparameter. Starts collapsed.
    pub fn new(core: EditorCore) -> Self {
        Self {
            core,
            expanded: false,
        }
    }
}

/// The `(.enabled, .enabled_value)` pair, if `visible` is an Optional.
pub fn optional_pair<'a>(visible: &[&'a Param]) -> Option<(&'a Param, &'a Param)> {
    match visible {
        [enabled, value] if enabled.name == ENABLED && value.name == ENABLED_VALUE => {
            Some((enabled, value))
        }
        _ => None,
    }
}

/// Children to mount for a hyperparameter's panel.
pub fn panel_mounts(hyper: &HyperParam) -> Vec<Mount> {
    let visible: Vec<&Param> = hyper.visible().collect();

    let Some((enabled, value)) = optional_pair(&visible) else {
        return visible.into_iter().map(Mount::labelled).collect();
    };

    let mut mounts = vec![Mount::labelled(enabled)];
    match &value.kind {
        ParamKind::Hyper(inner) => mounts.extend(inner.visible().map(Mount::labelled)),
        _ => mounts.push(Mount::unlabelled(value)),
    }
    mounts
}

impl Editor for HyperEditor {
    fn core(&self) -> &EditorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    fn paint(&self) -> (Widget, Vec<Mount>) {
        let ParamKind::Hyper(hyper) = &self.core.param.kind else {
            return (Widget::Empty, Vec::new());
        };
        let mounts = panel_mounts(hyper);
        let panel = mounts
            .iter()
            .map(|mount| PanelItem::Editor(mount.param.id))
            .collect();
        let title = if self.core.labelled {
            self.core.param.name.clone()
        } else {
            String::new()
        };

        (
            Widget::Accordion {
                title,
                expanded: self.expanded,
                panel,
            },
            mounts,
        )
    }

    fn label(&self) -> Option<String> {
        None
    }

    fn expanded(&self) -> Option<bool> {
        Some(self.expanded)
    }

    fn bind_value(&mut self, val: &ParamValue) -> Result<(), TunerError> {
        Err(self.core.bad_push(val))
    }

    fn interact(&mut self, interaction: Interaction) -> Result<Option<ParamValue>, TunerError> {
        let Interaction::Toggle = interaction else {
            return Err(self.core.refused("a hyperparameter has no value of its own"));
        };
        self.expanded = !self.expanded;
        if let Widget::Accordion { expanded, .. } = &mut self.core.view.widget {
            *expanded = self.expanded;
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::resolver::resolve;
    use crate::param::{ParamId, WireParam};
    use serde_json::json;

    fn hyper(value: serde_json::Value) -> HyperParam {
        let wire: WireParam = serde_json::from_value(value).expect("valid wire definition");
        match resolve(&wire).expect("resolves").kind {
            ParamKind::Hyper(h) => h,
            other => panic!("expected hyper, got {other:?}"),
        }
    }

    fn ids(mounts: &[Mount]) -> Vec<i64> {
        mounts.iter().map(|m| m.param.id.0).collect()
    }

    #[test]
    fn test_hidden_children_are_skipped() {
        let h = hyper(json!({
            "id": 1, "name": "filter", "val": null, "hidden": ["order"],
            "params": {
                "cutoff": {"id": 2, "name": "cutoff", "val": 1.0, "min": 0, "max": 5},
                "order": {"id": 3, "name": "order", "val": "x"},
                "on": {"id": 4, "name": "on", "val": true}
            }
        }));
        let mounts = panel_mounts(&h);
        assert_eq!(ids(&mounts), vec![2, 4]);
        assert!(mounts.iter().all(|m| m.labelled));
    }

    #[test]
    fn test_optional_scalar_value_is_unlabelled() {
        let h = hyper(json!({
            "id": 1, "name": "limit", "val": null, "hidden": [],
            "params": {
                "enabled": {"id": 2, "name": ".enabled", "val": true},
                "enabled_value": {"id": 3, "name": ".enabled_value", "val": 5, "min": 0, "max": 10}
            }
        }));
        let mounts = panel_mounts(&h);
        assert_eq!(ids(&mounts), vec![2, 3]);
        assert!(mounts[0].labelled);
        assert!(!mounts[1].labelled);
    }

    #[test]
    fn test_optional_hyper_value_is_spliced() {
        let h = hyper(json!({
            "id": 1, "name": "noise", "val": null, "hidden": [],
            "params": {
                "enabled": {"id": 2, "name": ".enabled", "val": false},
                "enabled_value": {"id": 3, "name": ".enabled_value", "val": null, "hidden": [], "params": {
                    "mean": {"id": 4, "name": "mean", "val": 0.0, "min": -1, "max": 1},
                    "std": {"id": 5, "name": "std", "val": 0.1, "min": 0, "max": 1}
                }}
            }
        }));
        assert_eq!(ids(&panel_mounts(&h)), vec![2, 4, 5]);
    }

    #[test]
    fn test_optional_with_extra_visible_field_falls_back() {
        let h = hyper(json!({
            "id": 1, "name": "limit", "val": null, "hidden": [],
            "params": {
                "enabled": {"id": 2, "name": ".enabled", "val": true},
                "enabled_value": {"id": 3, "name": ".enabled_value", "val": 5, "min": 0, "max": 10},
                "extra": {"id": 4, "name": "extra", "val": "x"}
            }
        }));
        let mounts = panel_mounts(&h);
        assert_eq!(ids(&mounts), vec![2, 3, 4]);
        assert!(mounts.iter().all(|m| m.labelled));
    }

    #[test]
    fn test_optional_with_hidden_extra_still_matches() {
        let h = hyper(json!({
            "id": 1, "name": "limit", "val": null, "hidden": ["extra"],
            "params": {
                "enabled": {"id": 2, "name": ".enabled", "val": true},
                "extra": {"id": 4, "name": "extra", "val": "x"},
                "enabled_value": {"id": 3, "name": ".enabled_value", "val": 5, "min": 0, "max": 10}
            }
        }));
        let mounts = panel_mounts(&h);
        assert_eq!(ids(&mounts), vec![2, 3]);
        assert!(!mounts[1].labelled);
    }

    #[test]
    fn test_toggle_only_changes_local_state() {
        let param = Param {
            id: ParamId(1),
            name: "group".into(),
            kind: ParamKind::Hyper(HyperParam {
                params: indexmap::IndexMap::new(),
                hidden: Vec::new(),
            }),
        };
        let mut editor = HyperEditor::new(EditorCore::new(param, true, 0));
        editor.rebuild();

        assert_eq!(editor.interact(Interaction::Toggle).expect("toggles"), None);
        assert_eq!(editor.expanded(), Some(true));
        assert!(editor
            .interact(Interaction::SetValue(ParamValue::Bool(true)))
            .is_err());
    }
}
