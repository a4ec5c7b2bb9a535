//! Collapsible editor with one slider per vector index.
//!
//! The component sliders are not editors of their own (they have no id);
//! editing index `i` writes `val[i]` and sends the whole vector.

use super::numeric::slider_for;
use super::{Editor, EditorCore, Interaction, Mount, PanelItem, Widget};
use crate::error::TunerError;
use crate::param::{ParamKind, ParamValue, VectorParam};

/// Editor for [`ParamKind::Vector`].
#[derive(Debug)]
pub struct VectorEditor {
    core: EditorCore,
    expanded: bool,
}

impl VectorEditor {
    /// Wrap a core bound to a vector parameter. Starts collapsed.
    pub fn new(core: EditorCore) -> Self {
        Self {
            core,
            expanded: false,
        }
    }

    fn vector(&self) -> Option<&VectorParam> {
        match &self.core.param.kind {
            ParamKind::Vector(v) => Some(v),
            _ => None,
        }
    }

    fn store(&mut self, values: &[f64]) {
        if let ParamKind::Vector(v) = &mut self.core.param.kind {
            v.val = values.to_vec();
        }
        if let Widget::Accordion { panel, .. } = &mut self.core.view.widget {
            let sliders = panel.iter_mut().filter_map(|item| match item {
                PanelItem::Slider(slider) => Some(slider),
                PanelItem::Editor(_) => None,
            });
            for (slider, value) in sliders.zip(values) {
                slider.set_value(*value);
            }
        }
    }

    fn check_range(&self, v: &VectorParam, values: &[f64]) -> Result<(), TunerError> {
        if values.len() != v.val.len() {
            return Err(self.core.refused(format!(
                "expected {} components, got {}",
                v.val.len(),
                values.len()
            )));
        }
        for (index, value) in values.iter().enumerate() {
            if *value < v.min[index] || *value > v.max[index] {
                return Err(self.core.refused(format!(
                    "component {index}: {value} outside [{}, {}]",
                    v.min[index], v.max[index]
                )));
            }
        }
        Ok(())
    }
}

impl Editor for VectorEditor {
    fn core(&self) -> &EditorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    fn paint(&self) -> (Widget, Vec<Mount>) {
        let Some(v) = self.vector() else {
            return (Widget::Empty, Vec::new());
        };
        let panel = (0..v.val.len())
            .filter_map(|index| v.component(index))
            .map(|component| PanelItem::Slider(slider_for(&component)))
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
            Vec::new(),
        )
    }

    fn label(&self) -> Option<String> {
        None
    }

    fn expanded(&self) -> Option<bool> {
        Some(self.expanded)
    }

    fn bind_value(&mut self, val: &ParamValue) -> Result<(), TunerError> {
        let Some(values) = val.as_f64_vec() else {
            return Err(self.core.bad_push(val));
        };
        let len = self.vector().map_or(0, |v| v.val.len());
        if values.len() != len {
            return Err(self.core.bad_push(val));
        }
        self.store(&values);
        Ok(())
    }

    fn interact(&mut self, interaction: Interaction) -> Result<Option<ParamValue>, TunerError> {
        let v = self
            .vector()
            .ok_or_else(|| self.core.refused("not a vector"))?
            .clone();

        let values = match interaction {
            Interaction::Toggle => {
                self.expanded = !self.expanded;
                if let Widget::Accordion { expanded, .. } = &mut self.core.view.widget {
                    *expanded = self.expanded;
                }
                return Ok(None);
            }
            Interaction::SetComponent { index, value } => {
                if index >= v.val.len() {
                    return Err(self.core.refused(format!("no component {index}")));
                }
                let mut values = v.val.clone();
                values[index] = value;
                values
            }
            Interaction::SetValue(val) => match val.as_f64_vec() {
                Some(values) => values,
                None => {
                    return Err(self
                        .core
                        .refused(format!("expected a number sequence, got {}", val.type_name())))
                }
            },
            other => return Err(self.core.refused(format!("unsupported interaction {other:?}"))),
        };

        self.check_range(&v, &values)?;
        self.store(&values);
        Ok(self.vector().map(VectorParam::wire_value))
    }
}
