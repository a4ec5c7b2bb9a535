//! Checkbox editor for boolean parameters.

use super::{Editor, EditorCore, Interaction, Mount, Widget};
use crate::error::TunerError;
use crate::param::{ParamKind, ParamValue};

/// Editor for [`ParamKind::Bool`].
#[derive(Debug)]
pub struct ToggleEditor {
    core: EditorCore,
}

impl ToggleEditor {
    /// Wrap a core bound to a boolean parameter.
    pub fn new(core: EditorCore) -> Self {
        Self { core }
    }

    fn checked(&self) -> bool {
        matches!(self.core.param.kind, ParamKind::Bool(true))
    }

    fn store(&mut self, value: bool) {
        self.core.param.kind = ParamKind::Bool(value);
        if let Widget::Checkbox { checked } = &mut self.core.view.widget {
            *checked = value;
        }
    }
}

impl Editor for ToggleEditor {
    fn core(&self) -> &EditorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    fn paint(&self) -> (Widget, Vec<Mount>) {
        (
            Widget::Checkbox {
                checked: self.checked(),
            },
            Vec::new(),
        )
    }

    fn bind_value(&mut self, val: &ParamValue) -> Result<(), TunerError> {
        let ParamValue::Bool(value) = val else {
            return Err(self.core.bad_push(val));
        };
        self.store(*value);
        Ok(())
    }

    fn interact(&mut self, interaction: Interaction) -> Result<Option<ParamValue>, TunerError> {
        let value = match interaction {
            Interaction::Toggle => !self.checked(),
            Interaction::SetValue(ParamValue::Bool(value)) => value,
            other => return Err(self.core.refused(format!("checkbox cannot apply {other:?}"))),
        };
        self.store(value);
        Ok(Some(ParamValue::Bool(value)))
    }
}
