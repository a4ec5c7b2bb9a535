//! Text input editor for string parameters.

use super::{Editor, EditorCore, Interaction, Mount, Widget};
use crate::error::TunerError;
use crate::param::{ParamKind, ParamValue};

/// Editor for [`ParamKind::Text`].
#[derive(Debug)]
pub struct TextEditor {
    core: EditorCore,
}

impl TextEditor {
    /// Wrap a core bound to a string parameter.
    pub fn new(core: EditorCore) -> Self {
        Self { core }
    }

    fn store(&mut self, text: &str) {
        self.core.param.kind = ParamKind::Text(text.to_string());
        if let Widget::TextInput { value } = &mut self.core.view.widget {
            *value = text.to_string();
        }
    }
}

impl Editor for TextEditor {
    fn core(&self) -> &EditorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    fn paint(&self) -> (Widget, Vec<Mount>) {
        let value = match &self.core.param.kind {
            ParamKind::Text(s) => s.clone(),
            _ => String::new(),
        };
        (Widget::TextInput { value }, Vec::new())
    }

    fn bind_value(&mut self, val: &ParamValue) -> Result<(), TunerError> {
        let ParamValue::Text(text) = val else {
            return Err(self.core.bad_push(val));
        };
        self.store(text);
        Ok(())
    }

    fn interact(&mut self, interaction: Interaction) -> Result<Option<ParamValue>, TunerError> {
        let Interaction::SetValue(ParamValue::Text(text)) = interaction else {
            return Err(self.core.refused("text input only accepts a string"));
        };
        self.store(&text);
        Ok(Some(ParamValue::Text(text)))
    }
}
