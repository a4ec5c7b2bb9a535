//! Stand-in for definitions the type resolver could not place.

use super::{Editor, EditorCore, Interaction, Mount, Widget};
use crate::error::TunerError;
use crate::param::{ParamKind, ParamValue};

/// Editor for [`ParamKind::Unresolved`]; paints the failure and refuses edits.
#[derive(Debug)]
pub struct PlaceholderEditor {
    core: EditorCore,
}

impl PlaceholderEditor {
    /// Wrap a core bound to an unresolved parameter.
    pub fn new(core: EditorCore) -> Self {
        Self { core }
    }
}

impl Editor for PlaceholderEditor {
    fn core(&self) -> &EditorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    fn paint(&self) -> (Widget, Vec<Mount>) {
        let reason = match &self.core.param.kind {
            ParamKind::Unresolved { reason, .. } => reason.clone(),
            other => format!("unexpected {} parameter", other.label()),
        };
        (Widget::Placeholder { reason }, Vec::new())
    }

    fn bind_value(&mut self, val: &ParamValue) -> Result<(), TunerError> {
        Err(self.core.bad_push(val))
    }

    fn interact(&mut self, _interaction: Interaction) -> Result<Option<ParamValue>, TunerError> {
        Err(self.core.refused("parameter kind could not be resolved"))
    }
}
