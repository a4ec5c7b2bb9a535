//! Slider editor for bounded scalar parameters.

use super::{Editor, EditorCore, Interaction, Mount, SliderView, Widget};
use crate::error::TunerError;
use crate::param::{NumericParam, ParamKind, ParamValue};

/// Editor for [`ParamKind::Numeric`].
#[derive(Debug)]
pub struct NumericEditor {
    core: EditorCore,
}

impl NumericEditor {
    /// Wrap a core bound to a numeric parameter.
    pub fn new(core: EditorCore) -> Self {
        Self { core }
    }

    fn numeric(&self) -> Option<&NumericParam> {
        match &self.core.param.kind {
            ParamKind::Numeric(n) => Some(n),
            _ => None,
        }
    }

    fn store(&mut self, value: f64) {
        if let ParamKind::Numeric(n) = &mut self.core.param.kind {
            n.val = value;
        }
        if let Widget::Slider(slider) = &mut self.core.view.widget {
            slider.set_value(value);
        }
    }
}

/// Slider model for a numeric parameter.
pub fn slider_for(n: &NumericParam) -> SliderView {
    SliderView::new(n.min, n.max, n.log_scale, n.step, n.val)
}

impl Editor for NumericEditor {
    fn core(&self) -> &EditorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    fn paint(&self) -> (Widget, Vec<Mount>) {
        let widget = self
            .numeric()
            .map_or(Widget::Empty, |n| Widget::Slider(slider_for(n)));
        (widget, Vec::new())
    }

    fn bind_value(&mut self, val: &ParamValue) -> Result<(), TunerError> {
        let value = val.as_f64().ok_or_else(|| self.core.bad_push(val))?;
        self.store(value);
        Ok(())
    }

    fn interact(&mut self, interaction: Interaction) -> Result<Option<ParamValue>, TunerError> {
        let Interaction::SetValue(val) = interaction else {
            return Err(self.core.refused("slider only accepts a value"));
        };
        let Some(value) = val.as_f64() else {
            return Err(self.core.refused(format!("expected a number, got {}", val.type_name())));
        };
        let n = self.numeric().ok_or_else(|| self.core.refused("not numeric"))?;
        if value < n.min || value > n.max {
            return Err(self
                .core
                .refused(format!("{value} outside [{}, {}]", n.min, n.max)));
        }

        self.store(value);
        Ok(self.numeric().map(NumericParam::wire_value))
    }
}
