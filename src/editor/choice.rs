//! Select editor for enum parameters.

use super::{Editor, EditorCore, Interaction, Mount, Widget};
use crate::error::TunerError;
use crate::param::{EnumParam, ParamKind, ParamValue};

/// Editor for [`ParamKind::Enum`].
#[derive(Debug)]
pub struct ChoiceEditor {
    core: EditorCore,
}

impl ChoiceEditor {
    /// Wrap a core bound to an enum parameter.
    pub fn new(core: EditorCore) -> Self {
        Self { core }
    }

    fn choice(&self) -> Option<&EnumParam> {
        match &self.core.param.kind {
            ParamKind::Enum(e) => Some(e),
            _ => None,
        }
    }

    fn store(&mut self, val: ParamValue) {
        let mut selection = None;
        if let ParamKind::Enum(e) = &mut self.core.param.kind {
            e.val = val;
            selection = e.selected();
        }
        if let Widget::Select { selected, .. } = &mut self.core.view.widget {
            *selected = selection;
        }
    }
}

impl Editor for ChoiceEditor {
    fn core(&self) -> &EditorCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut EditorCore {
        &mut self.core
    }

    fn paint(&self) -> (Widget, Vec<Mount>) {
        let widget = self.choice().map_or(Widget::Empty, |e| Widget::Select {
            options: e.oneof.iter().map(ToString::to_string).collect(),
            selected: e.selected(),
        });
        (widget, Vec::new())
    }

    fn bind_value(&mut self, val: &ParamValue) -> Result<(), TunerError> {
        self.store(val.clone());
        Ok(())
    }

    fn interact(&mut self, interaction: Interaction) -> Result<Option<ParamValue>, TunerError> {
        let e = self.choice().ok_or_else(|| self.core.refused("not an enum"))?;
        let val = match interaction {
            Interaction::SelectOption(index) => e
                .oneof
                .get(index)
                .cloned()
                .ok_or_else(|| self.core.refused(format!("no option {index}")))?,
            Interaction::SetValue(val) if e.oneof.contains(&val) => val,
            Interaction::SetValue(val) => {
                return Err(self.core.refused(format!("{val} is not one of the options")));
            }
            other => return Err(self.core.refused(format!("unsupported interaction {other:?}"))),
        };

        self.store(val.clone());
        Ok(Some(val))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param::{Param, ParamId};

    fn method() -> ChoiceEditor {
        let param = Param {
            id: ParamId(4),
            name: "method".into(),
            kind: ParamKind::Enum(EnumParam {
                val: ParamValue::Text("euler".into()),
                oneof: vec![
                    ParamValue::Text("euler".into()),
                    ParamValue::Text("rk4".into()),
                ],
            }),
        };
        let mut editor = ChoiceEditor::new(EditorCore::new(param, true, 0));
        editor.rebuild();
        editor
    }

    #[test]
    fn test_paint_options_and_selection() {
        let editor = method();
        assert_eq!(
            editor.view().widget,
            Widget::Select {
                options: vec!["euler".into(), "rk4".into()],
                selected: Some(0),
            }
        );
    }

    #[test]
    fn test_select_option_sends_option_value() {
        let mut editor = method();
        let sent = editor.interact(Interaction::SelectOption(1)).expect("accepted");
        assert_eq!(sent, Some(ParamValue::Text("rk4".into())));
        let Widget::Select { selected, .. } = &editor.view().widget else {
            panic!("expected select");
        };
        assert_eq!(*selected, Some(1));
    }

    #[test]
    fn test_value_outside_options_refused() {
        let mut editor = method();
        assert!(editor
            .interact(Interaction::SetValue(ParamValue::Text("midpoint".into())))
            .is_err());
        assert!(editor.interact(Interaction::SelectOption(5)).is_err());
    }

    #[test]
    fn test_pushed_unknown_value_clears_selection() {
        let mut editor = method();
        editor
            .bind_value(&ParamValue::Text("midpoint".into()))
            .expect("push accepted");
        let Widget::Select { selected, .. } = &editor.view().widget else {
            panic!("expected select");
        };
        assert_eq!(*selected, None);
    }
}
