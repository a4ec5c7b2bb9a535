//! Parameter editors and the editor tree.
//!
//! Every parameter definition is bound to exactly one editor instance. An
//! editor owns a small render model ([`View`]) describing its own widget;
//! what toolkit eventually paints that model is not this module's concern.
//!
//! # Architecture
//!
//! ```text
//! EditorTree (arena: ParamId -> Box<dyn Editor>)
//!     │
//!     ├── NumericEditor      slider
//!     ├── VectorEditor       accordion of sliders, one per index
//!     ├── ChoiceEditor       select over `oneof`
//!     ├── ToggleEditor       checkbox
//!     ├── TextEditor         text input
//!     ├── HyperEditor        accordion of child editors
//!     └── PlaceholderEditor  unresolvable definition
//! ```
//!
//! Composite editors never own their children. They paint
//! [`PanelItem::Editor`] references and hand the child definitions back to
//! the tree as [`Mount`]s; the tree creates the child editor or, if one already
//! exists for that id, rebinds it. That keeps every editor instance, and
//! whatever local state it carries (expanded/collapsed), alive across
//! redefinitions.

pub mod choice;
pub mod hyper;
pub mod numeric;
pub mod placeholder;
pub mod text;
pub mod toggle;
pub mod tree;
pub mod vector;

pub use tree::EditorTree;

use crate::error::TunerError;
use crate::param::{Param, ParamId, ParamKind, ParamValue};

/// Render model for a slider.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderView {
    /// Lower end of the scale.
    pub min: f64,
    /// Upper end of the scale.
    pub max: f64,
    /// Logarithmic scale.
    pub log_scale: bool,
    /// Step between positions, continuous if `None`.
    pub step: Option<f64>,
    /// Current position.
    pub value: f64,
    /// Formatted value shown next to the slider.
    pub readout: String,
}

impl SliderView {
    /// Slider model for a numeric parameter.
    pub fn new(min: f64, max: f64, log_scale: bool, step: Option<f64>, value: f64) -> Self {
        Self {
            min,
            max,
            log_scale,
            step,
            value,
            readout: crate::render::format_num(value),
        }
    }

    /// Move the slider without touching its geometry.
    pub fn set_value(&mut self, value: f64) {
        self.value = value;
        self.readout = crate::render::format_num(value);
    }
}

/// An entry in a collapsible panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelItem {
    /// A child editor, painted by the child itself.
    Editor(ParamId),
    /// An anonymous slider owned by the panel's editor (vector components).
    Slider(SliderView),
}

/// The widget an editor paints.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// Nothing painted yet.
    Empty,
    /// Numeric slider.
    Slider(SliderView),
    /// Boolean checkbox.
    Checkbox {
        /// Checked state.
        checked: bool,
    },
    /// Option select.
    Select {
        /// Options rendered as strings.
        options: Vec<String>,
        /// Index of the selected option, if the value is one of them.
        selected: Option<usize>,
    },
    /// Free text input.
    TextInput {
        /// Current text.
        value: String,
    },
    /// Collapsible panel with a header button.
    Accordion {
        /// Header text.
        title: String,
        /// Whether the panel is open.
        expanded: bool,
        /// Panel contents.
        panel: Vec<PanelItem>,
    },
    /// Error placeholder for a parameter that could not be edited.
    Placeholder {
        /// What went wrong.
        reason: String,
    },
}

/// An editor's painted output.
#[derive(Debug, Clone, PartialEq)]
pub struct View {
    /// Label shown beside the widget.
    pub label: Option<String>,
    /// The widget itself.
    pub widget: Widget,
}

impl View {
    /// Ids of the child editors referenced by this view.
    pub fn child_ids(&self) -> Vec<ParamId> {
        match &self.widget {
            Widget::Accordion { panel, .. } => panel
                .iter()
                .filter_map(|item| match item {
                    PanelItem::Editor(id) => Some(*id),
                    PanelItem::Slider(_) => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// A child definition a composite wants mounted in its panel.
#[derive(Debug, Clone, PartialEq)]
pub struct Mount {
    /// Child definition.
    pub param: Param,
    /// Whether the child shows its own label.
    pub labelled: bool,
}

impl Mount {
    /// Mount with the child's label shown.
    pub fn labelled(param: &Param) -> Self {
        Self {
            param: param.clone(),
            labelled: true,
        }
    }

    /// Mount with the label suppressed.
    pub fn unlabelled(param: &Param) -> Self {
        Self {
            param: param.clone(),
            labelled: false,
        }
    }
}

/// A local user interaction with an editor.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    /// Replace the whole value.
    SetValue(ParamValue),
    /// Set one index of a vector.
    SetComponent {
        /// Vector index.
        index: usize,
        /// New component value.
        value: f64,
    },
    /// Pick an option by position.
    SelectOption(usize),
    /// Expand/collapse a panel, or flip a checkbox.
    Toggle,
}

/// State every editor carries.
#[derive(Debug)]
pub struct EditorCore {
    /// Bound definition.
    pub param: Param,
    /// Show the parameter name as label.
    pub labelled: bool,
    /// Last painted output.
    pub view: View,
    /// Construction serial, stable for the life of the instance.
    pub instance: u64,
}

impl EditorCore {
    /// Fresh core with nothing painted.
    pub fn new(param: Param, labelled: bool, instance: u64) -> Self {
        Self {
            param,
            labelled,
            view: View {
                label: None,
                widget: Widget::Empty,
            },
            instance,
        }
    }

    pub(crate) fn refused(&self, reason: impl Into<String>) -> TunerError {
        TunerError::InvalidInteraction {
            id: self.param.id,
            reason: reason.into(),
        }
    }

    pub(crate) fn bad_push(&self, val: &ParamValue) -> TunerError {
        TunerError::ProtocolShapeError {
            message: format!("[{}, {}]", self.param.id.0, val),
            state: format!("{} editor for '{}'", self.param.kind.label(), self.param.name),
        }
    }
}

/// Common contract of all editors.
///
/// Implementors supply [`paint`](Editor::paint), [`bind_value`](Editor::bind_value)
/// and [`interact`](Editor::interact); rebinding and rebuilding are shared.
pub trait Editor: std::fmt::Debug {
    /// Shared state.
    fn core(&self) -> &EditorCore;

    /// Shared state (mutable).
    fn core_mut(&mut self) -> &mut EditorCore;

    /// Paint the widget for the bound definition and list the children to mount.
    fn paint(&self) -> (Widget, Vec<Mount>);

    /// Apply a value pushed from outside without rebuilding structure.
    fn bind_value(&mut self, val: &ParamValue) -> Result<(), TunerError>;

    /// Apply a local interaction.
    ///
    /// Returns the new value to send to the node, or `None` if the interaction
    /// only changed local UI state.
    fn interact(&mut self, interaction: Interaction) -> Result<Option<ParamValue>, TunerError>;

    /// Label for the painted view.
    fn label(&self) -> Option<String> {
        let core = self.core();
        core.labelled.then(|| core.param.name.clone())
    }

    /// Expanded state for collapsible editors.
    fn expanded(&self) -> Option<bool> {
        None
    }

    /// Bound definition.
    fn param(&self) -> &Param {
        &self.core().param
    }

    /// Last painted output.
    fn view(&self) -> &View {
        &self.core().view
    }

    /// Construction serial of this instance.
    fn instance(&self) -> u64 {
        self.core().instance
    }

    /// Point the editor at a new definition. Does not repaint.
    fn bind(&mut self, param: Param) {
        self.core_mut().param = param;
    }

    /// Show or hide the label on the next paint.
    fn set_labelled(&mut self, labelled: bool) {
        self.core_mut().labelled = labelled;
    }

    /// Discard the painted view and repaint from the bound definition.
    ///
    /// Returns the children the tree must mount.
    fn rebuild(&mut self) -> Vec<Mount> {
        let (widget, mounts) = self.paint();
        let label = self.label();
        self.core_mut().view = View { label, widget };
        mounts
    }
}

/// Construct the editor matching a resolved parameter.
pub fn create_editor(param: Param, labelled: bool, instance: u64) -> Box<dyn Editor> {
    let core = EditorCore::new(param, labelled, instance);
    match &core.param.kind {
        ParamKind::Hyper(_) => Box::new(hyper::HyperEditor::new(core)),
        ParamKind::Enum(_) => Box::new(choice::ChoiceEditor::new(core)),
        ParamKind::Numeric(_) => Box::new(numeric::NumericEditor::new(core)),
        ParamKind::Vector(_) => Box::new(vector::VectorEditor::new(core)),
        ParamKind::Bool(_) => Box::new(toggle::ToggleEditor::new(core)),
        ParamKind::Text(_) => Box::new(text::TextEditor::new(core)),
        ParamKind::Unresolved { .. } => Box::new(placeholder::PlaceholderEditor::new(core)),
    }
}
