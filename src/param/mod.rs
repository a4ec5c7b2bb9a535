//! Parameter data model.
//!
//! Two layers:
//!
//! - [`WireParam`] - the definition exactly as the node sends it. There is no
//!   discriminant field; which variant a definition is can only be told from
//!   which optional fields are present.
//! - [`Param`] / [`ParamKind`] - the typed form. Every definition is run
//!   through [`resolver::resolve`] once, at decode time, and everything
//!   downstream (registry, editors, rendering) matches on the enum instead of
//!   probing fields again.
//!
//! # Modules
//!
//! - [`resolver`] - `WireParam` to `ParamKind` dispatch
//! - [`registry`] - id to definition lookup over the flattened tree

pub mod registry;
pub mod resolver;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use registry::ParamRegistry;
pub use resolver::resolve;

/// Parameter identifier, unique across the whole tree of one node selection.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParamId(pub i64);

impl std::fmt::Display for ParamId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<i64> for ParamId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A parameter value as carried on the data channel.
///
/// Integers and floats stay distinct so values are echoed back to the node
/// with the type it sent: enum options like `[1, 2, 3]`, integer sliders and
/// integer vectors all go out as MessagePack ints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Unused value (hyperparameters).
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Sequence of integers (integer vector parameters).
    IntVector(Vec<i64>),
    /// Sequence of numbers (vector parameters).
    Vector(Vec<f64>),
    /// String value.
    Text(String),
}

impl ParamValue {
    /// Numeric view of the value, if it is a scalar number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Numeric view of the value, if it is a number sequence.
    pub fn as_f64_vec(&self) -> Option<Vec<f64>> {
        match self {
            Self::IntVector(v) => Some(v.iter().map(|i| *i as f64).collect()),
            Self::Vector(v) => Some(v.clone()),
            _ => None,
        }
    }

    /// Short type name used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Int(_) | Self::Float(_) => "number",
            Self::IntVector(_) | Self::Vector(_) => "number sequence",
            Self::Text(_) => "string",
        }
    }

    /// Convert a decoded JSON value into a parameter value.
    ///
    /// Returns `None` for shapes no parameter can hold (objects, mixed arrays).
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::IntVector(v) => write!(f, "{}", join(v)),
            Self::Vector(v) => write!(f, "{}", join(v)),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

fn join<T: ToString>(values: &[T]) -> String {
    let parts: Vec<String> = values.iter().map(ToString::to_string).collect();
    parts.join(",")
}

/// Wire form of a slider value: an int when the node sent an int and the
/// value is still whole, a float otherwise.
fn number(value: f64, integral: bool) -> ParamValue {
    if is_whole(value, integral) {
        ParamValue::Int(value as i64)
    } else {
        ParamValue::Float(value)
    }
}

fn is_whole(value: f64, integral: bool) -> bool {
    // Beyond 2^53 an f64 no longer maps back to a unique i64.
    integral && value.fract() == 0.0 && value.abs() <= 9_007_199_254_740_992.0
}

/// A numeric bound that is either a scalar or one value per vector index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Bound {
    /// Single bound.
    Scalar(f64),
    /// Per-index bounds.
    Vector(Vec<f64>),
}

/// A parameter definition as sent by the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireParam {
    /// Unique identifier.
    pub id: ParamId,
    /// Display label. A leading `.` marks a synthetic sub-field (`.enabled`).
    pub name: String,
    /// Current value; null for hyperparameters.
    #[serde(default)]
    pub val: serde_json::Value,
    /// Lower bound (numeric and vector parameters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<Bound>,
    /// Upper bound (numeric and vector parameters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Bound>,
    /// Logarithmic slider scale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_scale: Option<bool>,
    /// Slider step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,
    /// Allowed values (enum parameters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oneof: Option<Vec<serde_json::Value>>,
    /// Nested parameters by attribute name (hyperparameters).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<IndexMap<String, WireParam>>,
    /// Attribute names of `params` excluded from display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<Vec<String>>,
}

impl WireParam {
    /// A bare definition with only id, name and value set.
    pub fn new(id: i64, name: &str, val: serde_json::Value) -> Self {
        Self {
            id: ParamId(id),
            name: name.to_string(),
            val,
            min: None,
            max: None,
            log_scale: None,
            step: None,
            oneof: None,
            params: None,
            hidden: None,
        }
    }
}

/// A resolved parameter definition.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Unique identifier.
    pub id: ParamId,
    /// Display label.
    pub name: String,
    /// Variant-specific payload.
    pub kind: ParamKind,
}

/// The variant of a parameter, decided once by the type resolver.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamKind {
    /// Composite of named child parameters.
    Hyper(HyperParam),
    /// One value out of a fixed option list.
    Enum(EnumParam),
    /// Bounded scalar number.
    Numeric(NumericParam),
    /// Bounded number per index.
    Vector(VectorParam),
    /// Boolean flag.
    Bool(bool),
    /// Free text.
    Text(String),
    /// Definition whose shape matched no variant; kept so the id stays known.
    Unresolved {
        /// Why resolution failed.
        reason: String,
        /// The offending definition.
        definition: Box<WireParam>,
    },
}

impl ParamKind {
    /// Short variant name used in logs and rendering.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Hyper(_) => "hyper",
            Self::Enum(_) => "enum",
            Self::Numeric(_) => "numeric",
            Self::Vector(_) => "vector",
            Self::Bool(_) => "bool",
            Self::Text(_) => "string",
            Self::Unresolved { .. } => "unresolved",
        }
    }
}

/// Numeric parameter payload.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericParam {
    /// Current value.
    pub val: f64,
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
    /// Logarithmic slider scale.
    pub log_scale: bool,
    /// Slider step.
    pub step: Option<f64>,
    /// The node sent an integer value.
    pub integral: bool,
}

impl NumericParam {
    /// Current value in the type the node sent it.
    pub fn wire_value(&self) -> ParamValue {
        number(self.val, self.integral)
    }
}

/// Vector parameter payload: one numeric sub-control per index.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorParam {
    /// Current values.
    pub val: Vec<f64>,
    /// Lower bound per index.
    pub min: Vec<f64>,
    /// Upper bound per index.
    pub max: Vec<f64>,
    /// Logarithmic slider scale.
    pub log_scale: bool,
    /// Slider step.
    pub step: Option<f64>,
    /// The node sent integer elements.
    pub integral: bool,
}

impl VectorParam {
    /// Current values in the type the node sent them.
    pub fn wire_value(&self) -> ParamValue {
        if self.val.iter().all(|x| is_whole(*x, self.integral)) {
            ParamValue::IntVector(self.val.iter().map(|x| *x as i64).collect())
        } else {
            ParamValue::Vector(self.val.clone())
        }
    }

    /// The numeric sub-parameter at `index`, if in range.
    pub fn component(&self, index: usize) -> Option<NumericParam> {
        Some(NumericParam {
            val: *self.val.get(index)?,
            min: *self.min.get(index)?,
            max: *self.max.get(index)?,
            log_scale: self.log_scale,
            step: self.step,
            integral: self.integral,
        })
    }
}

/// Enum parameter payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumParam {
    /// Current value; expected to be one of `oneof`.
    pub val: ParamValue,
    /// Allowed values in display order.
    pub oneof: Vec<ParamValue>,
}

impl EnumParam {
    /// Index of the current value within `oneof`.
    pub fn selected(&self) -> Option<usize> {
        self.oneof.iter().position(|option| *option == self.val)
    }
}

/// Hyperparameter payload.
#[derive(Debug, Clone, PartialEq)]
pub struct HyperParam {
    /// Nested parameters by attribute name, in wire order.
    pub params: IndexMap<String, Param>,
    /// Attribute names excluded from display.
    pub hidden: Vec<String>,
}

impl HyperParam {
    /// Visible nested parameters in wire order.
    pub fn visible(&self) -> impl Iterator<Item = &Param> {
        self.params
            .iter()
            .filter(|(attr, _)| !self.hidden.contains(attr))
            .map(|(_, param)| param)
    }
}

impl Param {
    /// Current value in wire form.
    pub fn value(&self) -> ParamValue {
        match &self.kind {
            ParamKind::Hyper(_) | ParamKind::Unresolved { .. } => ParamValue::Null,
            ParamKind::Enum(e) => e.val.clone(),
            ParamKind::Numeric(n) => n.wire_value(),
            ParamKind::Vector(v) => v.wire_value(),
            ParamKind::Bool(b) => ParamValue::Bool(*b),
            ParamKind::Text(s) => ParamValue::Text(s.clone()),
        }
    }

    /// Direct children, empty for everything but hyperparameters.
    pub fn children(&self) -> impl Iterator<Item = &Param> {
        let params = match &self.kind {
            ParamKind::Hyper(h) => Some(h.params.values()),
            _ => None,
        };
        params.into_iter().flatten()
    }

    /// Every id nested below this parameter, depth first.
    pub fn descendant_ids(&self) -> Vec<ParamId> {
        let mut ids = Vec::new();
        for child in self.children() {
            ids.push(child.id);
            ids.extend(child.descendant_ids());
        }
        ids
    }

    /// Whether `id` is nested anywhere below this parameter.
    pub fn has_descendant(&self, id: ParamId) -> bool {
        self.children()
            .any(|child| child.id == id || child.has_descendant(id))
    }

    /// Swap the nested copy of `replacement.id` for `replacement`.
    ///
    /// Returns `false` if the id is not nested below this parameter.
    pub fn replace_descendant(&mut self, replacement: &Param) -> bool {
        let ParamKind::Hyper(hyper) = &mut self.kind else {
            return false;
        };
        for child in hyper.params.values_mut() {
            if child.id == replacement.id {
                *child = replacement.clone();
                return true;
            }
            if child.replace_descendant(replacement) {
                return true;
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_param_value_untagged_decode() {
        assert_eq!(ParamValue::from_json(&json!(true)), Some(ParamValue::Bool(true)));
        assert_eq!(ParamValue::from_json(&json!(3)), Some(ParamValue::Int(3)));
        assert_eq!(ParamValue::from_json(&json!(2.5)), Some(ParamValue::Float(2.5)));
        assert_eq!(
            ParamValue::from_json(&json!([1, 2.5])),
            Some(ParamValue::Vector(vec![1.0, 2.5]))
        );
        assert_eq!(
            ParamValue::from_json(&json!([1, 2])),
            Some(ParamValue::IntVector(vec![1, 2]))
        );
        assert_eq!(
            ParamValue::from_json(&json!("rk4")),
            Some(ParamValue::Text("rk4".to_string()))
        );
        assert_eq!(ParamValue::from_json(&json!(null)), Some(ParamValue::Null));
        assert_eq!(ParamValue::from_json(&json!({"a": 1})), None);
    }

    #[test]
    fn test_wire_param_decode_keeps_params_order() {
        let wire: WireParam = serde_json::from_value(json!({
            "id": 10, "name": "opt", "val": null, "hidden": [],
            "params": {
                "enabled": {"id": 11, "name": ".enabled", "val": true},
                "enabled_value": {"id": 12, "name": ".enabled_value", "val": 5, "min": 0, "max": 10, "log_scale": false}
            }
        }))
        .expect("valid definition");

        let names: Vec<&str> = wire
            .params
            .as_ref()
            .expect("has params")
            .values()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec![".enabled", ".enabled_value"]);
        assert_eq!(wire.params.as_ref().expect("has params")["enabled_value"].max, Some(Bound::Scalar(10.0)));
    }

    #[test]
    fn test_wire_param_null_max_is_absent() {
        let wire: WireParam =
            serde_json::from_value(json!({"id": 1, "name": "x", "val": "a", "max": null}))
                .expect("valid definition");
        assert!(wire.max.is_none());
    }

    #[test]
    fn test_enum_selected_index() {
        let e = EnumParam {
            val: ParamValue::Text("b".into()),
            oneof: vec![ParamValue::Text("a".into()), ParamValue::Text("b".into())],
        };
        assert_eq!(e.selected(), Some(1));

        let missing = EnumParam {
            val: ParamValue::Text("z".into()),
            oneof: e.oneof.clone(),
        };
        assert_eq!(missing.selected(), None);
    }

    #[test]
    fn test_integer_values_stay_integers() {
        let mut n = NumericParam {
            val: 7.0,
            min: 0.0,
            max: 10.0,
            log_scale: false,
            step: Some(1.0),
            integral: true,
        };
        assert_eq!(n.wire_value(), ParamValue::Int(7));
        n.val = 7.5;
        assert_eq!(n.wire_value(), ParamValue::Float(7.5));
        n.val = 7.0;
        n.integral = false;
        assert_eq!(n.wire_value(), ParamValue::Float(7.0));

        let v = VectorParam {
            val: vec![1.0, 4.0],
            min: vec![0.0; 2],
            max: vec![5.0; 2],
            log_scale: false,
            step: None,
            integral: true,
        };
        assert_eq!(v.wire_value(), ParamValue::IntVector(vec![1, 4]));
        assert_eq!(v.component(1).expect("in range").wire_value(), ParamValue::Int(4));
    }

    #[test]
    fn test_param_id_display() {
        assert_eq!(ParamId(42).to_string(), "#42");
    }
}
