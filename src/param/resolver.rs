//! Type resolver: decides which variant a wire definition is.
//!
//! The wire format carries no discriminant, so the variant is inferred from
//! which fields are present. Fields are not mutually exclusive, so the checks
//! run in a fixed priority order and the first match wins:
//!
//! 1. `params` present - hyperparameter
//! 2. `oneof` present - enum
//! 3. `max` present - vector if `val` is a sequence, numeric otherwise
//! 4. `val` is a boolean - bool
//! 5. `val` is a string - string
//!
//! Anything else is [`TunerError::UnresolvableParameterKind`].
//!
//! Resolution is recursive for hyperparameters. A child that does not resolve
//! does not fail its parent: it becomes [`ParamKind::Unresolved`] so the rest of
//! the tree still loads and the editor tree can show a placeholder for it.

use serde_json::Value;

use super::{
    Bound, EnumParam, HyperParam, NumericParam, Param, ParamKind, ParamValue, VectorParam,
    WireParam,
};
use crate::error::TunerError;

/// Resolve a wire definition into its typed form.
///
/// # Errors
///
/// Returns [`TunerError::UnresolvableParameterKind`] when no variant matches
/// the top-level definition. Nested failures are folded into
/// [`ParamKind::Unresolved`] children instead.
pub fn resolve(wire: &WireParam) -> Result<Param, TunerError> {
    let kind = resolve_kind(wire).map_err(|reason| TunerError::UnresolvableParameterKind {
        reason,
        definition: Box::new(wire.clone()),
    })?;

    Ok(Param {
        id: wire.id,
        name: wire.name.clone(),
        kind,
    })
}

/// Resolve a definition, folding failure into an `Unresolved` parameter.
///
/// Used where one bad definition must not abort loading its siblings.
pub fn resolve_lenient(wire: &WireParam) -> Param {
    match resolve(wire) {
        Ok(param) => param,
        Err(e) => {
            log::warn!("[Resolver] {}", e);
            unresolved(wire, &e)
        }
    }
}

/// Placeholder parameter carrying a resolution failure.
pub fn unresolved(wire: &WireParam, error: &TunerError) -> Param {
    Param {
        id: wire.id,
        name: wire.name.clone(),
        kind: ParamKind::Unresolved {
            reason: error.to_string(),
            definition: Box::new(wire.clone()),
        },
    }
}

fn resolve_kind(wire: &WireParam) -> Result<ParamKind, String> {
    if let Some(params) = &wire.params {
        let params = params
            .iter()
            .map(|(attr, child)| (attr.clone(), resolve_lenient(child)))
            .collect();
        return Ok(ParamKind::Hyper(HyperParam {
            params,
            hidden: wire.hidden.clone().unwrap_or_default(),
        }));
    }

    if let Some(oneof) = &wire.oneof {
        let oneof = oneof
            .iter()
            .map(|option| {
                ParamValue::from_json(option)
                    .ok_or_else(|| format!("enum option {option} is not a parameter value"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let val = ParamValue::from_json(&wire.val)
            .ok_or_else(|| format!("enum value {} is not a parameter value", wire.val))?;
        return Ok(ParamKind::Enum(EnumParam { val, oneof }));
    }

    if let Some(max) = &wire.max {
        return match &wire.val {
            Value::Array(items) => resolve_vector(wire, items, max).map(ParamKind::Vector),
            _ => resolve_numeric(wire, max).map(ParamKind::Numeric),
        };
    }

    match &wire.val {
        Value::Bool(b) => Ok(ParamKind::Bool(*b)),
        Value::String(s) => Ok(ParamKind::Text(s.clone())),
        other => Err(format!("no editor for value {other}")),
    }
}

fn resolve_numeric(wire: &WireParam, max: &Bound) -> Result<NumericParam, String> {
    // A boolean under `max` still takes the numeric path; it reads as 0/1.
    let (val, integral) = match &wire.val {
        Value::Number(n) => (n.as_f64().ok_or("numeric value out of range")?, is_integer(n)),
        Value::Bool(b) => (f64::from(u8::from(*b)), true),
        other => return Err(format!("numeric value expected, got {other}")),
    };
    let Bound::Scalar(max) = max else {
        return Err("scalar parameter with per-index max".to_string());
    };
    let min = match &wire.min {
        Some(Bound::Scalar(min)) => *min,
        None => 0.0,
        Some(Bound::Vector(_)) => return Err("scalar parameter with per-index min".to_string()),
    };

    Ok(NumericParam {
        val,
        min,
        max: *max,
        log_scale: wire.log_scale.unwrap_or(false),
        step: wire.step,
        integral,
    })
}

fn is_integer(n: &serde_json::Number) -> bool {
    n.is_i64() || n.is_u64()
}

fn resolve_vector(wire: &WireParam, items: &[Value], max: &Bound) -> Result<VectorParam, String> {
    let val = items
        .iter()
        .map(|item| item.as_f64().ok_or_else(|| format!("vector element {item} is not a number")))
        .collect::<Result<Vec<_>, _>>()?;
    let integral = items
        .iter()
        .all(|item| matches!(item, Value::Number(n) if is_integer(n)));
    let len = val.len();
    let max = broadcast(max, len).ok_or("max length differs from value length")?;
    let min = match &wire.min {
        Some(bound) => broadcast(bound, len).ok_or("min length differs from value length")?,
        None => vec![0.0; len],
    };

    Ok(VectorParam {
        val,
        min,
        max,
        log_scale: wire.log_scale.unwrap_or(false),
        step: wire.step,
        integral,
    })
}

/// Expand a bound to `len` entries; `None` if a per-index bound has the wrong length.
fn broadcast(bound: &Bound, len: usize) -> Option<Vec<f64>> {
    match bound {
        Bound::Scalar(x) => Some(vec![*x; len]),
        Bound::Vector(v) if v.len() == len => Some(v.clone()),
        Bound::Vector(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(value: serde_json::Value) -> WireParam {
        serde_json::from_value(value).expect("valid wire definition")
    }

    #[test]
    fn test_params_wins_over_oneof() {
        let w = wire(json!({
            "id": 1, "name": "h", "val": null, "oneof": [1, 2],
            "params": {}, "hidden": []
        }));
        let param = resolve(&w).expect("resolves");
        assert!(matches!(param.kind, ParamKind::Hyper(_)));
    }

    #[test]
    fn test_oneof_wins_over_max() {
        let w = wire(json!({"id": 1, "name": "e", "val": 2, "oneof": [1, 2], "max": 3}));
        let param = resolve(&w).expect("resolves");
        let ParamKind::Enum(e) = param.kind else {
            panic!("expected enum, got {:?}", param.kind);
        };
        assert_eq!(e.selected(), Some(1));
    }

    #[test]
    fn test_max_with_boolean_val_is_numeric() {
        let w = wire(json!({"id": 1, "name": "b", "val": true, "min": 0, "max": 1}));
        let param = resolve(&w).expect("resolves");
        let ParamKind::Numeric(n) = param.kind else {
            panic!("expected numeric, got {:?}", param.kind);
        };
        assert_eq!(n.val, 1.0);
    }

    #[test]
    fn test_max_with_sequence_val_is_vector() {
        let w = wire(json!({
            "id": 1, "name": "v", "val": [1, 2, 3],
            "min": [0, 0, 0], "max": [5, 5, 5], "log_scale": false
        }));
        let param = resolve(&w).expect("resolves");
        let ParamKind::Vector(v) = param.kind else {
            panic!("expected vector, got {:?}", param.kind);
        };
        assert_eq!(v.val, vec![1.0, 2.0, 3.0]);
        assert_eq!(v.max, vec![5.0, 5.0, 5.0]);
    }

    #[test]
    fn test_integer_values_are_marked_integral() {
        let int = resolve(&wire(json!({"id": 1, "name": "n", "val": 5, "max": 10, "step": 1})))
            .expect("resolves");
        assert_eq!(int.value(), ParamValue::Int(5));

        let float = resolve(&wire(json!({"id": 2, "name": "x", "val": 5.0, "max": 10})))
            .expect("resolves");
        assert_eq!(float.value(), ParamValue::Float(5.0));

        let mixed = resolve(&wire(json!({"id": 3, "name": "v", "val": [1, 2.5], "max": 10})))
            .expect("resolves");
        assert_eq!(mixed.value(), ParamValue::Vector(vec![1.0, 2.5]));

        let ints = resolve(&wire(json!({"id": 4, "name": "v", "val": [1, 2], "max": 10})))
            .expect("resolves");
        assert_eq!(ints.value(), ParamValue::IntVector(vec![1, 2]));
    }

    #[test]
    fn test_vector_scalar_bounds_broadcast() {
        let w = wire(json!({"id": 1, "name": "v", "val": [1, 2], "min": 0, "max": 10}));
        let ParamKind::Vector(v) = resolve(&w).expect("resolves").kind else {
            panic!("expected vector");
        };
        assert_eq!(v.min, vec![0.0, 0.0]);
        assert_eq!(v.max, vec![10.0, 10.0]);
    }

    #[test]
    fn test_vector_length_mismatch_is_unresolvable() {
        let w = wire(json!({"id": 1, "name": "v", "val": [1, 2], "min": [0], "max": [5, 5]}));
        let err = resolve(&w).expect_err("mismatched lengths");
        assert!(matches!(err, TunerError::UnresolvableParameterKind { .. }));
    }

    #[test]
    fn test_plain_bool_and_string() {
        let b = resolve(&wire(json!({"id": 1, "name": "on", "val": false}))).expect("resolves");
        assert_eq!(b.kind, ParamKind::Bool(false));

        let s = resolve(&wire(json!({"id": 2, "name": "label", "val": "abc"}))).expect("resolves");
        assert_eq!(s.kind, ParamKind::Text("abc".to_string()));
    }

    #[test]
    fn test_bare_number_without_max_is_unresolvable() {
        let w = wire(json!({"id": 7, "name": "n", "val": 3}));
        let err = resolve(&w).expect_err("no matching variant");
        let TunerError::UnresolvableParameterKind { definition, .. } = err else {
            panic!("wrong error variant");
        };
        assert_eq!(definition.id.0, 7);
    }

    #[test]
    fn test_unresolvable_child_does_not_fail_parent() {
        let w = wire(json!({
            "id": 1, "name": "h", "val": null, "hidden": [],
            "params": {
                "ok": {"id": 2, "name": "ok", "val": true},
                "bad": {"id": 3, "name": "bad", "val": 3}
            }
        }));
        let param = resolve(&w).expect("parent resolves");
        let ParamKind::Hyper(h) = param.kind else {
            panic!("expected hyper");
        };
        assert_eq!(h.params["ok"].kind, ParamKind::Bool(true));
        assert!(matches!(h.params["bad"].kind, ParamKind::Unresolved { .. }));
    }

    #[test]
    fn test_resolve_lenient_keeps_id_and_name() {
        let w = wire(json!({"id": 9, "name": "odd", "val": {"nested": 1}}));
        let param = resolve_lenient(&w);
        assert_eq!(param.id.0, 9);
        assert_eq!(param.name, "odd");
        assert_eq!(param.kind.label(), "unresolved");
    }
}
