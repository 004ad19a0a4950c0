//! Numeric-or-sentinel result value.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wire label used for [`Value::Undefined`].
pub const UNDEFINED_LABEL: &str = "NaN";

/// A task or expression result.
///
/// `Undefined` is produced by division by zero. It is a normal value, not an
/// error: it travels through the result path like any number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireValue", into = "WireValue")]
pub enum Value {
    Number(f64),
    Undefined,
}

impl Value {
    /// Wrap a raw float; non-finite values collapse to `Undefined`.
    pub fn from_f64(n: f64) -> Self {
        if n.is_finite() {
            Self::Number(n)
        } else {
            Self::Undefined
        }
    }

}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::from_f64(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Undefined => f.write_str(UNDEFINED_LABEL),
        }
    }
}

/// JSON shape: a number, a label string for the sentinel, or an explicit `null`.
/// An absent field is not a `WireValue` and fails to deserialize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WireValue {
    Number(f64),
    Label(String),
    Null,
}

impl TryFrom<WireValue> for Value {
    type Error = String;

    fn try_from(wire: WireValue) -> Result<Self, Self::Error> {
        match wire {
            WireValue::Null => Ok(Self::Undefined),
            WireValue::Number(n) => Ok(Self::from_f64(n)),
            WireValue::Label(label) => {
                if label.eq_ignore_ascii_case(UNDEFINED_LABEL)
                    || label.eq_ignore_ascii_case("undefined")
                {
                    Ok(Self::Undefined)
                } else {
                    Err(format!("unrecognized result value: {label}"))
                }
            }
        }
    }
}

impl From<Value> for WireValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Number(n) => Self::Number(n),
            Value::Undefined => Self::Label(UNDEFINED_LABEL.to_string()),
        }
    }
}
