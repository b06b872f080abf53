//! Constant payloads carried by `LOAD_CONST`.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Tag identifying the payload type of a constant. The runtime's value
/// library keys its constructors off this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Number,
    String,
    Boolean,
    Null,
}

/// A constant embedded in the op-list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstValue {
    Number(f64),
    String(Arc<str>),
    Boolean(bool),
    Null,
}

impl ConstValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            ConstValue::Number(_) => ValueKind::Number,
            ConstValue::String(_) => ValueKind::String,
            ConstValue::Boolean(_) => ValueKind::Boolean,
            ConstValue::Null => ValueKind::Null,
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Number(value) => write!(f, "{value}"),
            ConstValue::String(value) => write!(f, "{value:?}"),
            ConstValue::Boolean(value) => write!(f, "{value}"),
            ConstValue::Null => f.write_str("null"),
        }
    }
}
