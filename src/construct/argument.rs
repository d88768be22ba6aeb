use std::fmt;

use crate::model::value::Value;

/// How the host coerces a raw value before it reaches a construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentKind {
    /// Scalars and null only. Lists and objects are rejected, never expanded.
    Atomic,
    List,
    Object,
    Any,
}

impl ArgumentKind {
    pub fn admits(&self, value: &Value) -> bool {
        match self {
            ArgumentKind::Atomic => value.is_atomic(),
            ArgumentKind::List => matches!(value, Value::List(_)),
            ArgumentKind::Object => matches!(value, Value::Object(_)),
            ArgumentKind::Any => true,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ArgumentKind::Atomic => "an atomic",
            ArgumentKind::List => "a list",
            ArgumentKind::Object => "an object",
            ArgumentKind::Any => "any",
        }
    }
}

impl fmt::Display for ArgumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A declared construct argument. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    name: String,
    default: Option<Value>,
    kind: ArgumentKind,
}

impl Argument {
    /// A required argument.
    pub fn new(name: impl Into<String>, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            default: None,
            kind,
        }
    }

    /// An optional argument that falls back to `default` when omitted.
    pub fn with_default(name: impl Into<String>, default: Value, kind: ArgumentKind) -> Self {
        Self {
            name: name.into(),
            default: Some(default),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn kind(&self) -> ArgumentKind {
        self.kind
    }
}
