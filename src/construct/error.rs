use thiserror::Error;

use crate::construct::argument::ArgumentKind;
use crate::model::value::ValueKind;

/// Raised by the host value layer when a value has no form the caller asked for.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("cannot convert a {found} to a string")]
    NotScalar { found: ValueKind },
    #[error("argument '{argument}' expects {expected} value, got {found}")]
    Mismatch {
        argument: String,
        expected: ArgumentKind,
        found: ValueKind,
    },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConstructError {
    #[error(transparent)]
    Coercion(#[from] CoercionError),
    #[error("expected at most {expected} arguments, got {found}")]
    TooManyArguments { expected: usize, found: usize },
    #[error("missing value for argument '{argument}'")]
    MissingArgument { argument: String },
}
