use smallvec::SmallVec;

use crate::construct::argument::Argument;
use crate::construct::error::{CoercionError, ConstructError};
use crate::model::value::Value;

type Body<'ctx> = Box<dyn Fn(&[Value]) -> Result<Value, ConstructError> + 'ctx>;

/// A construct body bound to its declared arguments for one invocation.
pub struct Processor<'ctx> {
    arguments: Vec<Argument>,
    body: Body<'ctx>,
}

impl<'ctx> Processor<'ctx> {
    pub fn new(
        arguments: Vec<Argument>,
        body: impl Fn(&[Value]) -> Result<Value, ConstructError> + 'ctx,
    ) -> Self {
        Self {
            arguments,
            body: Box::new(body),
        }
    }

    pub fn unary(
        argument: Argument,
        body: impl Fn(&Value) -> Result<Value, ConstructError> + 'ctx,
    ) -> Self {
        Self::new(vec![argument], move |values| body(&values[0]))
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    /// Bind positional values to the declared arguments, then run the body.
    pub fn process(&self, values: Vec<Value>) -> Result<Value, ConstructError> {
        if values.len() > self.arguments.len() {
            return Err(ConstructError::TooManyArguments {
                expected: self.arguments.len(),
                found: values.len(),
            });
        }

        let mut supplied = values.into_iter();
        let mut bound: SmallVec<[Value; 4]> = SmallVec::with_capacity(self.arguments.len());

        for argument in &self.arguments {
            let value = match supplied.next() {
                Some(value) => value,
                None => argument
                    .default()
                    .cloned()
                    .ok_or_else(|| ConstructError::MissingArgument {
                        argument: argument.name().to_string(),
                    })?,
            };

            if !argument.kind().admits(&value) {
                return Err(CoercionError::Mismatch {
                    argument: argument.name().to_string(),
                    expected: argument.kind(),
                    found: value.kind(),
                }
                .into());
            }

            bound.push(value);
        }

        (self.body)(&bound)
    }
}

impl std::fmt::Debug for Processor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Processor")
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}
