pub mod argument;
pub mod context;
pub mod error;
pub mod processor;

pub use argument::{Argument, ArgumentKind};
pub use context::{ConstructContext, LogSink, MemorySink, NullSink, TracingSink};
pub use error::{CoercionError, ConstructError};
pub use processor::Processor;

/// A host-invocable operation contributed by a plugin package.
///
/// Implementations hold no per-call state: everything an invocation needs
/// arrives through the context and the bound argument values, so one
/// instance may be prepared from many threads at once.
pub trait Construct: Send + Sync {
    fn name(&self) -> &str;

    /// Bind this construct to one invocation context.
    fn prepare<'ctx>(&self, context: &'ctx ConstructContext<'ctx>) -> Processor<'ctx>;
}
