use crate::construct::{
    Argument, ArgumentKind, Construct, ConstructContext, ConstructError, Processor,
};
use crate::model::value::{NULL, Value, from_value};

/// Writes a greeting to the robot log.
///
/// `greet()` logs `Hello World!`; `greet("Alice")` logs `Hello Alice!`.
/// Always returns null.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreetConstruct;

impl Construct for GreetConstruct {
    fn name(&self) -> &str {
        "greet"
    }

    fn prepare<'ctx>(&self, context: &'ctx ConstructContext<'ctx>) -> Processor<'ctx> {
        Processor::unary(
            Argument::with_default("name", from_value("World"), ArgumentKind::Atomic),
            move |name| process(context, name),
        )
    }
}

fn process(context: &ConstructContext<'_>, name: &Value) -> Result<Value, ConstructError> {
    let logger = context.root_logger();

    logger.info(&format!("Hello {}!", name.string_value()?));

    Ok(NULL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{CoercionError, MemorySink};
    use crate::model::value::ValueKind;
    use tracing::Level;

    fn greet(sink: &MemorySink, values: Vec<Value>) -> Result<Value, ConstructError> {
        let context = ConstructContext::new("test", sink);
        let processor = GreetConstruct.prepare(&context);
        processor.process(values)
    }

    #[test]
    fn greets_by_name() {
        let sink = MemorySink::new();
        let result = greet(&sink, vec![from_value("Alice")]).unwrap();
        assert_eq!(result, NULL);
        assert_eq!(sink.lines(), vec![(Level::INFO, "Hello Alice!".to_string())]);
    }

    #[test]
    fn omitted_name_defaults_to_world() {
        let sink = MemorySink::new();
        assert_eq!(greet(&sink, Vec::new()).unwrap(), NULL);
        assert_eq!(sink.messages(), vec!["Hello World!".to_string()]);

        let explicit = MemorySink::new();
        greet(&explicit, vec![from_value("World")]).unwrap();
        assert_eq!(sink.lines(), explicit.lines());
    }

    #[test]
    fn scalars_are_stringified() {
        for (value, expected) in [
            (from_value(42_i64), "Hello 42!"),
            (from_value(true), "Hello true!"),
            (NULL, "Hello null!"),
            (from_value(""), "Hello !"),
        ] {
            let sink = MemorySink::new();
            assert_eq!(greet(&sink, vec![value]).unwrap(), NULL);
            assert_eq!(sink.messages(), vec![expected.to_string()]);
        }
    }

    #[test]
    fn repeated_calls_do_not_accumulate() {
        let sink = MemorySink::new();
        greet(&sink, vec![from_value("Bob")]).unwrap();
        greet(&sink, vec![from_value("Bob")]).unwrap();
        assert_eq!(
            sink.messages(),
            vec!["Hello Bob!".to_string(), "Hello Bob!".to_string()]
        );
    }

    #[test]
    fn composite_name_fails_without_logging() {
        let sink = MemorySink::new();
        let err = greet(&sink, vec![from_value(vec![from_value("a")])]).unwrap_err();
        assert_eq!(
            err,
            ConstructError::Coercion(CoercionError::Mismatch {
                argument: "name".into(),
                expected: ArgumentKind::Atomic,
                found: ValueKind::List,
            })
        );
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn stringify_failure_reaches_caller_unchanged() {
        let sink = MemorySink::new();
        let context = ConstructContext::new("test", &sink);
        let err = process(&context, &from_value(Vec::<Value>::new())).unwrap_err();
        assert_eq!(
            err,
            ConstructError::Coercion(CoercionError::NotScalar {
                found: ValueKind::List
            })
        );
        assert!(sink.lines().is_empty());
    }

    #[test]
    fn declares_single_atomic_argument() {
        let sink = MemorySink::new();
        let context = ConstructContext::new("test", &sink);
        let processor = GreetConstruct.prepare(&context);
        assert_eq!(
            processor.arguments(),
            [Argument::with_default("name", from_value("World"), ArgumentKind::Atomic)]
        );
    }

    #[test]
    fn concurrent_invocations_each_log_once() {
        let sink = MemorySink::new();
        std::thread::scope(|scope| {
            for i in 0..8_i64 {
                let sink = &sink;
                scope.spawn(move || greet(sink, vec![from_value(i)]).unwrap());
            }
        });

        let mut messages = sink.messages();
        messages.sort();
        let mut expected: Vec<String> = (0..8).map(|i| format!("Hello {i}!")).collect();
        expected.sort();
        assert_eq!(messages, expected);
    }
}
