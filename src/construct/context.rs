use std::sync::Mutex;

use tracing::Level;

/// Host-owned log destination handed to constructs through their context.
pub trait LogSink: Send + Sync {
    fn log(&self, level: Level, message: &str);

    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }
}

/// Forwards robot log lines to the process-wide `tracing` subscriber.
#[derive(Debug, Clone)]
pub struct TracingSink {
    robot: String,
}

impl TracingSink {
    pub fn new(robot: impl Into<String>) -> Self {
        Self {
            robot: robot.into(),
        }
    }
}

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        let robot = self.robot.as_str();
        if level == Level::ERROR {
            tracing::error!(target: "robot", robot, "{message}");
        } else if level == Level::WARN {
            tracing::warn!(target: "robot", robot, "{message}");
        } else if level == Level::INFO {
            tracing::info!(target: "robot", robot, "{message}");
        } else if level == Level::DEBUG {
            tracing::debug!(target: "robot", robot, "{message}");
        } else {
            tracing::trace!(target: "robot", robot, "{message}");
        }
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<(Level, String)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(Level, String)> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn messages(&self) -> Vec<String> {
        self.lines().into_iter().map(|(_, message)| message).collect()
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        let mut lines = self
            .lines
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        lines.push((level, message.to_string()));
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl LogSink for NullSink {
    fn log(&self, _level: Level, _message: &str) {}
}

/// Per-invocation environment supplied by the host. Constructs borrow it for
/// the duration of one call.
#[derive(Clone, Copy)]
pub struct ConstructContext<'a> {
    robot: &'a str,
    logger: &'a dyn LogSink,
}

impl<'a> ConstructContext<'a> {
    pub fn new(robot: &'a str, logger: &'a dyn LogSink) -> Self {
        Self { robot, logger }
    }

    /// Id of the script this invocation runs in.
    pub fn robot(&self) -> &'a str {
        self.robot
    }

    pub fn root_logger(&self) -> &'a dyn LogSink {
        self.logger
    }
}

impl std::fmt::Debug for ConstructContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConstructContext")
            .field("robot", &self.robot)
            .finish_non_exhaustive()
    }
}
