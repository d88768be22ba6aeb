/// All possible messages that drive the harness loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// One line read from stdin.
    Input(String),
    /// Stdin closed.
    Eof,
}
