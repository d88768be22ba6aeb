use std::collections::VecDeque;
use std::sync::Arc;

use crate::construct::{ConstructContext, LogSink, TracingSink};
use crate::model::config::AppConfig;
use crate::model::value::Value;
use crate::msg::Msg;
use crate::plugin::PluginManager;

pub struct App {
    pub config: AppConfig,
    pub plugin_manager: PluginManager,
    pub should_quit: bool,
    pub notifications: VecDeque<String>,
    logger: Arc<dyn LogSink>,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let logger = Arc::new(TracingSink::new(config.general.robot.clone()));
        Self::with_logger(config, logger)
    }

    pub fn with_logger(config: AppConfig, logger: Arc<dyn LogSink>) -> Self {
        let plugin_manager = PluginManager::new(&config);
        let notifications = VecDeque::from(plugin_manager.error_notifications());

        Self {
            config,
            plugin_manager,
            should_quit: false,
            notifications,
            logger,
        }
    }

    pub fn update(&mut self, msg: Msg) {
        match msg {
            Msg::Input(line) => {
                let notes = self.handle_command(&line);
                self.notifications.extend(notes);
            }
            Msg::Eof => self.should_quit = true,
        }
    }

    pub fn drain_notifications(&mut self) -> Vec<String> {
        self.notifications.drain(..).collect()
    }

    /// Run one construct against a fresh context.
    pub fn invoke(&self, name: &str, values: Vec<Value>) -> Result<Value, String> {
        let context = ConstructContext::new(&self.config.general.robot, self.logger.as_ref());
        self.plugin_manager
            .invoke(name, values, &context)
            .map_err(|err| err.to_string())
    }

    fn handle_command(&mut self, line: &str) -> Vec<String> {
        let command = line.trim();
        match command {
            "" => Vec::new(),
            "quit" | "q" => {
                self.should_quit = true;
                Vec::new()
            }
            "help" | "?" => {
                let mut notes = vec!["commands:".to_string()];
                notes.push("  <construct> [value ...]".to_string());
                notes.push(
                    "    examples: greet | greet Alice | Guide.greet \"Ada Lovelace\"".to_string(),
                );
                notes.push("  constructs".to_string());
                notes.push("  plugins (alias: pl)".to_string());
                notes.push("  plugins.list (alias: pl.list)".to_string());
                notes.push("  plugins.errors (alias: pl.errors)".to_string());
                notes.push("  plugins.reload (alias: pl.reload)".to_string());
                notes.push("  quit (alias: q)".to_string());
                notes
            }
            "constructs" => self.plugin_manager.construct_notifications(),
            "plugins" | "pl" => vec![self.plugin_manager.summary_notification()],
            "plugins.list" | "pl.list" => self.plugin_manager.list_notifications(),
            "plugins.errors" | "pl.errors" => {
                let errors = self.plugin_manager.error_notifications();
                if errors.is_empty() {
                    vec!["plugins: no errors".to_string()]
                } else {
                    errors
                }
            }
            "plugins.reload" | "pl.reload" => {
                self.plugin_manager = PluginManager::new(&self.config);
                let mut notes = vec!["plugins: reloaded".to_string()];
                notes.push(self.plugin_manager.summary_notification());
                notes.extend(self.plugin_manager.error_notifications());
                notes
            }
            _ => match parse_invocation(command) {
                Ok((name, values)) => vec![render_result(self.invoke(&name, values))],
                Err(err) => vec![format!("error: {err}")],
            },
        }
    }
}

pub fn render_result(result: Result<Value, String>) -> String {
    match result {
        Ok(value) => format!("=> {value}"),
        Err(err) => format!("error: {err}"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    text: String,
    quoted: bool,
}

/// Split `name arg ...` and turn each argument into a value.
pub fn parse_invocation(raw: &str) -> Result<(String, Vec<Value>), String> {
    let mut tokens = tokenize(raw)?.into_iter();
    let Some(name) = tokens.next() else {
        return Err("missing construct name".to_string());
    };
    if name.quoted {
        return Err("construct name cannot be quoted".to_string());
    }

    let values = tokens
        .map(|token| {
            if token.quoted {
                Value::Text(token.text)
            } else {
                parse_argument(&token.text)
            }
        })
        .collect();

    Ok((name.text, values))
}

/// JSON literals become typed values; anything else is plain text.
pub fn parse_argument(raw: &str) -> Value {
    serde_json::from_str::<Value>(raw).unwrap_or_else(|_| Value::Text(raw.to_string()))
}

fn tokenize(input: &str) -> Result<Vec<Token>, String> {
    let mut tokens = Vec::new();
    let mut chars = input.trim().chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        if ch == '"' || ch == '\'' {
            let quote = ch;
            chars.next();
            let mut out = String::new();
            let mut escaped = false;
            let mut closed = false;

            for ch in chars.by_ref() {
                if escaped {
                    out.push(ch);
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == quote {
                    closed = true;
                    break;
                } else {
                    out.push(ch);
                }
            }

            if !closed {
                return Err("unterminated quote".to_string());
            }

            tokens.push(Token {
                text: out,
                quoted: true,
            });
            continue;
        }

        // Bare token; brackets and the strings inside them keep it together.
        let mut out = String::new();
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        while let Some(&ch) = chars.peek() {
            if depth == 0 && ch.is_whitespace() {
                break;
            }
            chars.next();
            out.push(ch);

            if in_string {
                if escaped {
                    escaped = false;
                } else if ch == '\\' {
                    escaped = true;
                } else if ch == '"' {
                    in_string = false;
                }
                continue;
            }

            match ch {
                '"' if depth > 0 => in_string = true,
                '[' | '{' => depth += 1,
                ']' | '}' => depth = depth.saturating_sub(1),
                _ => {}
            }
        }

        tokens.push(Token {
            text: out,
            quoted: false,
        });
    }

    Ok(tokens)
}
