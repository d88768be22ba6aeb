use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use construct_guide::app::{App, parse_argument, render_result};
use construct_guide::model::config::AppConfig;
use construct_guide::msg::Msg;

fn main() -> Result<ExitCode> {
    let config = AppConfig::load()?;

    // Held until exit so buffered log lines are flushed.
    let _guard = init_logging(&config)?;

    tracing::info!(robot = %config.general.robot, "guide starting");

    let mut app = App::new(config);
    for note in app.drain_notifications() {
        eprintln!("{note}");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Some((name, rest)) = args.split_first() {
        let values = rest.iter().map(|arg| parse_argument(arg)).collect();
        let result = app.invoke(name, values);
        let code = if result.is_ok() {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        };
        println!("{}", render_result(result));
        return Ok(code);
    }

    run(&mut app)?;
    Ok(ExitCode::SUCCESS)
}

fn init_logging(config: &AppConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.filter));

    let Some(log_dir) = config.log_directory() else {
        tracing_subscriber::fmt()
            .with_writer(io::stderr)
            .with_env_filter(filter)
            .init();
        return Ok(None);
    };

    std::fs::create_dir_all(&log_dir)?;
    let file_appender = tracing_appender::rolling::daily(&log_dir, &config.logging.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_env_filter(filter)
        .init();

    Ok(Some(guard))
}

fn run(app: &mut App) -> Result<()> {
    let (tx, rx) = mpsc::channel::<Msg>();

    // Input thread — reads stdin lines and forwards as Msg
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let msg = match line {
                Ok(line) => Msg::Input(line),
                Err(err) => {
                    tracing::warn!("stdin read failed: {err}");
                    break;
                }
            };
            if tx.send(msg).is_err() {
                return;
            }
        }
        let _ = tx.send(Msg::Eof);
    });

    let mut stdout = io::stdout();
    loop {
        let msg = rx.recv()?;
        app.update(msg);

        for note in app.drain_notifications() {
            writeln!(stdout, "{note}")?;
        }
        stdout.flush()?;

        if app.should_quit {
            break;
        }
    }

    tracing::info!("guide stopped");
    Ok(())
}
