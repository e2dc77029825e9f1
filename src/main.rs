mod devices;
mod session;

use session::LoggerConfig;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::fmt;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Keep the guard alive so buffered log lines are flushed on exit
    let _guard = setup_logging();
    info!("Starting application");

    let config = LoggerConfig::default();

    match session::start(config) {
        Ok(rows) => {
            info!("Session finished, {} rows logged", rows);
        }
        Err(e) => {
            error!("Logging failed: {}", e);
            return Err(Box::new(e));
        }
    }

    info!("Application shutting down");
    Ok(())
}

fn setup_logging() -> WorkerGuard {
    // Diagnostics go to a daily rotated file, stdout is left for readings
    let file_appender = rolling::daily("logs", "app.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_level(true)
        .init();

    guard
}
