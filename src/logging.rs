use std::fs;
use std::path::Path;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Console logging plus daily-rotated JSON log files under `dir`.
/// `RUST_LOG` overrides the default `newsroom=info` filter.
pub fn init_logging(dir: &str) {
    let dir = Path::new(dir);
    let _ = fs::create_dir_all(dir);

    let file_appender = tracing_appender::rolling::daily(dir, "newsroom.log");
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::from_default_env().add_directive("newsroom=info".parse().unwrap());

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_writer(std::io::stdout))
        .init();

    // The writer guard flushes buffered lines when dropped; the subscriber
    // lives for the whole process, so the guard must too.
    std::mem::forget(guard);
}
