use std::fmt;

use tracing::Level;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::EnvFilter;

/// Local time rendered with a strftime pattern such as `%H:%M:%S`.
#[derive(Debug, Clone)]
pub struct LocalTime {
    format: String,
}

impl LocalTime {
    pub fn new(format: impl Into<String>) -> LocalTime {
        LocalTime { format: format.into() }
    }
}

impl FormatTime for LocalTime {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{}", chrono::Local::now().format(&self.format))
    }
}

/// Installs the global stderr subscriber. `RUST_LOG` wins over `level`.
///
/// Returns false when a subscriber was already installed.
pub fn init(level: Level, date_fmt: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_ascii_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::new(date_fmt))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
