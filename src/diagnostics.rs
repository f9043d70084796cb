use tracing::debug;

/// Receives one human readable line per produced bullet.
pub trait DiagnosticSink {
    fn debug(&self, line: &str);
}

/// Forwards bullet lines to the `tracing` subscriber at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn debug(&self, line: &str) {
        debug!(target: "phantom_ammo::bullet", "{}", line);
    }
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str),
{
    fn debug(&self, line: &str) {
        self(line)
    }
}

/// Flattens a bullet to a single line: every CRLF and LF becomes `", "`.
pub fn single_line(bullet: &str) -> String {
    bullet.replace("\r\n", ", ").replace('\n', ", ")
}
