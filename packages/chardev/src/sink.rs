//! Destinations for guest output.

use std::io::{self, Write};
use std::sync::Arc;

/// Where bytes written by the guest end up.
///
/// Implementations must be safe to call from several host threads at once;
/// the chardev does not serialize writes.
pub trait DiagnosticSink: Send + Sync {
    /// Attempt a single write, returning how many bytes were accepted.
    /// Short counts are passed back to the guest as-is.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;
}

impl<T: DiagnosticSink + ?Sized> DiagnosticSink for Arc<T> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }
}

/// The process's standard error stream
#[derive(Clone, Copy, Debug, Default)]
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().lock().write(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stderr_sink_accepts_bytes() {
        let n = StderrSink.write(b"").unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn test_arc_forwards() {
        let sink: Arc<dyn DiagnosticSink> = Arc::new(StderrSink);
        assert_eq!(sink.write(b"").unwrap(), 0);
    }
}
