//! Diagnostic stream reader (non-UTF8-safe).
//!
//! ffmpeg can emit non-UTF8 bytes on stderr, and its stats line is rewritten
//! in place with carriage returns instead of newlines. Lines are therefore
//! read as bytes, split on both `\n` and `\r`, and decoded lossily.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

/// Receiver for one worker's diagnostic lines.
#[async_trait]
pub trait DiagnosticSink: Send + Sync {
    /// Called for every non-empty line, in order.
    async fn line(&self, line: String);

    /// Called exactly once when the stream ends (EOF or read error).
    async fn closed(&self);
}

/// Spawn a task that feeds `stream` to `sink` line by line.
///
/// The returned handle completes after `sink.closed()` has run, so callers
/// can wait for the reader deterministically.
pub fn spawn_diagnostic_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    name: String,
    sink: Arc<dyn DiagnosticSink>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    for segment in buf.split(|b| *b == b'\n' || *b == b'\r') {
                        let line = String::from_utf8_lossy(segment);
                        let line = line.trim_end();
                        if line.trim().is_empty() {
                            continue;
                        }
                        debug!(stream = %name, "{}", line);
                        sink.line(line.to_string()).await;
                    }
                }
                Err(e) => {
                    debug!(stream = %name, error = %e, "diagnostic reader exiting due to read error");
                    break;
                }
            }
        }

        sink.closed().await;
        debug!(stream = %name, "diagnostic reader task exiting");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct Collect {
        lines: Mutex<Vec<String>>,
        closed: Mutex<u32>,
    }

    #[async_trait]
    impl DiagnosticSink for Collect {
        async fn line(&self, line: String) {
            self.lines.lock().await.push(line);
        }

        async fn closed(&self) {
            *self.closed.lock().await += 1;
        }
    }

    #[tokio::test]
    async fn test_splits_on_carriage_returns() {
        let input: &[u8] = b"Stream mapping:\r\nframe=1 fps=0\rframe=2 fps=25\r\n\nprogress=end\n";
        let sink = Arc::new(Collect::default());

        spawn_diagnostic_reader(input, "cam1".into(), sink.clone())
            .await
            .unwrap();

        let lines = sink.lines.lock().await.clone();
        assert_eq!(
            lines,
            vec!["Stream mapping:", "frame=1 fps=0", "frame=2 fps=25", "progress=end"]
        );
        assert_eq!(*sink.closed.lock().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_utf8_does_not_stop_reader() {
        let input: &[u8] = b"bad \xff\xfe bytes\nframe=3\n";
        let sink = Arc::new(Collect::default());

        spawn_diagnostic_reader(input, "cam1".into(), sink.clone())
            .await
            .unwrap();

        let lines = sink.lines.lock().await.clone();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "frame=3");
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let input: &[u8] = b"frame=9";
        let sink = Arc::new(Collect::default());

        spawn_diagnostic_reader(input, "cam1".into(), sink.clone())
            .await
            .unwrap();

        assert_eq!(sink.lines.lock().await.clone(), vec!["frame=9"]);
    }
}
