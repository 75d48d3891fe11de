//! ffmpeg command line construction.
//!
//! Every worker is a pure remux: codecs are copied, the RTSP transport is
//! forced to TCP, input buffering is disabled for low latency, and progress
//! is written to stderr where the diagnostic reader picks it up.

use std::path::PathBuf;

use streamgate_core::{OUTBOUND_SCHEME, StreamDefinition};
use tokio::process::Command;

use crate::process::WorkerLauncher;

/// Builder for a single ffmpeg relay invocation.
///
/// # Example
///
/// ```rust,ignore
/// let cmd = FfmpegCommandBuilder::new("ffmpeg", "rtmp://localhost/live/cam1")
///     .output("0.0.0.0", 8554, "cam1")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct FfmpegCommandBuilder {
    binary_path: PathBuf,
    source: String,
    output_url: Option<String>,
    additional_args: Vec<String>,
}

impl FfmpegCommandBuilder {
    pub fn new(binary_path: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            source: source.into(),
            output_url: None,
            additional_args: Vec::new(),
        }
    }

    /// Set the outbound endpoint the worker publishes to.
    #[must_use]
    pub fn output(mut self, host: &str, port: u16, path: &str) -> Self {
        self.output_url = Some(format!("{OUTBOUND_SCHEME}://{host}:{port}/{path}"));
        self
    }

    /// Append raw arguments before the output URL.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.additional_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Argument vector, without the program name.
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "-hide_banner",
            "-nostdin",
            "-loglevel",
            "info",
            // Low-latency input handling
            "-fflags",
            "nobuffer",
            "-flags",
            "low_delay",
            "-re",
            "-i",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        args.push(self.source.clone());

        // Passthrough: no re-encoding
        args.extend(["-c", "copy", "-f", "rtsp", "-rtsp_transport", "tcp"].map(String::from));

        // Machine-readable progress on the diagnostic stream
        args.extend(["-stats_period", "1", "-progress", "pipe:2"].map(String::from));

        args.extend(self.additional_args.iter().cloned());

        if let Some(url) = &self.output_url {
            args.extend(["-listen".to_string(), "1".to_string(), url.clone()]);
        }
        args
    }

    /// Build the command ready for spawning.
    pub fn build(&self) -> Command {
        let mut cmd = Command::new(&self.binary_path);
        cmd.args(self.to_args());
        cmd
    }
}

/// Launches ffmpeg relay workers.
#[derive(Debug, Clone)]
pub struct FfmpegLauncher {
    binary_path: PathBuf,
    bind_host: String,
}

impl FfmpegLauncher {
    pub fn new(binary_path: impl Into<PathBuf>, bind_host: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
            bind_host: bind_host.into(),
        }
    }

    fn builder(&self, definition: &StreamDefinition) -> FfmpegCommandBuilder {
        FfmpegCommandBuilder::new(&self.binary_path, &definition.source).output(
            &self.bind_host,
            definition.port,
            &definition.path,
        )
    }
}

impl WorkerLauncher for FfmpegLauncher {
    fn command(&self, definition: &StreamDefinition) -> Command {
        self.builder(definition).build()
    }

    fn describe(&self, definition: &StreamDefinition) -> String {
        let mut line = self.binary_path.display().to_string();
        for arg in self.builder(definition).to_args() {
            line.push(' ');
            line.push_str(&arg);
        }
        line
    }
}
