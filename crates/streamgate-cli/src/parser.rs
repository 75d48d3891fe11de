//! Main CLI parser and top-level argument handling.

use std::path::PathBuf;

use clap::Parser;

/// Command-line interface definition for the stream relay.
#[derive(Debug, Parser)]
#[command(name = "streamgate")]
#[command(about = "Relay RTMP inputs to RTSP outputs through supervised ffmpeg workers")]
#[command(version)]
pub struct Cli {
    /// Streams file: a JSON array of {name, rtmp_input, rtsp_port}
    #[arg(long, env = "STREAMGATE_CONFIG", default_value = "streams.json")]
    pub config: PathBuf,

    /// Optional runtime settings file (JSON)
    #[arg(long, env = "STREAMGATE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Write a sample streams file to --config and exit
    #[arg(long)]
    pub create_config: bool,

    /// Address the HTTP API binds to
    #[arg(long, env = "STREAMGATE_HTTP_HOST", default_value = "0.0.0.0")]
    pub http_host: String,

    /// Port for the HTTP API
    #[arg(long, env = "STREAMGATE_HTTP_PORT", default_value_t = 5000)]
    pub http_port: u16,

    /// Run the streams without the HTTP API
    #[arg(long)]
    pub no_http: bool,

    /// Enable verbose/debug output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}
