//! ffmpeg-specific pieces: the worker command line and the parser for its
//! diagnostic output.

mod args;
pub mod progress;

pub use args::{FfmpegCommandBuilder, FfmpegLauncher};
pub use progress::{ParsedUpdate, parse_line};
