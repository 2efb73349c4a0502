use clap::Parser;

use crate::codec::DEFAULT_MAX_FRAME_SIZE;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 6379;

/// Server settings. Every flag can also be given through the matching `MINIDIS_*` environment
/// variable.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "minidis-server", version, about)]
pub struct Config {
    /// The host to bind to
    #[arg(long, env = "MINIDIS_HOST", default_value = DEFAULT_HOST)]
    pub host: String,

    /// The port to listen on
    #[arg(short, long, env = "MINIDIS_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Maximum number of bytes buffered while waiting for a complete frame
    #[arg(long, env = "MINIDIS_MAX_FRAME_SIZE", default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    pub max_frame_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}
