use anyhow::Result;
use clap::Parser;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
}

#[derive(Parser, Debug)]
#[command(
    name = "loadsurge-server",
    about = "Controlled HTTP load generation service",
    long_about = "Drives concurrent HTTP load against a target endpoint under a configurable shape, \
with live metrics, threshold-based auto-stop, and post-run safety scoring.\n\n\
Environment variables with LOADSURGE_ prefix are supported. CLI arguments take \
precedence over environment variables."
)]
pub struct Args {
    #[arg(
        long,
        value_name = "HOST",
        help = "API host",
        default_value = "127.0.0.1",
        env = "LOADSURGE_HOST"
    )]
    pub host: String,
    #[arg(
        long,
        value_name = "PORT",
        help = "API port",
        default_value_t = 8080,
        env = "LOADSURGE_PORT"
    )]
    pub port: u16,
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "LOADSURGE_LOG_LEVEL"
    )]
    pub log_level: String,
}

impl Config {
    pub fn from_env_and_args() -> Result<Self> {
        // Clap handles the precedence: CLI arguments, then environment
        // variables, then defaults.
        let args = Args::parse();

        Ok(Config {
            host: args.host,
            port: args.port,
            log_level: args.log_level,
        })
    }
}
