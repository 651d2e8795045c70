use clap::Parser;

use crate::config::Backend;

#[derive(Parser, Debug)]
#[command(name = "listkit-server", about = "Allow-list and poll actions for Discord", version)]
pub struct Args {
    /// Path to the TOML config file. A missing file means built-in defaults.
    #[arg(short, long, default_value = "listkit.toml")]
    pub config: String,

    /// Override the configured service backend.
    #[arg(long, value_enum)]
    pub backend: Option<Backend>,
}
