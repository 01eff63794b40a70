use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "quorum-server", version, about = "Polling web service")]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config/quorum.toml")]
    pub config: String,

    /// Emit logs as JSON lines.
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server (the default).
    Serve,
    /// Sign a session token for a user id, as the identity provider would.
    MintToken {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        email: Option<String>,
    },
}
