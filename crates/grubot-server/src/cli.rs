use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "grubot-server", version, about = "Group chat bot for the Messenger Platform")]
pub struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Address to listen on, overriding the configuration.
    #[arg(long)]
    pub bind: Option<String>,
}
