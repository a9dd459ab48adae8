//! CLI argument definitions and the `status` command.

use clap::{ArgAction, Parser, Subcommand};
use clap_complete::Shell;

use crate::state::AppState;

/// opchat -- web chat relay with a Telegram operator channel.
#[derive(Debug, Parser)]
#[command(name = "opchat", version, about = "Session-addressed web chat relay")]
pub struct Cli {
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the HTTP server and the Telegram update loop
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Show store statistics
    Status,

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Print session/message counts and channel configuration.
pub async fn status(state: &AppState, json: bool) -> anyhow::Result<()> {
    let sessions = state.chat_service.count_sessions().await?;
    let messages = state.chat_service.count_messages().await?;
    let relay_configured = state.relay.is_some();

    if json {
        let status = serde_json::json!({
            "sessions": sessions,
            "messages": messages,
            "operator_channel": relay_configured,
            "data_dir": state.data_dir.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!();
        println!(
            "  {} opchat status",
            console::style("\u{1F4AC}").bold()
        );
        println!();
        println!("  Sessions:  {}", console::style(sessions).cyan());
        println!("  Messages:  {}", console::style(messages).cyan());
        println!(
            "  Operator channel: {}",
            if relay_configured {
                console::style("configured").green()
            } else {
                console::style("not configured").yellow()
            }
        );
        println!("  Data dir:  {}", state.data_dir.display());
        println!();
    }

    Ok(())
}
