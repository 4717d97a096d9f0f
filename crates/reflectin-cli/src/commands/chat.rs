use std::io::Write;
use std::sync::Arc;

use clap::Args;
use reflectin_core::{ChatSessionController, Config, HttpChatBackend};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::terminal_gateway::TerminalGateway;

#[derive(Args)]
pub struct ChatArgs {
    /// Backend base URL (overrides backend.base_url)
    #[arg(long)]
    pub base_url: Option<String>,
    /// Print the session transcript as JSON when the chat ends
    #[arg(long)]
    pub json: bool,
}

/// Load config, applying a one-off backend URL override.
pub fn load_config(base_url: Option<String>) -> reflectin_core::error::Result<Config> {
    let mut config = Config::load()?;
    if let Some(url) = base_url {
        config.backend.base_url = url;
        config.validate()?;
    }
    Ok(config)
}

fn prompt() {
    let mut out = std::io::stdout().lock();
    let _ = write!(out, "you> ");
    let _ = out.flush();
}

/// Interactive chat over stdin. `/quit` or EOF ends the session.
pub async fn run(args: ChatArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(args.base_url)?;
    let backend = HttpChatBackend::new(&config.backend)?;
    let gateway = Arc::new(TerminalGateway::new());
    let (mut controller, mut events) =
        ChatSessionController::start(backend, gateway, &config.reminder);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if line.trim() == "/quit" {
                    break;
                }
                match controller.send_message(&line).await {
                    Ok(Some(reply)) => println!("bot> {}", reply.bot_reply),
                    Ok(None) => {}
                    Err(e) => eprintln!("error: {e}"),
                }
                prompt();
            }
            Some(event) = events.recv() => {
                debug!(?event, "reminder event");
                if controller.deliver_reminder(&event) {
                    prompt();
                }
            }
        }
    }

    let (transcript, _) = controller.end_session().await;
    debug!(messages = transcript.len(), "chat session ended");
    if args.json {
        println!("{}", serde_json::to_string_pretty(&transcript)?);
    }
    Ok(())
}
