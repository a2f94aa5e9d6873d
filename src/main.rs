use chatwire::client::AssistantClient;
use chatwire::config::ClientConfig;
use chatwire::logging::init_logging;
use chatwire::models::{Message, MessageRole};
use chatwire::session::{ChatSession, SessionUpdate};

use color_eyre::Result;
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Clear the current terminal line before redrawing it
const CLEAR_LINE: &str = "\r\x1b[2K";

fn main() -> Result<()> {
    if std::env::args().any(|arg| arg == "--version") {
        println!("chatwire {}", VERSION);
        return Ok(());
    }

    color_eyre::install()?;
    init_logging();

    let config = ClientConfig::from_env()?;
    tracing::debug!(base_url = %config.base_url, "Starting");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(config))
}

async fn run(config: ClientConfig) -> Result<()> {
    let client = AssistantClient::new(config)?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut session = ChatSession::new(client).with_updates(tx);

    println!("chatwire {} - /clear, /status, /quit", VERSION);
    session.check_status().await;
    render_pending(&mut rx);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match line.trim() {
            "/quit" => break,
            "/status" => {
                session.check_status().await;
            }
            "/clear" => {
                if let Err(e) = session.clear().await {
                    eprintln!("Could not clear history: {}", e);
                }
            }
            _ => {
                let cancel = CancellationToken::new();
                let turn = session.send_with_cancel(&line, cancel.clone());
                tokio::pin!(turn);

                let result = loop {
                    tokio::select! {
                        result = &mut turn => break result,
                        Some(update) = rx.recv() => render(&update),
                        _ = tokio::signal::ctrl_c() => cancel.cancel(),
                    }
                };
                if let Err(rejected) = result {
                    eprintln!("Not sent: {}", rejected);
                }
            }
        }
        render_pending(&mut rx);
    }

    println!();
    Ok(())
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn render_pending(rx: &mut mpsc::UnboundedReceiver<SessionUpdate>) {
    while let Ok(update) = rx.try_recv() {
        render(&update);
    }
}

fn render(update: &SessionUpdate) {
    let mut out = std::io::stdout();
    match update {
        SessionUpdate::LiveBuffer(buffer) => {
            let tail = buffer.lines().last().unwrap_or_default();
            let _ = write!(out, "{}{}", CLEAR_LINE, tail);
        }
        SessionUpdate::MessageAppended(message) => {
            // The user already sees what they typed
            if message.role() == MessageRole::Assistant {
                let _ = writeln!(out, "{}{}", CLEAR_LINE, format_message(message));
            }
        }
        SessionUpdate::Busy(_) => {}
        SessionUpdate::Connection(connected) => {
            let indicator = if *connected { "● connected" } else { "○ disconnected" };
            let _ = writeln!(out, "{}", indicator);
        }
        SessionUpdate::Cleared => {
            let _ = writeln!(out, "History cleared.");
        }
    }
    let _ = out.flush();
}

fn format_message(message: &Message) -> String {
    let time = message
        .created_at()
        .with_timezone(&chrono::Local)
        .format("%H:%M:%S");
    format!("[{}] {}", time, message.content())
}
