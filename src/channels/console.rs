//! Console transport
//!
//! Reads messages from stdin, one per line, and prints the replies. A line of
//! the form `chat_id: text` targets that chat; any other line goes to the
//! `console` chat. Handy for trying keyword tables and prompts locally.

use crate::bot::{Dispatcher, InboundMessage};
use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// Chat used for lines without an explicit `chat_id:` prefix.
pub const DEFAULT_CHAT_ID: &str = "console";

/// Split a console line into an inbound message. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Option<InboundMessage> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match line.split_once(':') {
        Some((chat_id, body)) if is_chat_id(chat_id) => {
            Some(InboundMessage::new(chat_id, body.trim()))
        }
        _ => Some(InboundMessage::new(DEFAULT_CHAT_ID, line)),
    }
}

/// Prefixes that look like an identifier rather than prose ("hola: ..." still
/// counts, "¿qué tal?: ..." does not).
fn is_chat_id(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '@' | '.' | '+'))
}

/// Run the REPL on stdin/stdout until EOF.
pub async fn run(dispatcher: Arc<Dispatcher>) -> Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_with(dispatcher, stdin, stdout).await
}

/// REPL over arbitrary streams.
pub async fn run_with<R, W>(dispatcher: Arc<Dispatcher>, input: R, mut output: W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let Some(msg) = parse_line(&line) else {
            continue;
        };

        let chat_id = msg.chat_id.clone();
        for reply in dispatcher.handle(msg).await {
            output
                .write_all(format!("[{chat_id}] {reply}\n").as_bytes())
                .await?;
        }
        output.flush().await?;
    }

    tracing::debug!("Console input closed");
    Ok(())
}
