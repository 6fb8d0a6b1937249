//! CLI channel: stdin/stdout REPL for local testing.
//!
//! Every line is submitted to the same [`ModeRouter`] the REST API uses,
//! under a single local session. `/reset` starts over, `/quit` exits.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::intake::router::{ModeRouter, Reply};

/// Session id used for the local REPL.
pub const CLI_SESSION_ID: &str = "local-user";

/// Run the REPL on the process's stdin and stdout until EOF or `/quit`.
pub async fn run_stdio(router: Arc<ModeRouter>) -> std::io::Result<()> {
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    run_repl(router, stdin, tokio::io::stdout()).await
}

/// Run the REPL over arbitrary input and output streams.
pub async fn run_repl<R, W>(router: Arc<ModeRouter>, input: R, mut output: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();

    // Open with the greeting.
    let greeting = router.submit(CLI_SESSION_ID, "").await;
    write_reply(&router, &mut output, &greeting).await?;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match line {
            "/quit" | "/exit" => break,
            "/reset" => {
                let reply = router.reset(CLI_SESSION_ID).await;
                write_reply(&router, &mut output, &reply).await?;
                let greeting = router.submit(CLI_SESSION_ID, "").await;
                write_reply(&router, &mut output, &greeting).await?;
            }
            text => {
                let reply = router.submit(CLI_SESSION_ID, text).await;
                write_reply(&router, &mut output, &reply).await?;
            }
        }
    }

    output.flush().await
}

async fn write_reply<W>(router: &ModeRouter, output: &mut W, reply: &Reply) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut text = format!("\n{}\n", reply.bot_message);
    if reply.is_complete {
        let summary = router
            .snapshot(&reply.session_id)
            .await
            .and_then(|state| state.record)
            .map(|record| record.summary());
        if let Some(summary) = summary {
            text.push_str(&format!("\n{summary}\n"));
        }
    }
    output.write_all(text.as_bytes()).await?;
    output.flush().await
}
