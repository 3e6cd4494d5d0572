//! Interactive console session.
//!
//! Registration runs in the foreground (the server's prompts are answered
//! from stdin). Afterwards a background task prints everything the server
//! sends while the foreground reads commands and their operands.

use std::io::Write;

use anyhow::Context;
use futures_lite::StreamExt;
use parley_server::protocol::{self, Command};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tokio_util::codec::{FramedRead, LinesCodec};

pub async fn run(stream: TcpStream) -> anyhow::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut server = FramedRead::new(reader, LinesCodec::new());
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();

    // ── Registration ────────────────────────────────────────────────
    loop {
        let Some(line) = server.next().await.transpose()? else {
            eprintln!("Server closed the connection.");
            return Ok(());
        };
        println!("{line}");
        if protocol::is_greeting(&line) {
            break;
        }
        if line == protocol::ID_PROMPT {
            let Some(id) = stdin.next_line().await? else {
                return Ok(());
            };
            send(&mut writer, &id).await?;
        }
    }

    // ── Incoming lines ──────────────────────────────────────────────
    let printer = tokio::spawn(async move {
        while let Some(Ok(line)) = server.next().await {
            println!("{line}");
        }
        eprintln!("Disconnected from server.");
    });

    // ── Commands ────────────────────────────────────────────────────
    'commands: loop {
        if printer.is_finished() {
            break;
        }
        println!("{}", protocol::MENU);
        let Some(input) = stdin.next_line().await? else {
            break;
        };
        let command = Command::parse(&input);

        let mut outgoing = vec![command.keyword().to_string()];
        for label in operand_prompts(&command) {
            prompt(label);
            let Some(operand) = stdin.next_line().await? else {
                break 'commands;
            };
            outgoing.push(operand);
        }
        for line in &outgoing {
            send(&mut writer, line).await?;
        }

        if command == Command::Quit {
            break;
        }
    }

    printer.abort();
    Ok(())
}

/// Prompts for the operand lines that follow a command keyword.
fn operand_prompts(command: &Command) -> &'static [&'static str] {
    match command {
        Command::Broadcast => &["Message: "],
        Command::Direct => &["Recipient: ", "Message: "],
        Command::List | Command::Quit | Command::Unknown(_) => &[],
    }
}

fn prompt(label: &str) {
    print!("{label}");
    let _ = std::io::stdout().flush();
}

async fn send(writer: &mut OwnedWriteHalf, line: &str) -> anyhow::Result<()> {
    writer
        .write_all(format!("{line}\n").as_bytes())
        .await
        .context("failed to send to server")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands_per_command() {
        assert_eq!(operand_prompts(&Command::Broadcast), &["Message: "]);
        assert_eq!(
            operand_prompts(&Command::Direct),
            &["Recipient: ", "Message: "]
        );
        assert!(operand_prompts(&Command::List).is_empty());
        assert!(operand_prompts(&Command::Quit).is_empty());
        assert!(operand_prompts(&Command::Unknown("x".into())).is_empty());
    }
}
