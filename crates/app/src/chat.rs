use crate::{print_sidebar, run_index};
use manual_chat_core::{ChatModel, ChatSession, Embedder, ManualAssistant};
use std::io::{self, BufRead, Write};

const HELP: &str = "Commands: /index rebuild the index, /status show manuals, /quit leave";

/// Line-oriented chat loop over stdin until `/quit` or end of input.
pub fn run<E: Embedder, C: ChatModel>(assistant: &ManualAssistant<E, C>) -> anyhow::Result<()> {
    print_sidebar(assistant)?;
    println!("{HELP}");

    let mut session = ChatSession::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        match line.trim() {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{HELP}"),
            "/status" => {
                if let Err(error) = print_sidebar(assistant) {
                    println!("error: {error}");
                }
            }
            "/index" => {
                if let Err(error) = run_index(assistant) {
                    println!("error: {error}");
                }
            }
            _ => {
                println!("Thinking...");
                session.submit(&line, assistant);
                println!();
                print!("{}", session.render_transcript());
            }
        }
    }

    session.end();
    Ok(())
}
