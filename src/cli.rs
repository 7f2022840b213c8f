//! Interactive command-line front end.
//!
//! Drives a single fixed-identifier session in a read-eval loop; the literal
//! input `exit` (any casing) ends the session.

use std::sync::Arc;

use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::session::SessionRegistry;

/// Session id used by the interactive loop.
pub const CLI_SESSION_ID: &str = "mantle_agent_session";

const PROMPT: &str = "Ask your question about Mantle (or type 'exit' to quit): ";

/// Run the read-eval loop until `exit` or end of input.
pub async fn run(registry: Arc<SessionRegistry>) -> anyhow::Result<()> {
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line.to_lowercase() == "exit" {
                    println!("Exiting the session.");
                    break;
                }
                let _ = rl.add_history_entry(line);

                let (_, workflow) = registry.get_or_create(Some(CLI_SESSION_ID));
                match workflow.run(line, true).await {
                    Ok(response) => println!("{}", response.content),
                    Err(e) => eprintln!("Failed to process query: {e:#}"),
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                println!("Exiting the session.");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
