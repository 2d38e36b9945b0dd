//! One-shot question against the knowledge base, without running the server.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::ChatOrchestrator;

/// Session id used for one-shot CLI questions.
const CLI_SESSION: &str = "cli";

/// Run the ask command.
pub async fn run_ask(question: &str, settings: Settings) -> anyhow::Result<()> {
    let orchestrator = ChatOrchestrator::new(settings)?;

    let spinner = Output::spinner("Thinking...");
    let answer = orchestrator.chat(CLI_SESSION, question).await?;
    spinner.finish_and_clear();

    println!("{}", answer);

    Ok(())
}
