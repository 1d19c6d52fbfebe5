// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// The entry point for all user interaction. `clap` parses the
// arguments; everything else is delegated:
//   1. `serve` (default) — load both models, serve the web page
//   2. `ask`             — load both models, answer once, print
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use commands::{AskArgs, Commands, ServeArgs};

use crate::application::qa_system::QaSystem;
use crate::infra::loader::load_pipelines;

#[derive(Parser, Debug)]
#[command(
    name = "qa-explainer",
    version,
    about = "Extract an answer with DistilBERT and explain it with DistilGPT-2."
)]
pub struct Cli {
    /// The subcommand to run (serve when omitted)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Dispatch to the chosen command. Only routes, never computes.
    pub async fn run(self) -> Result<()> {
        match self.command.unwrap_or_else(|| Commands::Serve(ServeArgs::default())) {
            Commands::Serve(args) => run_serve(args).await,
            Commands::Ask(args)   => run_ask(args).await,
        }
    }
}

async fn run_serve(args: ServeArgs) -> Result<()> {
    let pipelines = load_pipelines(Path::new(&args.cache_dir)).await;
    let system    = Arc::new(QaSystem::new(pipelines));
    crate::web::serve(args.into(), system).await
}

async fn run_ask(args: AskArgs) -> Result<()> {
    let pipelines = load_pipelines(Path::new(&args.cache_dir)).await;
    let system    = QaSystem::new(pipelines);

    let (answer, explanation) =
        tokio::task::spawn_blocking(move || system.answer(&args.question, &args.context)).await?;

    println!("\n{answer}\n{explanation}");
    Ok(())
}
