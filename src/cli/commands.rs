// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the two subcommands, `serve` and `ask`, and their
// flags. Running with no subcommand is the same as `serve`
// with every default.
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::web::ServeConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the question-answering web page
    Serve(ServeArgs),

    /// Answer one question from the command line
    Ask(AskArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Interface to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 7860)]
    pub port: u16,

    /// Where downloaded model files are kept
    #[arg(long, default_value = "model_cache")]
    pub cache_dir: String,
}

impl Default for ServeArgs {
    fn default() -> Self {
        Self {
            host:      "127.0.0.1".to_string(),
            port:      7860,
            cache_dir: "model_cache".to_string(),
        }
    }
}

/// The web layer never sees clap types.
impl From<ServeArgs> for ServeConfig {
    fn from(a: ServeArgs) -> Self {
        ServeConfig {
            host: a.host,
            port: a.port,
        }
    }
}

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The natural language question to answer
    #[arg(long)]
    pub question: String,

    /// The passage the answer is extracted from
    #[arg(long)]
    pub context: String,

    /// Where downloaded model files are kept
    #[arg(long, default_value = "model_cache")]
    pub cache_dir: String,
}
