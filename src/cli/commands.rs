//! CLI command definitions

use clap::Args;

/// Run a pipeline
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Path to deployment descriptor YAML file
    #[arg(short, long)]
    pub file: String,

    /// Run-level environment overrides (key=value)
    #[arg(long, value_parser = parse_key_value)]
    pub env: Vec<(String, String)>,

    /// Don't save the run to history
    #[arg(long)]
    pub no_history: bool,
}

/// Validate a deployment descriptor
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to deployment descriptor YAML file
    #[arg(short, long)]
    pub file: String,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Resolve a request path against the route table
#[derive(Debug, Args, Clone)]
pub struct ResolveCommand {
    /// Path to deployment descriptor YAML file
    #[arg(short, long)]
    pub file: String,

    /// Request path to resolve
    pub path: String,

    /// Request body size in bytes
    #[arg(long, default_value_t = 0)]
    pub body_size: u64,
}

/// Render the descriptor to an nginx configuration
#[derive(Debug, Args, Clone)]
pub struct RenderCommand {
    /// Path to deployment descriptor YAML file
    #[arg(short, long)]
    pub file: String,

    /// Write output here instead of stdout
    #[arg(short, long)]
    pub output: Option<String>,
}

/// List pipelines with recorded runs
#[derive(Debug, Args, Clone)]
pub struct ListCommand {
    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Show run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Pipeline name to filter by
    #[arg(short, long)]
    pub pipeline: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Parse key=value pairs
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let parts: Vec<&str> = s.splitn(2, '=').collect();
    if parts.len() != 2 {
        return Err(format!("Invalid key=value pair: {}", s));
    }
    Ok((parts[0].to_string(), parts[1].to_string()))
}
