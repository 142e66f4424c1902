//! CLI argument parsing with clap

use clap::{Args, Parser, Subcommand};

/// Deepomatic - computer-vision API client
#[derive(Parser, Debug)]
#[command(name = "deepomatic")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// API endpoint and credentials
#[derive(Args, Debug, Default)]
pub struct ConnectionArgs {
    /// API root URL
    #[arg(long, env = "DEEPOMATIC_API_URL", global = true)]
    pub host: Option<String>,

    /// API key
    #[arg(long, env = "DEEPOMATIC_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Application id (deprecated by the API, still sent when set)
    #[arg(long, env = "DEEPOMATIC_APP_ID", global = true)]
    pub app_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Task inspection and waiting
    #[command(subcommand)]
    Task(TaskCommands),

    /// Run an inference on a network
    Infer(InferArgs),
}

// Task commands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// Fetch a task
    Get(TaskGetArgs),

    /// Wait until a task is done
    Wait(TaskWaitArgs),

    /// Wait for several tasks, printing them grouped by status
    BatchWait(TaskBatchWaitArgs),
}

#[derive(Args, Debug)]
pub struct TaskGetArgs {
    /// Task id
    pub id: String,
}

#[derive(Args, Debug)]
pub struct TaskWaitArgs {
    /// Task id
    pub id: String,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,
}

#[derive(Args, Debug)]
pub struct TaskBatchWaitArgs {
    /// Task ids, in the order results are reported
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Give up after this many seconds and report tasks still pending
    #[arg(long, default_value_t = 300)]
    pub timeout: u64,
}

// Inference command
#[derive(Args, Debug)]
pub struct InferArgs {
    /// Network id, or name of a public network
    pub network: String,

    /// Image URL or local file path
    pub image: String,

    /// Return the task instead of waiting for its result
    #[arg(long)]
    pub no_wait: bool,

    /// Give up waiting after this many seconds
    #[arg(long, default_value_t = 60)]
    pub timeout: u64,

    /// Network layers to return (repeatable)
    #[arg(long = "output-layer")]
    pub output_layers: Vec<String>,

    /// Crop uniform background before running the inference
    #[arg(long)]
    pub crop_uniform_background: bool,
}
