use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "scorebot")]
#[command(version)]
#[command(about = "Posts each finished game from a scoreboard page exactly once", long_about = None)]
pub struct Cli {
    /// Directory holding default.toml and per-environment overrides
    #[arg(short, long, default_value = "config")]
    pub config_dir: String,

    /// Log posts instead of publishing them
    #[arg(long)]
    pub dry_run: bool,

    /// Run a single poll cycle and exit
    #[arg(long)]
    pub once: bool,
}
