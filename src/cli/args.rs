use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "rapport")]
#[command(version)]
#[command(about = "Sign in to Rapport and manage the local session", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true, env = "RAPPORT_API_URL")]
    pub api_url: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Initialize configuration
    Init,
    /// Verify the stored session and show who is signed in
    Status,
    /// Sign in with an email or username
    Login {
        /// Email address or username
        identifier: String,
        /// Password
        #[arg(long, env = "RAPPORT_SECRET", hide_env_values = true)]
        secret: String,
    },
    /// Create an account and sign in to it
    Register {
        email: String,
        /// Full name shown on analyses
        #[arg(long)]
        full_name: String,
        /// Password
        #[arg(long, env = "RAPPORT_SECRET", hide_env_values = true)]
        secret: String,
    },
    /// Sign out and forget stored credentials
    Logout,
    /// Record a Pro upgrade made on another device
    Upgrade,
    /// Print the stored bearer token
    Token,
}
