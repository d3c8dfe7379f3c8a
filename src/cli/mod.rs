//
//  enterprise-cli
//  cli/mod.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! CLI command definitions using clap derive macros

mod completion;
mod confluence;
mod credentials;
pub mod dispatch;
mod doctor;
mod gitlab;
mod jira;
mod slack;

pub use completion::CompletionCommand;
pub use confluence::{ConfluenceCommand, ConfluenceSubcommand};
pub use credentials::CredentialsCommand;
pub use doctor::DoctorCommand;
pub use gitlab::{GitlabCommand, GitlabSubcommand};
pub use jira::{JiraCommand, JiraSubcommand};
pub use slack::{SlackCommand, SlackSubcommand};

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::exit_codes;
use crate::output::OutputFormat;

/// Enterprise CLI - Jira, Confluence, Slack and GitLab from the command line
#[derive(Parser, Debug)]
#[command(
    name = "ent",
    version,
    about = "Work with Jira, Confluence, Slack and GitLab from the command line",
    long_about = "ent is one CLI for four enterprise services.\n\n\
                  Credentials come from the environment or ~/.enterprise-tools/credentials.env.\n\
                  Exit codes: 0 ok, 1 authentication, 2 request error, 3 network.",
    propagate_version = true,
    after_help = "Use 'ent <command> --help' for more information about a command."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOptions,
}

/// Global options available to all commands
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Output format
    #[arg(long, short = 'f', global = true, env = "ENT_FORMAT", value_enum, default_value_t = OutputFormat::Summary)]
    pub format: OutputFormat,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Jira issues, boards and sprints
    Jira(JiraCommand),

    /// Confluence pages and spaces
    #[command(visible_alias = "wiki")]
    Confluence(ConfluenceCommand),

    /// Slack messages and channels
    Slack(SlackCommand),

    /// GitLab merge requests and pipelines
    #[command(visible_alias = "gl")]
    Gitlab(GitlabCommand),

    /// Test the connection to every configured service
    Doctor(DoctorCommand),

    /// Show where credentials come from (secrets masked)
    Credentials(CredentialsCommand),

    /// Generate shell completion scripts
    Completion(CompletionCommand),

    /// Print version information
    Version,
}

impl Cli {
    /// Runs the selected command.
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Jira(cmd) => cmd.run(&self.global).await,
            Commands::Confluence(cmd) => cmd.run(&self.global).await,
            Commands::Slack(cmd) => cmd.run(&self.global).await,
            Commands::Gitlab(cmd) => cmd.run(&self.global).await,
            Commands::Doctor(cmd) => cmd.run(&self.global).await,
            Commands::Credentials(cmd) => cmd.run(&self.global).await,
            Commands::Completion(cmd) => cmd.run(&self.global).await,
            Commands::Version => {
                println!("{} version {}", crate::APP_NAME, crate::VERSION);
                Ok(())
            }
        }
    }
}

/// Initialize logging based on `ENT_DEBUG`.
///
/// Log lines go to stderr; stdout only ever carries rendered records.
pub fn init_logging() {
    let filter = EnvFilter::try_from_env("ENT_DEBUG").unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Reports the result of a command and exits with its code.
pub fn finish(result: Result<()>) -> ! {
    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(exit_codes::for_error(&e));
        }
    }
}
