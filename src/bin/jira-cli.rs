//
//  enterprise-cli
//  bin/jira-cli.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use clap::Parser;

use enterprise_cli::cli::{dispatch, finish, init_logging, GlobalOptions, JiraSubcommand};

/// Jira issues, boards and sprints from the command line
#[derive(Parser, Debug)]
#[command(name = "jira-cli", version, about = "Jira issues, boards and sprints from the command line")]
struct JiraCli {
    #[command(subcommand)]
    command: JiraSubcommand,

    #[command(flatten)]
    global: GlobalOptions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = JiraCli::parse();
    finish(dispatch::run(cli.command.to_operation(), &cli.global).await)
}
