//
//  enterprise-cli
//  bin/slack-cli.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use clap::Parser;

use enterprise_cli::cli::{dispatch, finish, init_logging, GlobalOptions, SlackSubcommand};

/// Slack messages and channels from the command line
#[derive(Parser, Debug)]
#[command(name = "slack-cli", version, about = "Slack messages and channels from the command line")]
struct SlackCli {
    #[command(subcommand)]
    command: SlackSubcommand,

    #[command(flatten)]
    global: GlobalOptions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = SlackCli::parse();
    finish(dispatch::run(cli.command.to_operation(), &cli.global).await)
}
