//
//  enterprise-cli
//  bin/confluence-cli.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use clap::Parser;

use enterprise_cli::cli::{dispatch, finish, init_logging, GlobalOptions, ConfluenceSubcommand};

/// Confluence pages and spaces from the command line
#[derive(Parser, Debug)]
#[command(name = "confluence-cli", version, about = "Confluence pages and spaces from the command line")]
struct ConfluenceCli {
    #[command(subcommand)]
    command: ConfluenceSubcommand,

    #[command(flatten)]
    global: GlobalOptions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = ConfluenceCli::parse();
    finish(dispatch::run(cli.command.to_operation(), &cli.global).await)
}
