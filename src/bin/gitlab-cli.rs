//
//  enterprise-cli
//  bin/gitlab-cli.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use clap::Parser;

use enterprise_cli::cli::{dispatch, finish, init_logging, GlobalOptions, GitlabSubcommand};

/// GitLab merge requests and pipelines from the command line
#[derive(Parser, Debug)]
#[command(name = "gitlab-cli", version, about = "GitLab merge requests and pipelines from the command line")]
struct GitlabCli {
    #[command(subcommand)]
    command: GitlabSubcommand,

    #[command(flatten)]
    global: GlobalOptions,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = GitlabCli::parse();
    finish(dispatch::run(cli.command.to_operation(), &cli.global).await)
}
