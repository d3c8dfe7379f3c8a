//
//  enterprise-cli
//  main.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

use clap::Parser;

use enterprise_cli::cli::{finish, init_logging, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    let cli = Cli::parse();
    finish(cli.run().await)
}
