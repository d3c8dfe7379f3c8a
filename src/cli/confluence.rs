//
//  enterprise-cli
//  cli/confluence.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Confluence commands

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::api::common::Service;
use crate::api::operation::{EntityKind, Operation, Verb};

use super::{dispatch, GlobalOptions};

/// Search, read and write Confluence pages
#[derive(Args, Debug)]
pub struct ConfluenceCommand {
    #[command(subcommand)]
    pub command: ConfluenceSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum ConfluenceSubcommand {
    /// Search content with CQL
    Search {
        /// CQL query (e.g. 'space = ENG and type = page')
        #[arg(long)]
        cql: String,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<u32>,

        /// Sort clause appended when the query has none
        #[arg(long)]
        order_by: Option<String>,
    },

    /// Show a page as plain text
    Get {
        /// Page ID
        #[arg(long)]
        page_id: String,
    },

    /// Create a page
    Create {
        /// Space key
        #[arg(long)]
        space: String,

        /// Page title
        #[arg(long)]
        title: String,

        /// Body in storage format (XHTML)
        #[arg(long)]
        content: String,

        /// Parent page ID
        #[arg(long)]
        parent_id: Option<String>,
    },

    /// Replace the body of a page
    Update {
        /// Page ID
        #[arg(long)]
        page_id: String,

        /// New body in storage format (XHTML)
        #[arg(long)]
        content: String,

        /// New title (defaults to the current one)
        #[arg(long)]
        title: Option<String>,
    },

    /// List spaces
    Spaces {
        /// Maximum number of spaces
        #[arg(long)]
        limit: Option<u32>,
    },
}

impl ConfluenceSubcommand {
    /// Converts the parsed arguments into an operation.
    pub fn to_operation(&self) -> Operation {
        let op = |verb, entity| Operation::new(Service::Confluence, verb, entity);
        match self {
            Self::Search { cql, limit, order_by } => op(Verb::Search, EntityKind::Page)
                .with("cql", cql.as_str())
                .with_opt("limit", *limit)
                .with_opt("order_by", order_by.clone()),
            Self::Get { page_id } => op(Verb::Get, EntityKind::Page).with("page_id", page_id.as_str()),
            Self::Create {
                space,
                title,
                content,
                parent_id,
            } => op(Verb::Create, EntityKind::Page)
                .with("space", space.as_str())
                .with("title", title.as_str())
                .with("content", content.as_str())
                .with_opt("parent_id", parent_id.clone()),
            Self::Update { page_id, content, title } => op(Verb::Update, EntityKind::Page)
                .with("page_id", page_id.as_str())
                .with("content", content.as_str())
                .with_opt("title", title.clone()),
            Self::Spaces { limit } => op(Verb::List, EntityKind::Space).with_opt("limit", *limit),
        }
    }
}

impl ConfluenceCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        dispatch::run(self.command.to_operation(), global).await
    }
}
