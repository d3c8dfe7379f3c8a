//
//  enterprise-cli
//  cli/jira.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Jira commands
//!
//! Issue search and editing, workflow transitions, comments, users,
//! projects, priorities, link types, boards and sprints.

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::api::common::Service;
use crate::api::operation::{EntityKind, Operation, Verb};

use super::{dispatch, GlobalOptions};

/// Work with Jira issues, boards and sprints
#[derive(Args, Debug)]
pub struct JiraCommand {
    #[command(subcommand)]
    pub command: JiraSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum JiraSubcommand {
    /// Search issues with JQL
    Search(SearchArgs),

    /// Show one issue
    Get {
        /// Issue key (e.g. PROJ-123)
        #[arg(long)]
        issue: String,
    },

    /// Create an issue
    Create(CreateArgs),

    /// Update fields of an issue
    Update(UpdateArgs),

    /// Move an issue through its workflow
    Transition {
        /// Issue key
        #[arg(long)]
        issue: String,

        /// Transition name (case-insensitive)
        #[arg(long)]
        to: String,

        /// Comment to add after the transition
        #[arg(long)]
        comment: Option<String>,
    },

    /// List the transitions available for an issue
    Transitions {
        /// Issue key
        #[arg(long)]
        issue: String,
    },

    /// List comments on an issue
    Comments {
        /// Issue key
        #[arg(long)]
        issue: String,

        /// Maximum number of comments
        #[arg(long, visible_alias = "limit")]
        max_results: Option<u32>,
    },

    /// Comment on an issue
    Comment {
        /// Issue key
        #[arg(long)]
        issue: String,

        /// Comment text
        #[arg(long)]
        body: String,
    },

    /// Assign an issue ('none' unassigns)
    Assign {
        /// Issue key
        #[arg(long)]
        issue: String,

        /// Email, display name or account ID
        #[arg(long)]
        user: String,
    },

    /// Search users
    Users {
        /// Name or email fragment
        #[arg(long)]
        query: String,

        /// Maximum number of users
        #[arg(long, visible_alias = "limit")]
        max_results: Option<u32>,
    },

    /// List projects
    Projects {
        /// Maximum number of projects
        #[arg(long, visible_alias = "limit")]
        max_results: Option<u32>,
    },

    /// Link two issues
    Link {
        /// Inward issue key
        #[arg(long)]
        from: String,

        /// Outward issue key
        #[arg(long)]
        to: String,

        /// Link type name (e.g. Blocks, Relates)
        #[arg(long = "type")]
        link_type: String,
    },

    /// List the issue link types (Blocks, Relates, ...)
    #[command(name = "link-types")]
    LinkTypes,

    /// List the priorities issues can take
    Priorities,

    /// List agile boards
    Boards {
        /// Maximum number of boards
        #[arg(long, visible_alias = "limit")]
        max_results: Option<u32>,
    },

    /// List sprints of a board
    Sprints {
        /// Board ID
        #[arg(long)]
        board: String,

        /// Sprint states, comma separated
        #[arg(long, default_value = "active,future")]
        state: String,

        /// Maximum number of sprints
        #[arg(long, visible_alias = "limit")]
        max_results: Option<u32>,
    },

    /// Move an issue into a sprint
    #[command(name = "sprint-move")]
    SprintMove {
        /// Sprint ID
        #[arg(long)]
        sprint: String,

        /// Issue key
        #[arg(long)]
        issue: String,
    },
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// JQL query
    #[arg(long)]
    pub jql: String,

    /// Extra fields to include, comma separated
    #[arg(long, value_delimiter = ',')]
    pub fields: Vec<String>,

    /// Maximum number of issues
    #[arg(long, visible_alias = "limit")]
    pub max_results: Option<u32>,

    /// Sort clause appended when the query has none (e.g. "created DESC")
    #[arg(long)]
    pub order_by: Option<String>,
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Project key
    #[arg(long)]
    pub project: String,

    /// Issue type (Task, Bug, Story, ...)
    #[arg(long = "type")]
    pub issue_type: String,

    /// Summary line
    #[arg(long)]
    pub summary: String,

    /// Description text
    #[arg(long)]
    pub description: Option<String>,

    /// Labels, comma separated
    #[arg(long, value_delimiter = ',')]
    pub labels: Vec<String>,

    /// Assignee email, display name or account ID
    #[arg(long)]
    pub assignee: Option<String>,

    /// Parent epic key
    #[arg(long)]
    pub epic: Option<String>,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue key
    #[arg(long)]
    pub issue: String,

    /// New summary
    #[arg(long)]
    pub summary: Option<String>,

    /// New description
    #[arg(long)]
    pub description: Option<String>,

    /// New assignee ('none' unassigns)
    #[arg(long)]
    pub assignee: Option<String>,

    /// New priority name
    #[arg(long)]
    pub priority: Option<String>,

    /// Labels to add, comma separated
    #[arg(long, value_delimiter = ',')]
    pub add_labels: Vec<String>,

    /// Labels to remove, comma separated
    #[arg(long, value_delimiter = ',')]
    pub remove_labels: Vec<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<String>,

    /// Parent epic key
    #[arg(long)]
    pub epic: Option<String>,

    /// Comment to add
    #[arg(long)]
    pub comment: Option<String>,
}

impl JiraSubcommand {
    /// Converts the parsed arguments into an operation.
    pub fn to_operation(&self) -> Operation {
        let op = |verb, entity| Operation::new(Service::Jira, verb, entity);
        match self {
            Self::Search(args) => op(Verb::Search, EntityKind::Issue)
                .with("jql", args.jql.as_str())
                .with_list("fields", args.fields.clone())
                .with_opt("limit", args.max_results)
                .with_opt("order_by", args.order_by.clone()),
            Self::Get { issue } => op(Verb::Get, EntityKind::Issue).with("issue", issue.as_str()),
            Self::Create(args) => op(Verb::Create, EntityKind::Issue)
                .with("project", args.project.as_str())
                .with("type", args.issue_type.as_str())
                .with("summary", args.summary.as_str())
                .with_opt("description", args.description.clone())
                .with_list("labels", args.labels.clone())
                .with_opt("assignee", args.assignee.clone())
                .with_opt("epic", args.epic.clone()),
            Self::Update(args) => op(Verb::Update, EntityKind::Issue)
                .with("issue", args.issue.as_str())
                .with_opt("summary", args.summary.clone())
                .with_opt("description", args.description.clone())
                .with_opt("assignee", args.assignee.clone())
                .with_opt("priority", args.priority.clone())
                .with_list("add_labels", args.add_labels.clone())
                .with_list("remove_labels", args.remove_labels.clone())
                .with_opt("due", args.due.clone())
                .with_opt("start", args.start.clone())
                .with_opt("epic", args.epic.clone())
                .with_opt("comment", args.comment.clone()),
            Self::Transition { issue, to, comment } => op(Verb::Transition, EntityKind::Issue)
                .with("issue", issue.as_str())
                .with("to", to.as_str())
                .with_opt("comment", comment.clone()),
            Self::Transitions { issue } => op(Verb::List, EntityKind::Transition).with("issue", issue.as_str()),
            Self::Comments { issue, max_results } => op(Verb::List, EntityKind::Comment)
                .with("issue", issue.as_str())
                .with_opt("limit", *max_results),
            Self::Comment { issue, body } => op(Verb::Create, EntityKind::Comment)
                .with("issue", issue.as_str())
                .with("body", body.as_str()),
            Self::Assign { issue, user } => op(Verb::Assign, EntityKind::Issue)
                .with("issue", issue.as_str())
                .with("user", user.as_str()),
            Self::Users { query, max_results } => op(Verb::Search, EntityKind::User)
                .with("query", query.as_str())
                .with_opt("limit", *max_results),
            Self::Projects { max_results } => op(Verb::List, EntityKind::Project).with_opt("limit", *max_results),
            Self::Link { from, to, link_type } => op(Verb::Link, EntityKind::Issue)
                .with("from", from.as_str())
                .with("to", to.as_str())
                .with("link_type", link_type.as_str()),
            Self::LinkTypes => op(Verb::List, EntityKind::LinkType),
            Self::Priorities => op(Verb::List, EntityKind::Priority),
            Self::Boards { max_results } => op(Verb::List, EntityKind::Board).with_opt("limit", *max_results),
            Self::Sprints {
                board,
                state,
                max_results,
            } => op(Verb::List, EntityKind::Sprint)
                .with("board", board.as_str())
                .with("state", state.as_str())
                .with_opt("limit", *max_results),
            Self::SprintMove { sprint, issue } => op(Verb::Update, EntityKind::Sprint)
                .with("sprint", sprint.as_str())
                .with("issue", issue.as_str()),
        }
    }
}

impl JiraCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        dispatch::run(self.command.to_operation(), global).await
    }
}
