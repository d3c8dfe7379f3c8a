//
//  enterprise-cli
//  cli/gitlab.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! GitLab commands
//!
//! Merge requests, pipelines, jobs and branches. Every command takes a
//! project path (`group/project`) or numeric project ID.

use anyhow::Result;
use clap::{Args, Subcommand, ValueEnum};

use crate::api::common::Service;
use crate::api::operation::{EntityKind, Operation, Verb};

use super::{dispatch, GlobalOptions};

/// Work with GitLab merge requests and pipelines
#[derive(Args, Debug)]
pub struct GitlabCommand {
    #[command(subcommand)]
    pub command: GitlabSubcommand,
}

/// Merge request states accepted by `mrs --state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MrState {
    Opened,
    Closed,
    Merged,
    All,
}

impl MrState {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Opened => "opened",
            Self::Closed => "closed",
            Self::Merged => "merged",
            Self::All => "all",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum GitlabSubcommand {
    /// List merge requests
    Mrs {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// State filter
        #[arg(long, value_enum, default_value_t = MrState::Opened)]
        state: MrState,

        /// Title/description search
        #[arg(long)]
        search: Option<String>,

        /// Maximum number of merge requests
        #[arg(long)]
        limit: Option<u32>,

        /// Sort field (created_at, updated_at)
        #[arg(long)]
        order_by: Option<String>,
    },

    /// Show one merge request
    Mr {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// Merge request IID
        #[arg(long)]
        mr_id: u64,
    },

    /// Open a merge request
    #[command(name = "create-mr")]
    CreateMr {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// Source branch
        #[arg(long)]
        source: String,

        /// Target branch
        #[arg(long)]
        target: String,

        /// Title
        #[arg(long)]
        title: String,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Merge a merge request
    Merge {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// Merge request IID
        #[arg(long)]
        mr_id: u64,

        /// Squash commits
        #[arg(long)]
        squash: bool,

        /// Delete the source branch after merging
        #[arg(long)]
        delete_source: bool,
    },

    /// Close or reopen a merge request
    #[command(name = "mr-state")]
    MrState {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// Merge request IID
        #[arg(long)]
        mr_id: u64,

        /// close or reopen
        #[arg(long)]
        to: String,
    },

    /// List pipelines
    Pipelines {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// Status filter (running, success, failed, ...)
        #[arg(long)]
        status: Option<String>,

        /// Branch or tag
        #[arg(long = "ref")]
        git_ref: Option<String>,

        /// Maximum number of pipelines
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show one pipeline
    Pipeline {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// Pipeline ID
        #[arg(long)]
        pipeline_id: u64,
    },

    /// List jobs of a pipeline
    Jobs {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// Pipeline ID
        #[arg(long)]
        pipeline_id: u64,

        /// Job status filter
        #[arg(long)]
        status: Option<String>,
    },

    /// Retry the failed jobs of a pipeline
    Retry {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// Pipeline ID
        #[arg(long)]
        pipeline_id: u64,
    },

    /// List branches
    Branches {
        /// Project path or ID
        #[arg(long)]
        project: String,

        /// Name search
        #[arg(long)]
        search: Option<String>,

        /// Maximum number of branches
        #[arg(long)]
        limit: Option<u32>,
    },
}

impl GitlabSubcommand {
    /// Converts the parsed arguments into an operation.
    pub fn to_operation(&self) -> Operation {
        let op = |verb, entity, project: &str| Operation::new(Service::Gitlab, verb, entity).with("project", project);
        match self {
            Self::Mrs {
                project,
                state,
                search,
                limit,
                order_by,
            } => op(Verb::List, EntityKind::MergeRequest, project)
                .with("state", state.as_str())
                .with_opt("search", search.clone())
                .with_opt("limit", *limit)
                .with_opt("order_by", order_by.clone()),
            Self::Mr { project, mr_id } => op(Verb::Get, EntityKind::MergeRequest, project).with("mr_id", *mr_id),
            Self::CreateMr {
                project,
                source,
                target,
                title,
                description,
            } => op(Verb::Create, EntityKind::MergeRequest, project)
                .with("source", source.as_str())
                .with("target", target.as_str())
                .with("title", title.as_str())
                .with_opt("description", description.clone()),
            Self::Merge {
                project,
                mr_id,
                squash,
                delete_source,
            } => op(Verb::Merge, EntityKind::MergeRequest, project)
                .with("mr_id", *mr_id)
                .with_flag("squash", *squash)
                .with_flag("delete_source", *delete_source),
            Self::MrState { project, mr_id, to } => op(Verb::Transition, EntityKind::MergeRequest, project)
                .with("mr_id", *mr_id)
                .with("to", to.as_str()),
            Self::Pipelines {
                project,
                status,
                git_ref,
                limit,
            } => op(Verb::List, EntityKind::Pipeline, project)
                .with_opt("status", status.clone())
                .with_opt("ref", git_ref.clone())
                .with_opt("limit", *limit),
            Self::Pipeline { project, pipeline_id } => {
                op(Verb::Get, EntityKind::Pipeline, project).with("pipeline_id", *pipeline_id)
            }
            Self::Jobs {
                project,
                pipeline_id,
                status,
            } => op(Verb::List, EntityKind::Job, project)
                .with("pipeline_id", *pipeline_id)
                .with_opt("status", status.clone()),
            Self::Retry { project, pipeline_id } => {
                op(Verb::Rerun, EntityKind::Pipeline, project).with("pipeline_id", *pipeline_id)
            }
            Self::Branches { project, search, limit } => op(Verb::List, EntityKind::Branch, project)
                .with_opt("search", search.clone())
                .with_opt("limit", *limit),
        }
    }
}

impl GitlabCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        dispatch::run(self.command.to_operation(), global).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_flags() {
        let op = GitlabSubcommand::Merge {
            project: "group/app".into(),
            mr_id: 9,
            squash: true,
            delete_source: false,
        }
        .to_operation();
        assert!(op.flag("squash"));
        assert!(!op.flag("delete_source"));
        assert_eq!(op.describe(), "merge merge request 9");
    }

    #[test]
    fn test_mrs_state_default() {
        let op = GitlabSubcommand::Mrs {
            project: "42".into(),
            state: MrState::Opened,
            search: None,
            limit: Some(5),
            order_by: None,
        }
        .to_operation();
        assert_eq!(op.str("state"), Some("opened"));
        assert_eq!(op.limit(), Some(5));
    }
}
