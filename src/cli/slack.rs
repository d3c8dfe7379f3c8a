//
//  enterprise-cli
//  cli/slack.rs
//
//  Created by Ngonidzashe Mangudya on 2026/10/18.
//  Copyright (c) 2025 IAMNGONI. All rights reserved.
//

//! Slack commands

use anyhow::Result;
use clap::{Args, Subcommand};

use crate::api::common::Service;
use crate::api::operation::{EntityKind, Operation, Verb};

use super::{dispatch, GlobalOptions};

/// Send and read Slack messages
#[derive(Args, Debug)]
pub struct SlackCommand {
    #[command(subcommand)]
    pub command: SlackSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SlackSubcommand {
    /// Send a message to a channel (or a user)
    Send {
        /// Channel name (#general) or ID
        #[arg(long)]
        channel: Option<String>,

        /// User name (@alice) or ID
        #[arg(long)]
        user: Option<String>,

        /// Message text
        #[arg(long)]
        message: String,

        /// Reply in the thread of this message timestamp
        #[arg(long)]
        thread_ts: Option<String>,

        /// Block Kit blocks as a JSON array
        #[arg(long)]
        blocks: Option<String>,
    },

    /// Send a direct message
    Dm {
        /// User name (@alice) or ID
        #[arg(long)]
        user: String,

        /// Message text
        #[arg(long)]
        message: String,
    },

    /// List channels
    Channels {
        /// Maximum number of channels
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Show recent messages of a channel
    History {
        /// Channel name or ID
        #[arg(long)]
        channel: String,

        /// Maximum number of messages
        #[arg(long)]
        limit: Option<u32>,
    },

    /// Search messages
    Search {
        /// Search query
        #[arg(long)]
        query: String,

        /// Restrict to one channel
        #[arg(long)]
        in_channel: Option<String>,

        /// Maximum number of messages
        #[arg(long)]
        limit: Option<u32>,
    },
}

impl SlackSubcommand {
    /// Converts the parsed arguments into an operation.
    pub fn to_operation(&self) -> Operation {
        let op = |verb, entity| Operation::new(Service::Slack, verb, entity);
        match self {
            Self::Send {
                channel,
                user,
                message,
                thread_ts,
                blocks,
            } => op(Verb::Send, EntityKind::Message)
                .with_opt("channel", channel.clone())
                .with_opt("user", user.clone())
                .with("message", message.as_str())
                .with_opt("thread_ts", thread_ts.clone())
                .with_opt("blocks", blocks.clone()),
            Self::Dm { user, message } => op(Verb::Send, EntityKind::Message)
                .with("user", user.as_str())
                .with("message", message.as_str()),
            Self::Channels { limit } => op(Verb::List, EntityKind::Channel).with_opt("limit", *limit),
            Self::History { channel, limit } => op(Verb::List, EntityKind::Message)
                .with("channel", channel.as_str())
                .with_opt("limit", *limit),
            Self::Search {
                query,
                in_channel,
                limit,
            } => op(Verb::Search, EntityKind::Message)
                .with("query", query.as_str())
                .with_opt("in_channel", in_channel.clone())
                .with_opt("limit", *limit),
        }
    }
}

impl SlackCommand {
    pub async fn run(&self, global: &GlobalOptions) -> Result<()> {
        dispatch::run(self.command.to_operation(), global).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_needs_exactly_one_destination() {
        let neither = SlackSubcommand::Send {
            channel: None,
            user: None,
            message: "hi".into(),
            thread_ts: None,
            blocks: None,
        };
        assert!(neither.to_operation().validate().is_err());

        let dm = SlackSubcommand::Dm {
            user: "@alice".into(),
            message: "hi".into(),
        };
        assert!(dm.to_operation().validate().is_ok());
    }

    #[test]
    fn test_blocks_must_be_array() {
        let send = SlackSubcommand::Send {
            channel: Some("#general".into()),
            user: None,
            message: "hi".into(),
            thread_ts: None,
            blocks: Some(r#"{"type":"divider"}"#.into()),
        };
        assert!(send.to_operation().validate().is_err());
    }
}
