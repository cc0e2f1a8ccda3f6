// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.trim().to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "fos-sync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline mutation queue and sync client for FactoryOS")]
#[command(
    long_about = "Offline mutation queue and sync client for FactoryOS.\n\n\
    Queue production mutations while disconnected and reconcile them with the \
    FactoryOS sync endpoints in push-then-pull cycles."
)]
pub struct Cli {
    /// Use <path> as the state directory (default: $FOS_SYNC_DIR or the local data dir)
    #[arg(short = 'C', long = "dir", global = true, value_name = "path")]
    pub dir: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write config.toml for a FactoryOS server
    #[command(after_help = "\
Examples:
  fos-sync init --url https://factory.example.com
  fos-sync init --url https://factory.example.com --token $TOKEN
  fos-sync -C ./line-3 init --url http://localhost:3000 --client-id line-3")]
    Init {
        /// Base URL of the FactoryOS API (http:// or https://)
        #[arg(long, value_parser = non_empty_string)]
        url: String,

        /// Bearer token (or set FOS_SYNC_TOKEN at run time)
        #[arg(long)]
        token: Option<String>,

        /// Client id to use instead of a generated one
        #[arg(long, value_parser = non_empty_string)]
        client_id: Option<String>,
    },

    /// Queue a mutation for the next sync
    #[command(after_help = "\
Examples:
  fos-sync enqueue production_log 42 INSERT --payload '{\"quantity\":120}'
  fos-sync enqueue downtime_event 7 UPDATE --payload '{\"reason\":\"jam\"}' --version 3
  fos-sync enqueue machine m-1 delete")]
    Enqueue {
        /// Entity type, e.g. production_log
        #[arg(value_parser = non_empty_string)]
        entity_type: String,

        /// Entity id
        #[arg(value_parser = non_empty_string)]
        entity_id: String,

        /// INSERT, UPDATE or DELETE (case-insensitive)
        operation: String,

        /// JSON object with the changed fields
        #[arg(long, short)]
        payload: Option<String>,

        /// Last entity version known to this client
        #[arg(long, default_value_t = 0)]
        version: i64,
    },

    /// List pending entries
    Queue {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Remove a pending entry
    #[command(arg_required_else_help = true)]
    Dequeue {
        /// Entry id, as printed by 'enqueue' or 'queue'
        id: String,
    },

    /// Run one push-then-pull cycle
    Sync {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Sync on a timer until interrupted
    Watch {
        /// Override the configured interval, in milliseconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        interval_ms: Option<u64>,
    },

    /// Show client id, remote, pending entries and last sync
    Status {
        /// Output format (text, json)
        #[arg(long = "output", short = 'o', value_enum, default_value = "text")]
        output: OutputFormat,
    },

    /// Generate shell completions
    #[command(after_help = "\
Examples:
  fos-sync completion bash > ~/.local/share/bash-completion/completions/fos-sync
  fos-sync completion zsh > ~/.zfunc/_fos-sync")]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
