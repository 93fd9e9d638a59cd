use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::DEFAULT_CONFIG_FILENAME;

/// Publish a site project and watch it go live.
#[derive(Debug, Parser)]
#[command(name = "publish", version, about)]
pub struct Cli {
    /// Path to the RON config file.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILENAME)]
    pub config: PathBuf,

    /// Project to operate on; overrides the config file.
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// API base url; overrides the config file.
    #[arg(long, global = true)]
    pub api: Option<String>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start a publish and poll until it is live or failed.
    Publish,
    /// Show the live publish, its page urls and unpublished changes.
    Status,
    /// List recent publishes.
    History,
    /// Make an earlier publish the live one.
    MakeLive {
        /// Publish id taken from `history`.
        publish_id: String,
    },
    /// Derive a page url from a publish base url, without contacting the API.
    Url {
        base_url: String,
        #[arg(long, default_value = "")]
        slug: String,
        #[arg(long)]
        home: bool,
    },
    /// Write a config file with default values.
    InitConfig,
}
