//! CLI command implementations.

pub mod check;
pub mod config;
pub mod preview;

use clap::{Args, Subcommand};

/// Arguments for the check command.
#[derive(Args)]
pub struct CheckArgs {
    /// Template to check instead of the configured one.
    #[arg(short, long)]
    pub template: Option<String>,
}

/// Arguments for the preview command.
#[derive(Args)]
pub struct PreviewArgs {
    /// Absolute URL to render.
    pub url: String,

    /// Markup rendered into the root mount.
    #[arg(short, long, default_value = "<p>preview</p>")]
    pub body: String,

    /// Title element placed in the head.
    #[arg(long)]
    pub title: Option<String>,

    /// Meta markup placed in the head.
    #[arg(long)]
    pub meta: Option<String>,

    /// Attributes for the opening body tag.
    #[arg(long)]
    pub body_attrs: Option<String>,

    /// Attributes for the opening html tag.
    #[arg(long)]
    pub html_attrs: Option<String>,

    /// Response status set by the page.
    #[arg(long)]
    pub status: Option<u16>,

    /// Template to render into instead of the configured one.
    #[arg(short, long)]
    pub template: Option<String>,

    /// Offer a live sink so the request may stream.
    #[arg(long)]
    pub stream: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}
