//! CLI argument definitions using clap derive

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// portalsync - offline-friendly client for the university portal
///
/// Fetches transcripts, exam seats, notifications and course content
/// through the portal proxy and keeps them in a local cache.
#[derive(Parser, Debug)]
#[command(name = "portalsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "PORTALSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding the session, cache and audit log
    #[arg(long, global = true, env = "PORTALSYNC_STATE_DIR")]
    pub state_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Store credentials and open a portal session
    Login(LoginArgs),

    /// Clear the session and every cached resource
    Logout,

    /// Show the stored session
    Status,

    /// Show the transcript for a study year
    Transcript(TranscriptArgs),

    /// List the study years offered by the transcript page
    Years(RefreshArgs),

    /// Show exam seat assignments
    Exams(RefreshArgs),

    /// Fetch and track portal notifications
    Notifications(NotificationsArgs),

    /// Browse course management content
    Cms(CmsArgs),

    /// Refresh exams, courses and notifications in one pass
    Sync,

    /// Manage the local resource cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Portal username (prompted when omitted)
    #[arg(short, long, env = "PORTALSYNC_USERNAME")]
    pub username: Option<String>,

    /// Read the password from stdin instead of prompting
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Args, Debug)]
pub struct TranscriptArgs {
    /// Study year as listed by `portalsync years`, e.g. 2023-2024
    pub year: String,
}

#[derive(Args, Debug)]
pub struct RefreshArgs {
    /// Ignore the cached copy and fetch from the portal
    #[arg(short, long)]
    pub refresh: bool,
}

#[derive(Args, Debug)]
pub struct NotificationsArgs {
    #[command(subcommand)]
    pub action: Option<NotificationsAction>,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum NotificationsAction {
    /// Fetch notifications and announce the new ones (default)
    Sync,

    /// Show the last fetched notifications without network access
    List,

    /// Mark one notification as read
    Read {
        /// Notification id
        id: String,
    },

    /// Mark every notification as read
    ReadAll,
}

#[derive(Args, Debug)]
pub struct CmsArgs {
    #[command(subcommand)]
    pub action: CmsAction,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CmsAction {
    /// List courses
    Courses {
        #[arg(short, long)]
        refresh: bool,
    },

    /// Show the weeks and content of one course
    View {
        /// Course id as listed by `portalsync cms courses`
        course: String,

        /// Season id
        season: String,

        #[arg(short, long)]
        refresh: bool,
    },

    /// Mark a content item as seen
    Seen {
        /// Content id
        content: String,
    },
}

#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CacheAction {
    /// Remove cached resources
    Clear {
        /// Only entries whose key starts with this, e.g. `cms-course`
        #[arg(long)]
        prefix: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Dot-separated key, e.g. proxy.url
        key: String,

        value: String,
    },
}

#[derive(Debug, Clone, Copy, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Plain,
}
