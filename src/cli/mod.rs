use clap::{Parser, Subcommand};

mod errors;
mod handlers;
mod types;

pub use errors::*;
pub use handlers::*;
pub use types::*;

#[derive(Parser, Debug)]
#[command(version, about = "Merged upload feed for a list of YouTube channels", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate api docs in markdown format
    #[cfg(feature = "markdown-docs")]
    #[clap(hide = true)]
    MarkdownDocs {},

    /// Fetch new uploads if the refetch interval allows it.
    Refresh {
        /// Ignore the refetch interval.
        #[clap(short, long, default_value = "false")]
        force: bool,
    },

    /// Keep refreshing in the foreground until Ctrl+C.
    Watch {
        /// Seconds between refresh attempts. Defaults to `watch_interval_secs`.
        #[clap(short, long)]
        interval: Option<u64>,
    },

    /// Manage tracked channels
    Channel {
        #[clap(subcommand)]
        action: ChannelArgs,
    },

    /// Show the cached feed
    List {
        /// 1-based page number. Defaults to the last viewed page.
        #[clap(short, long)]
        page: Option<usize>,

        #[clap(flatten)]
        view: ViewArgs,

        /// Print the page as json
        #[clap(long, default_value = "false")]
        json: bool,
    },

    /// Mark a video as watched
    Watched {
        /// Video id
        id: String,

        /// Mark as not watched instead
        #[clap(long, default_value = "false", conflicts_with = "toggle")]
        unset: bool,

        /// Flip the current state
        #[clap(short, long, default_value = "false")]
        toggle: bool,
    },

    /// Show or change persisted settings
    Settings {
        #[clap(subcommand)]
        action: SettingsArgs,
    },

    /// Print a link that shares the tracked channel list
    Share {},

    /// Track every channel from a share link or a comma separated list
    Import {
        /// A share link or `handle1,handle2,...`
        #[clap(allow_hyphen_values = true)]
        input: String,
    },

    /// Show cache and refetch state
    Status {
        /// Print as json
        #[clap(long, default_value = "false")]
        json: bool,
    },
}
