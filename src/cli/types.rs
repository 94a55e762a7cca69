use clap::{Args as ClapArgs, Subcommand, ValueEnum};

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Hide videos of 62 seconds or less (remembered).
    #[clap(long, default_value = "false", conflicts_with = "show_shorts")]
    pub hide_shorts: bool,

    /// Show shorts again (remembered).
    #[clap(long, default_value = "false")]
    pub show_shorts: bool,

    /// Hide watched videos (remembered).
    #[clap(long, default_value = "false", conflicts_with = "show_watched")]
    pub hide_watched: bool,

    /// Show watched videos again (remembered).
    #[clap(long, default_value = "false")]
    pub show_watched: bool,
}

impl ViewArgs {
    /// `Some(hide)` when either flag of the pair was given.
    pub fn shorts(&self) -> Option<bool> {
        flag_pair(self.hide_shorts, self.show_shorts)
    }

    pub fn watched(&self) -> Option<bool> {
        flag_pair(self.hide_watched, self.show_watched)
    }
}

fn flag_pair(hide: bool, show: bool) -> Option<bool> {
    match (hide, show) {
        (true, _) => Some(true),
        (false, true) => Some(false),
        (false, false) => None,
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum ChannelArgs {
    /// Track a channel by its handle and fetch its uploads
    Add {
        /// Channel handle as shown on YouTube
        #[clap(allow_hyphen_values = true)]
        handle: String,
    },
    /// Stop tracking a channel and drop its cached videos
    Remove {
        #[clap(allow_hyphen_values = true)]
        handle: String,

        /// Auto confirm
        #[clap(short, long, default_value = "false")]
        yes: bool,
    },
    /// List tracked channels
    List {
        /// Print as json
        #[clap(long, default_value = "false")]
        json: bool,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    PerChannelItemCount,
    RetentionMonths,
    ApiKey,
    ViewMode,
    HideShorts,
    HideWatched,
    FilterTerms,
}

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsArgs {
    /// Print current settings
    Show {},
    /// Change one setting
    Set {
        #[clap(value_enum)]
        key: SettingKey,

        /// New value. Out of range numbers are ignored.
        #[clap(allow_hyphen_values = true)]
        value: String,
    },
}
