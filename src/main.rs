use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod catalog;
mod cli;
mod config;
mod feed;
mod lock;
mod settings;
mod storage;
#[cfg(test)]
mod tests;

use app::AppFactory;

fn init_logging() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries command output, logs go to stderr
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();
    init_logging()?;

    #[cfg(feature = "markdown-docs")]
    if let cli::Command::MarkdownDocs {} = args.command {
        clap_markdown::print_help_markdown::<cli::Args>();
        return Ok(());
    }

    let paths = AppFactory::get_paths()?;
    let service = AppFactory::create_feed_service(&paths)?;

    let result = match args.command {
        #[cfg(feature = "markdown-docs")]
        cli::Command::MarkdownDocs {} => Ok(()),

        cli::Command::Refresh { force } => cli::handle_refresh(&service, force),
        cli::Command::Watch { interval } => return cli::handle_watch(&service, interval),
        cli::Command::Channel { action } => cli::handle_channel(&service, action),
        cli::Command::List { page, view, json } => cli::handle_list(&service, page, view, json),
        cli::Command::Watched { id, unset, toggle } => {
            cli::handle_watched(&service, &id, unset, toggle)
        }
        cli::Command::Settings { action } => cli::handle_settings(&service, action),
        cli::Command::Share {} => cli::handle_share(&service),
        cli::Command::Import { input } => cli::handle_import(&service, &input),
        cli::Command::Status { json } => cli::handle_status(&service, json),
    };

    match result {
        Ok(()) | Err(cli::CliError::UserCancelled) => Ok(()),
        Err(err) => Err(err.into()),
    }
}
