use std::time::Duration;

use crate::{
    app::{
        service::{FeedService, RefreshOutcome},
        task_runner,
    },
    catalog::CatalogClient,
    feed::{policy::FetchScope, videos::Video},
    settings::ViewMode,
};

use super::{
    errors::{CliError, CliResult},
    types::{ChannelArgs, SettingKey, SettingsArgs, ViewArgs},
};

pub fn handle_refresh<C: CatalogClient>(service: &FeedService<C>, force: bool) -> CliResult<()> {
    let outcome = service.refresh(force)?;
    print_outcome(&outcome);
    Ok(())
}

pub fn handle_watch<C: CatalogClient>(
    service: &FeedService<C>,
    interval: Option<u64>,
) -> anyhow::Result<()> {
    let interval = interval
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .unwrap_or_else(|| service.config().watch_interval());

    task_runner::cancel_on_ctrlc(service.cancel_token())?;
    task_runner::watch(service, interval)
}

pub fn handle_channel<C: CatalogClient>(
    service: &FeedService<C>,
    action: ChannelArgs,
) -> CliResult<()> {
    match action {
        ChannelArgs::Add { handle } => {
            let outcome = service.add_channel(&handle)?;
            if matches!(outcome, RefreshOutcome::NothingToFetch) {
                println!("\"{}\" is already tracked", handle.trim());
            } else {
                print_outcome(&outcome);
            }
        }
        ChannelArgs::Remove { handle, yes } => {
            let handle = handle.trim().to_string();
            if !service.channels()?.iter().any(|c| c.human_readable == handle) {
                return Err(CliError::invalid_input(format!("\"{handle}\" is not tracked")));
            }

            if !yes {
                let cached = service
                    .videos()?
                    .iter()
                    .filter(|v| v.source_channel_key == handle)
                    .count();
                let confirmed = inquire::prompt_confirmation(format!(
                    "Remove \"{handle}\" and its {cached} cached videos?"
                ))?;
                if !confirmed {
                    return Err(CliError::UserCancelled);
                }
            }

            service.remove_channel(&handle)?;
            println!("removed \"{handle}\"");
        }
        ChannelArgs::List { json } => {
            let channels = service.channels()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&channels)?);
                return Ok(());
            }
            for channel in channels {
                match channel.resolution.channel_id() {
                    Some(id) if channel.is_resolved() => {
                        println!("{}  {id}", channel.human_readable)
                    }
                    Some(id) => println!("{}  {id} (uploads unknown)", channel.human_readable),
                    None => println!("{}  (unresolved)", channel.human_readable),
                }
            }
        }
    }
    Ok(())
}

pub fn handle_list<C: CatalogClient>(
    service: &FeedService<C>,
    page: Option<usize>,
    view: ViewArgs,
    json: bool,
) -> CliResult<()> {
    if let Some(hide) = view.shorts() {
        service.set_hide_shorts(hide)?;
    }
    if let Some(hide) = view.watched() {
        service.set_hide_watched(hide)?;
    }

    let page = service.page(page)?;
    if json || service.settings().view_mode == ViewMode::Json {
        println!("{}", serde_json::to_string_pretty(&page)?);
        return Ok(());
    }

    for video in &page.videos {
        println!("{}", format_video(video));
    }
    println!(
        "page {}/{} ({} videos)",
        page.page, page.total_pages, page.total_items
    );
    Ok(())
}

pub fn handle_watched<C: CatalogClient>(
    service: &FeedService<C>,
    id: &str,
    unset: bool,
    toggle: bool,
) -> CliResult<()> {
    let watched = if toggle {
        service.toggle_watched(id)?
    } else {
        service.set_watched(id, !unset)?;
        !unset
    };

    println!("{id}: {}", if watched { "watched" } else { "not watched" });
    Ok(())
}

pub fn handle_settings<C: CatalogClient>(
    service: &FeedService<C>,
    action: SettingsArgs,
) -> CliResult<()> {
    match action {
        SettingsArgs::Show {} => {
            println!("{}", serde_json::to_string_pretty(&service.settings())?);
        }
        SettingsArgs::Set { key, value } => {
            let changed = match key {
                SettingKey::PerChannelItemCount => service.set_per_channel_item_count(&value)?,
                SettingKey::RetentionMonths => service.set_retention_months(&value)?,
                SettingKey::ApiKey => {
                    service.set_api_key(&value)?;
                    true
                }
                SettingKey::ViewMode => {
                    let mode = match value.trim().to_lowercase().as_str() {
                        "list" => ViewMode::List,
                        "json" => ViewMode::Json,
                        other => {
                            return Err(CliError::invalid_input(format!(
                                "unknown view mode {other:?}, expected list or json"
                            )))
                        }
                    };
                    service.set_view_mode(mode)?;
                    true
                }
                SettingKey::HideShorts => {
                    service.set_hide_shorts(parse_bool(&value)?)?;
                    true
                }
                SettingKey::HideWatched => {
                    service.set_hide_watched(parse_bool(&value)?)?;
                    true
                }
                SettingKey::FilterTerms => {
                    service.set_filter_terms(&value)?;
                    true
                }
            };

            if !changed {
                println!("value {value:?} ignored, setting unchanged");
            }
        }
    }
    Ok(())
}

pub fn handle_share<C: CatalogClient>(service: &FeedService<C>) -> CliResult<()> {
    println!("{}", service.share_link()?);
    Ok(())
}

pub fn handle_import<C: CatalogClient>(service: &FeedService<C>, input: &str) -> CliResult<()> {
    let outcome = service.import_shared(input)?;
    if outcome.added.is_empty() {
        println!("no new channels");
        return Ok(());
    }

    println!("added {}", outcome.added.join(", "));
    print_outcome(&outcome.refresh);
    Ok(())
}

pub fn handle_status<C: CatalogClient>(service: &FeedService<C>, json: bool) -> CliResult<()> {
    let status = service.status()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "channels: {} ({} unresolved)",
        status.channels, status.unresolved_channels
    );
    println!(
        "videos: {} ({} unwatched)",
        status.videos, status.unwatched_videos
    );
    match status.last_fetch {
        Some(at) => println!("last fetch: {}", at.to_rfc3339()),
        None => println!("last fetch: never"),
    }
    if let Some(at) = status.next_eligible_fetch {
        println!("next fetch: {}", at.to_rfc3339());
    }
    println!(
        "per channel: {}, retention: {} months",
        status.per_channel_item_count, status.retention_months
    );
    Ok(())
}

fn print_outcome(outcome: &RefreshOutcome) {
    match outcome {
        RefreshOutcome::Fetched(summary) => {
            let scope = match summary.scope {
                FetchScope::Full => "all",
                FetchScope::Partial => "some",
            };
            println!(
                "fetched {} videos from {} channels ({scope} tracked, {}), {} cached",
                summary.fetched, summary.channels, summary.reason, summary.total
            );
            for failure in &summary.failures {
                println!("  {}: {}", failure.channel, failure.error);
            }
            if summary.cancelled {
                println!("interrupted, partial batch saved");
            }
        }
        RefreshOutcome::Skipped { remaining } => {
            println!(
                "up to date, next fetch in {}m",
                (remaining.num_seconds() + 59) / 60
            );
        }
        RefreshOutcome::Busy => println!("fetch already in progress"),
        RefreshOutcome::NothingToFetch => println!("nothing to fetch"),
    }
}

fn format_video(video: &Video) -> String {
    let minutes = video.duration_seconds / 60;
    let seconds = video.duration_seconds % 60;
    format!(
        "[{}] {}  {:<20}  {} ({minutes}:{seconds:02}){}  {}",
        if video.has_been_watched { "x" } else { " " },
        video.published_at.format("%Y-%m-%d"),
        video.channel_title,
        video.title,
        if video.is_short { " short" } else { "" },
        video.watch_url(),
    )
}

fn parse_bool(raw: &str) -> CliResult<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(CliError::invalid_input(format!("{other:?} is not a boolean"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn parse_bool_accepts_common_spellings() {
        assert!(parse_bool("Yes").unwrap());
        assert!(!parse_bool(" off ").unwrap());
        assert!(parse_bool("maybe").is_err());
    }

    #[test]
    fn format_video_marks_watched_and_shorts() {
        let published = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut video = Video::new("abc", "Hello", published, "Chan", "UC1", 61);
        video.has_been_watched = true;

        let line = format_video(&video);
        assert!(line.starts_with("[x] 2024-05-01"));
        assert!(line.contains("Hello (1:01) short"));
        assert!(line.ends_with("abc"));
    }
}
