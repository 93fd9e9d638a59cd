use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Local};
use publish_core::{
    build_page_url, parse_base_url, NoticeLog, PageMeta, PublishHistoryEntry, PublishStatus,
    PublishViewModel, SessionPhase,
};
use publish_engine::{PublishController, ReqwestPublishApi, TokioScheduler};
use publish_logging::{publish_debug, publish_info, publish_warn};

use crate::config::AppConfig;

const EXIT_FAILED: u8 = 1;
const EXIT_PREFLIGHT: u8 = 2;
const EXIT_BUSY: u8 = 3;

fn build_controller(config: &AppConfig) -> Result<PublishController> {
    let api = ReqwestPublishApi::new(config.api_settings())
        .with_context(|| format!("invalid api base url {:?}", config.api_base_url))?;
    Ok(PublishController::new(
        Arc::new(api),
        Arc::new(TokioScheduler::new()),
        config.session_settings(),
    ))
}

fn required_project(config: &AppConfig) -> Result<String> {
    config
        .project_id
        .clone()
        .ok_or_else(|| anyhow!("no project selected; pass --project or set project_id"))
}

/// Selects the project and waits for its latest publish, history and pages.
async fn open_project(config: &AppConfig) -> Result<PublishController> {
    let project_id = required_project(config)?;
    let mut controller = build_controller(config)?;
    controller.select_project(Some(project_id));
    controller.settle().await;
    Ok(controller)
}

/// Prints each distinct progress change once; repeated errors are collapsed.
struct ProgressPrinter {
    notices: NoticeLog,
    last: Option<(SessionPhase, Option<String>)>,
}

impl ProgressPrinter {
    fn new() -> Self {
        Self {
            notices: NoticeLog::default(),
            last: None,
        }
    }

    fn render(&mut self, view: &PublishViewModel) {
        let current = (view.phase, view.publish_id.clone());
        if self.last.as_ref() != Some(&current) {
            match view.phase {
                SessionPhase::Starting => println!("Starting publish..."),
                SessionPhase::Publishing => println!(
                    "Publishing {}...",
                    view.publish_id.as_deref().unwrap_or("")
                ),
                SessionPhase::Live | SessionPhase::Failed | SessionPhase::NoSession => {}
            }
            self.last = Some(current);
        }

        if let Some(message) = view.last_error.as_deref() {
            if self.notices.admit(message, Instant::now()) {
                publish_warn!("{}", message);
                eprintln!("warning: {message}");
            }
        }
    }
}

pub async fn publish(config: &AppConfig) -> Result<ExitCode> {
    let mut controller = open_project(config).await?;
    let before = controller.view();
    if let Some(publish_id) = running_publish(&before) {
        eprintln!("Publish {publish_id} is already running; not starting another.");
        return Ok(ExitCode::from(EXIT_BUSY));
    }
    controller.start();

    let mut printer = ProgressPrinter::new();
    loop {
        if controller.consume_dirty() {
            printer.render(&controller.view());
        }
        if controller.in_flight() == 0 && !controller.state().is_polling() {
            break;
        }
        if !controller.step().await {
            break;
        }
    }
    let view = controller.view();
    controller.teardown();

    if !view.preflight_details.is_empty() {
        eprintln!("Publish blocked by preflight checks:");
        for detail in &view.preflight_details {
            eprintln!("  - {detail}");
        }
        return Ok(ExitCode::from(EXIT_PREFLIGHT));
    }

    match view.phase {
        SessionPhase::Live => {
            println!(
                "Live: {}",
                view.url.as_deref().unwrap_or("(no url reported)")
            );
            Ok(ExitCode::SUCCESS)
        }
        SessionPhase::Failed => {
            eprintln!(
                "Publish failed: {}",
                view.error_message.as_deref().unwrap_or("unknown error")
            );
            Ok(ExitCode::from(EXIT_FAILED))
        }
        phase => {
            publish_debug!("Publish ended in phase {:?}", phase);
            bail!("publish did not start for the selected project")
        }
    }
}

pub async fn status(config: &AppConfig) -> Result<ExitCode> {
    let controller = open_project(config).await?;
    let view = controller.view();
    report_last_error(&view);

    let Some(latest) = view.latest.as_ref() else {
        println!("Nothing published yet.");
        return Ok(ExitCode::SUCCESS);
    };

    println!("Publish:  {}", latest.publish_id);
    println!("Status:   {}", status_label(latest.status));
    if let Some(published_at) = latest.published_at.as_deref() {
        println!("Since:    {}", local_time(published_at));
    }
    if let Some(message) = latest.error_message.as_deref() {
        println!("Error:    {message}");
    }
    if let Some(url) = latest.url.as_deref() {
        println!("Url:      {url}");
        print_page_urls(url, &view.pages);
    }
    if view.has_unpublished_changes {
        println!("Pages were edited after this publish; run `publish` to update the site.");
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn history(config: &AppConfig) -> Result<ExitCode> {
    let controller = open_project(config).await?;
    let view = controller.view();
    report_last_error(&view);

    if view.history.is_empty() {
        println!("No publishes yet.");
        return Ok(ExitCode::SUCCESS);
    }

    let live_id = view.latest.as_ref().map(|record| record.publish_id.as_str());
    for entry in &view.history {
        let marker = if Some(entry.publish_id.as_str()) == live_id {
            "*"
        } else {
            " "
        };
        println!(
            "{marker} {:<24} {:<10} {:<20} {}",
            entry.publish_id,
            status_label(entry.status),
            local_time(&entry.created_at),
            entry.base_url
        );
    }
    Ok(ExitCode::SUCCESS)
}

pub async fn make_live(config: &AppConfig, publish_id: &str) -> Result<ExitCode> {
    let mut controller = open_project(config).await?;
    let view = controller.view();

    if view
        .latest
        .as_ref()
        .is_some_and(|record| record.publish_id == publish_id)
    {
        println!("{publish_id} is already live.");
        return Ok(ExitCode::SUCCESS);
    }

    let entry: PublishHistoryEntry = view
        .history
        .iter()
        .find(|entry| entry.publish_id == publish_id)
        .cloned()
        .ok_or_else(|| anyhow!("publish {publish_id} is not in the recent history"))?;

    controller.make_live(entry);
    controller.settle().await;

    let view = controller.view();
    let promoted = view
        .latest
        .as_ref()
        .is_some_and(|record| record.publish_id == publish_id);
    if promoted {
        publish_info!("Promoted {} to live", publish_id);
        println!("{publish_id} is now live.");
        return Ok(ExitCode::SUCCESS);
    }
    eprintln!(
        "Could not make {publish_id} live: {}",
        view.last_error.as_deref().unwrap_or("the live publish did not change")
    );
    Ok(ExitCode::from(EXIT_FAILED))
}

pub fn page_url(base_url: &str, slug: &str, is_home: bool) -> Result<ExitCode> {
    let locator = parse_base_url(base_url)
        .ok_or_else(|| anyhow!("{base_url} is not a publish url"))?;
    let url = build_page_url(&locator.page(slug, is_home))?;
    println!("{url}");
    Ok(ExitCode::SUCCESS)
}

/// A publish the server still reports as running blocks a new start.
fn running_publish(view: &PublishViewModel) -> Option<&str> {
    if view.phase == SessionPhase::Publishing {
        view.publish_id.as_deref().or(Some("(unknown)"))
    } else {
        None
    }
}

fn print_page_urls(live_url: &str, pages: &[PageMeta]) {
    let Some(locator) = parse_base_url(live_url) else {
        publish_debug!("Live url {} has no publish layout", live_url);
        return;
    };
    for page in pages {
        match build_page_url(&locator.page(page.slug.as_str(), page.is_home)) {
            Ok(url) => println!("  {:<20} {url}", display_slug(page)),
            Err(err) => publish_warn!("Skipping page {}: {}", page.id, err),
        }
    }
}

fn display_slug(page: &PageMeta) -> &str {
    if page.is_home || page.slug.is_empty() {
        "(home)"
    } else {
        &page.slug
    }
}

fn report_last_error(view: &PublishViewModel) {
    if let Some(message) = view.last_error.as_deref() {
        eprintln!("warning: {message}");
    }
}

fn status_label(status: PublishStatus) -> &'static str {
    match status {
        PublishStatus::Publishing => "publishing",
        PublishStatus::Live => "live",
        PublishStatus::Failed => "failed",
    }
}

fn local_time(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(parsed) => parsed
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        Err(_) => timestamp.to_string(),
    }
}
