use publish_logging::{publish_debug, publish_info, publish_warn};

use crate::{Effect, Epoch, Msg, PublishState, PublishStatus, StartFailure};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: PublishState, msg: Msg) -> (PublishState, Vec<Effect>) {
    if let Some(epoch) = reply_epoch(&msg) {
        if !state.is_current(epoch) {
            publish_debug!(
                "Dropping stale reply epoch={} current={}",
                epoch,
                state.epoch()
            );
            return (state, Vec::new());
        }
    }

    let effects = match msg {
        Msg::ProjectSelected(project_id) => {
            if state.project_id() == project_id.as_deref() {
                return (state, Vec::new());
            }
            publish_info!("Active project changed to {:?}", project_id);
            state.switch_project(project_id);
            let mut effects = vec![Effect::StopPolling];
            effects.extend(refresh_effects(&state));
            effects
        }
        Msg::StartClicked => {
            let Some(project_id) = state.project_id().map(ToOwned::to_owned) else {
                publish_warn!("Start ignored: no active project");
                return (state, Vec::new());
            };
            if !state.can_start() {
                publish_debug!("Start ignored: publish already in flight for {}", project_id);
                return (state, Vec::new());
            }
            state.begin_start();
            vec![Effect::CreatePublish {
                epoch: state.epoch(),
                project_id,
            }]
        }
        Msg::MakeLiveClicked(entry) => {
            let Some(project_id) = state.project_id().map(ToOwned::to_owned) else {
                return (state, Vec::new());
            };
            if state.latest_publish_id() == Some(entry.publish_id.as_str()) {
                publish_debug!("Publish {} is already live", entry.publish_id);
                return (state, Vec::new());
            }
            if state.is_promoting() {
                return (state, Vec::new());
            }
            state.begin_promote(entry.publish_id.clone());
            vec![Effect::SetLatest {
                epoch: state.epoch(),
                project_id,
                entry,
            }]
        }
        Msg::RefreshRequested => refresh_effects(&state),
        Msg::PollTick { .. } => {
            // Interval ticks race with slow replies; only one request at a time.
            if !state.is_polling() || state.poll_in_flight() {
                return (state, Vec::new());
            }
            let (Some(project_id), Some(publish_id)) = (
                state.project_id().map(ToOwned::to_owned),
                state.session().publish_id.clone(),
            ) else {
                return (state, Vec::new());
            };
            state.begin_poll();
            vec![Effect::FetchStatus {
                epoch: state.epoch(),
                project_id,
                publish_id,
            }]
        }
        Msg::PublishCreated { result, .. } => {
            if !state.is_starting() {
                return (state, Vec::new());
            }
            match result {
                Ok(snapshot) => {
                    publish_info!(
                        "Publish {} created with status {:?}",
                        snapshot.publish_id,
                        snapshot.status
                    );
                    let status = snapshot.status;
                    state.apply_created(snapshot);
                    match status {
                        PublishStatus::Publishing => vec![Effect::StartPolling {
                            epoch: state.epoch(),
                            every: state.settings().poll_interval,
                        }],
                        PublishStatus::Live => live_refresh_effects(&state),
                        PublishStatus::Failed => Vec::new(),
                    }
                }
                Err(StartFailure::Preflight(details)) => {
                    publish_warn!("Publish blocked by {} preflight issue(s)", details.len());
                    state.apply_preflight(details);
                    Vec::new()
                }
                Err(StartFailure::Failed(message)) => {
                    publish_warn!("Publish could not start: {}", message);
                    state.apply_start_failed(message);
                    Vec::new()
                }
            }
        }
        Msg::StatusFetched {
            publish_id, result, ..
        } => {
            state.finish_poll();
            if !state.is_polling()
                || state.session().publish_id.as_deref() != Some(publish_id.as_str())
            {
                return (state, Vec::new());
            }
            match result {
                Ok(snapshot) => {
                    let status = snapshot.status;
                    state.apply_status(snapshot);
                    match status {
                        PublishStatus::Publishing => Vec::new(),
                        PublishStatus::Live => {
                            publish_info!("Publish {} is live", publish_id);
                            let mut effects = vec![Effect::StopPolling];
                            effects.extend(live_refresh_effects(&state));
                            effects
                        }
                        PublishStatus::Failed => {
                            publish_warn!("Publish {} failed", publish_id);
                            vec![Effect::StopPolling]
                        }
                    }
                }
                Err(message) => {
                    publish_warn!("Status poll for {} failed: {}", publish_id, message);
                    state.apply_poll_failure(message);
                    vec![Effect::StopPolling]
                }
            }
        }
        Msg::LatestFetched { result, .. } => match result {
            Ok(record) => {
                let was_polling = state.is_polling();
                state.apply_latest(record);
                // A publish started elsewhere is still running; follow it.
                if !was_polling && state.is_polling() {
                    publish_info!("Latest publish is still running, polling it");
                    vec![Effect::StartPolling {
                        epoch: state.epoch(),
                        every: state.settings().poll_interval,
                    }]
                } else {
                    Vec::new()
                }
            }
            Err(message) => {
                publish_warn!("Latest publish refresh failed: {}", message);
                state.set_last_error(message);
                Vec::new()
            }
        },
        Msg::HistoryFetched { result, .. } => {
            match result {
                Ok(history) => state.set_history(history),
                Err(message) => {
                    publish_warn!("History refresh failed: {}", message);
                    state.set_last_error(message);
                }
            }
            Vec::new()
        }
        Msg::PagesFetched { result, .. } => {
            match result {
                Ok(pages) => state.set_pages(pages),
                Err(message) => {
                    publish_warn!("Page list refresh failed: {}", message);
                    state.set_last_error(message);
                }
            }
            Vec::new()
        }
        Msg::ProjectsFetched { result } => {
            match result {
                Ok(projects) => state.set_projects(projects),
                Err(message) => {
                    publish_warn!("Project list refresh failed: {}", message);
                    state.set_last_error(message);
                }
            }
            Vec::new()
        }
        Msg::LatestSet { entry, result, .. } => {
            state.finish_promote();
            match result {
                Ok(()) => {
                    publish_info!("Publish {} promoted to live", entry.publish_id);
                    let was_polling = state.is_polling();
                    state.apply_promoted(entry);
                    let mut effects = Vec::with_capacity(4);
                    if was_polling {
                        effects.push(Effect::StopPolling);
                    }
                    effects.extend(live_refresh_effects(&state));
                    effects.push(Effect::FetchProjects);
                    effects
                }
                Err(message) => {
                    publish_warn!("Promoting {} failed: {}", entry.publish_id, message);
                    state.set_last_error(message);
                    Vec::new()
                }
            }
        }
        Msg::TornDown => {
            state.switch_project(None);
            vec![Effect::StopPolling]
        }
    };

    (state, effects)
}

fn reply_epoch(msg: &Msg) -> Option<Epoch> {
    match msg {
        Msg::PollTick { epoch }
        | Msg::PublishCreated { epoch, .. }
        | Msg::StatusFetched { epoch, .. }
        | Msg::LatestFetched { epoch, .. }
        | Msg::HistoryFetched { epoch, .. }
        | Msg::PagesFetched { epoch, .. }
        | Msg::LatestSet { epoch, .. } => Some(*epoch),
        _ => None,
    }
}

fn refresh_effects(state: &PublishState) -> Vec<Effect> {
    let Some(project_id) = state.project_id() else {
        return Vec::new();
    };
    vec![
        Effect::FetchLatest {
            epoch: state.epoch(),
            project_id: project_id.to_owned(),
        },
        Effect::FetchHistory {
            epoch: state.epoch(),
            project_id: project_id.to_owned(),
            limit: state.settings().history_limit,
        },
        Effect::FetchPages {
            epoch: state.epoch(),
            project_id: project_id.to_owned(),
        },
    ]
}

fn live_refresh_effects(state: &PublishState) -> Vec<Effect> {
    let Some(project_id) = state.project_id() else {
        return Vec::new();
    };
    vec![
        Effect::FetchLatest {
            epoch: state.epoch(),
            project_id: project_id.to_owned(),
        },
        Effect::FetchHistory {
            epoch: state.epoch(),
            project_id: project_id.to_owned(),
            limit: state.settings().history_limit,
        },
    ]
}
