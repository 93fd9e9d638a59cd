use std::sync::Once;
use std::time::Duration;

use publish_core::{
    update, Effect, LatestPublishRecord, Msg, PublishSnapshot, PublishState, PublishStatus,
    SessionPhase, StartFailure, StatusSnapshot, GENERIC_FAILURE_MESSAGE,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(publish_logging::initialize_for_tests);
}

fn selected(project_id: &str) -> PublishState {
    let (state, _) = update(
        PublishState::new(),
        Msg::ProjectSelected(Some(project_id.to_string())),
    );
    state
}

fn snapshot(status: PublishStatus) -> PublishSnapshot {
    PublishSnapshot {
        publish_id: "publish-1".to_string(),
        status,
        url: Some("https://cdn.example.com/site/index.html".to_string()),
        error_message: None,
    }
}

fn status(status: PublishStatus) -> StatusSnapshot {
    StatusSnapshot {
        status,
        url: Some("https://cdn.example.com/site/index.html".to_string()),
        error_message: None,
    }
}

fn started(state: PublishState, created: PublishStatus) -> (PublishState, Vec<Effect>) {
    let (state, _) = update(state, Msg::StartClicked);
    let epoch = state.epoch();
    update(
        state,
        Msg::PublishCreated {
            epoch,
            result: Ok(snapshot(created)),
        },
    )
}

#[test]
fn selecting_a_project_refreshes_server_state() {
    init_logging();
    let (state, effects) = update(
        PublishState::new(),
        Msg::ProjectSelected(Some("project-1".to_string())),
    );

    assert_eq!(state.epoch(), 1);
    assert_eq!(state.view().phase, SessionPhase::NoSession);
    assert_eq!(
        effects,
        vec![
            Effect::StopPolling,
            Effect::FetchLatest {
                epoch: 1,
                project_id: "project-1".to_string(),
            },
            Effect::FetchHistory {
                epoch: 1,
                project_id: "project-1".to_string(),
                limit: 20,
            },
            Effect::FetchPages {
                epoch: 1,
                project_id: "project-1".to_string(),
            },
        ]
    );
}

#[test]
fn start_requires_an_active_project() {
    init_logging();
    let (state, effects) = update(PublishState::new(), Msg::StartClicked);
    assert!(effects.is_empty());
    assert_eq!(state.view().phase, SessionPhase::NoSession);
}

#[test]
fn start_enters_starting_then_publishing_with_polling() {
    init_logging();
    let (state, effects) = update(selected("project-1"), Msg::StartClicked);
    assert_eq!(state.view().phase, SessionPhase::Starting);
    assert_eq!(
        effects,
        vec![Effect::CreatePublish {
            epoch: 1,
            project_id: "project-1".to_string(),
        }]
    );

    let (state, effects) = update(
        state,
        Msg::PublishCreated {
            epoch: 1,
            result: Ok(snapshot(PublishStatus::Publishing)),
        },
    );
    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Publishing);
    assert_eq!(view.publish_id.as_deref(), Some("publish-1"));
    assert_eq!(
        effects,
        vec![Effect::StartPolling {
            epoch: 1,
            every: Duration::from_millis(2000),
        }]
    );
}

#[test]
fn second_start_is_ignored_while_in_flight() {
    init_logging();
    let (state, _) = update(selected("project-1"), Msg::StartClicked);
    let (state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::PublishCreated {
            epoch: 1,
            result: Ok(snapshot(PublishStatus::Publishing)),
        },
    );
    let (_state, effects) = update(state, Msg::StartClicked);
    assert!(effects.is_empty());
}

#[test]
fn polling_stops_after_terminal_status() {
    init_logging();
    let (mut state, _) = started(selected("project-1"), PublishStatus::Publishing);
    let mut replies = vec![
        PublishStatus::Publishing,
        PublishStatus::Publishing,
        PublishStatus::Live,
    ]
    .into_iter();
    let mut status_requests = 0;

    for _ in 0..6 {
        let (next, effects) = update(state, Msg::PollTick { epoch: 1 });
        state = next;
        for effect in effects {
            if let Effect::FetchStatus { publish_id, .. } = effect {
                status_requests += 1;
                let reply = replies.next().expect("no request after terminal status");
                let (next, _) = update(
                    state,
                    Msg::StatusFetched {
                        epoch: 1,
                        publish_id,
                        result: Ok(status(reply)),
                    },
                );
                state = next;
            }
        }
    }

    assert_eq!(status_requests, 3);
    assert_eq!(state.view().phase, SessionPhase::Live);
}

#[test]
fn reaching_live_refreshes_latest_and_history() {
    init_logging();
    let (state, _) = started(selected("project-1"), PublishStatus::Publishing);
    let (state, _) = update(state, Msg::PollTick { epoch: 1 });
    let (state, effects) = update(
        state,
        Msg::StatusFetched {
            epoch: 1,
            publish_id: "publish-1".to_string(),
            result: Ok(status(PublishStatus::Live)),
        },
    );

    assert_eq!(state.view().url.as_deref(), Some("https://cdn.example.com/site/index.html"));
    assert_eq!(
        effects,
        vec![
            Effect::StopPolling,
            Effect::FetchLatest {
                epoch: 1,
                project_id: "project-1".to_string(),
            },
            Effect::FetchHistory {
                epoch: 1,
                project_id: "project-1".to_string(),
                limit: 20,
            },
        ]
    );
}

#[test]
fn ticks_while_a_poll_is_in_flight_do_not_issue_requests() {
    init_logging();
    let (state, _) = started(selected("project-1"), PublishStatus::Publishing);
    let (state, first) = update(state, Msg::PollTick { epoch: 1 });
    let (_state, second) = update(state, Msg::PollTick { epoch: 1 });
    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}

#[test]
fn synchronous_publish_jumps_straight_to_live() {
    init_logging();
    let (state, effects) = started(selected("project-1"), PublishStatus::Live);
    assert_eq!(state.view().phase, SessionPhase::Live);
    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::StartPolling { .. })));
    assert!(effects
        .iter()
        .any(|effect| matches!(effect, Effect::FetchLatest { .. })));
}

#[test]
fn failed_status_without_message_uses_generic_text() {
    init_logging();
    let (state, effects) = started(selected("project-1"), PublishStatus::Failed);
    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Failed);
    assert_eq!(view.error_message.as_deref(), Some(GENERIC_FAILURE_MESSAGE));
    assert!(effects.is_empty());
}

#[test]
fn transport_failure_during_poll_ends_in_failed() {
    init_logging();
    let (state, _) = started(selected("project-1"), PublishStatus::Publishing);
    let (state, _) = update(state, Msg::PollTick { epoch: 1 });
    let (state, effects) = update(
        state,
        Msg::StatusFetched {
            epoch: 1,
            publish_id: "publish-1".to_string(),
            result: Err("network error: connection refused".to_string()),
        },
    );

    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Failed);
    assert_eq!(
        view.error_message.as_deref(),
        Some("network error: connection refused")
    );
    assert_eq!(effects, vec![Effect::StopPolling]);

    let (_state, effects) = update(state, Msg::PollTick { epoch: 1 });
    assert!(effects.is_empty());
}

#[test]
fn preflight_failure_keeps_prior_status() {
    init_logging();
    let (state, _) = started(selected("project-1"), PublishStatus::Live);
    let before = state.session().clone();

    let (state, _) = update(state, Msg::StartClicked);
    let (state, effects) = update(
        state,
        Msg::PublishCreated {
            epoch: 1,
            result: Err(StartFailure::Preflight(vec![
                "Home page is missing".to_string(),
                "Page \"About\" has no title".to_string(),
            ])),
        },
    );

    assert!(effects.is_empty());
    assert_eq!(state.session(), &before);
    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Live);
    assert_eq!(view.preflight_details.len(), 2);
}

#[test]
fn generic_start_failure_moves_to_failed() {
    init_logging();
    let (state, _) = update(selected("project-1"), Msg::StartClicked);
    let (state, _) = update(
        state,
        Msg::PublishCreated {
            epoch: 1,
            result: Err(StartFailure::Failed("quota exceeded".to_string())),
        },
    );
    let view = state.view();
    assert_eq!(view.phase, SessionPhase::Failed);
    assert_eq!(view.error_message.as_deref(), Some("quota exceeded"));
    assert!(view.preflight_details.is_empty());
}

#[test]
fn next_start_clears_previous_preflight_details() {
    init_logging();
    let (state, _) = update(selected("project-1"), Msg::StartClicked);
    let (state, _) = update(
        state,
        Msg::PublishCreated {
            epoch: 1,
            result: Err(StartFailure::Preflight(vec!["Home page is missing".to_string()])),
        },
    );
    let (state, _) = update(state, Msg::StartClicked);
    assert!(state.view().preflight_details.is_empty());
}

#[test]
fn start_failure_keeps_live_publish_link() {
    init_logging();
    let (state, _) = update(
        selected("project-1"),
        Msg::LatestFetched {
            epoch: 1,
            result: Ok(Some(LatestPublishRecord {
                publish_id: "publish-0".to_string(),
                status: PublishStatus::Live,
                url: Some("https://cdn.example.com/publish-0/index.html".to_string()),
                error_message: None,
                published_at: Some("2026-03-01T10:00:00Z".to_string()),
            })),
        },
    );
    assert_eq!(state.view().phase, SessionPhase::Live);

    let (state, _) = update(state, Msg::StartClicked);
    let (state, effects) = update(
        state,
        Msg::PublishCreated {
            epoch: 1,
            result: Err(StartFailure::Failed("boom".to_string())),
        },
    );

    assert!(effects.is_empty());
    let session = state.session();
    assert_eq!(session.publish_id.as_deref(), Some("publish-0"));
    assert_eq!(
        session.url.as_deref(),
        Some("https://cdn.example.com/publish-0/index.html")
    );
    assert_eq!(session.status, Some(PublishStatus::Failed));
    assert_eq!(session.error_message.as_deref(), Some("boom"));
}
