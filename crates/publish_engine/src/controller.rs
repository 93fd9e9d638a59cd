use std::future::Future;
use std::sync::Arc;

use publish_core::{
    update, Effect, Msg, PublishHistoryEntry, PublishState, PublishViewModel, SessionSettings,
    StartFailure,
};
use publish_logging::publish_debug;
use tokio::sync::mpsc;

use crate::{ApiError, ApiErrorKind, PublishApi, Scheduler};

enum Inbound {
    /// Completion of a request spawned for an effect.
    Reply(Msg),
    Timer(Msg),
}

/// Runs the publish state machine for one active project at a time.
///
/// Requests run as tokio tasks; their completions come back through a
/// channel and are applied one by one, so state is only ever touched from the
/// caller's task.
pub struct PublishController {
    state: PublishState,
    api: Arc<dyn PublishApi>,
    scheduler: Arc<dyn Scheduler>,
    inbound_tx: mpsc::UnboundedSender<Inbound>,
    inbound_rx: mpsc::UnboundedReceiver<Inbound>,
    in_flight: usize,
}

impl PublishController {
    pub fn new(
        api: Arc<dyn PublishApi>,
        scheduler: Arc<dyn Scheduler>,
        settings: SessionSettings,
    ) -> Self {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        Self {
            state: PublishState::with_settings(settings),
            api,
            scheduler,
            inbound_tx,
            inbound_rx,
            in_flight: 0,
        }
    }

    pub fn state(&self) -> &PublishState {
        &self.state
    }

    pub fn view(&self) -> PublishViewModel {
        self.state.view()
    }

    pub fn consume_dirty(&mut self) -> bool {
        self.state.consume_dirty()
    }

    /// Number of spawned requests whose reply has not been applied yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn select_project(&mut self, project_id: Option<String>) {
        self.dispatch(Msg::ProjectSelected(project_id));
    }

    pub fn start(&mut self) {
        self.dispatch(Msg::StartClicked);
    }

    pub fn make_live(&mut self, entry: PublishHistoryEntry) {
        self.dispatch(Msg::MakeLiveClicked(entry));
    }

    pub fn refresh(&mut self) {
        self.dispatch(Msg::RefreshRequested);
    }

    pub fn teardown(&mut self) {
        self.dispatch(Msg::TornDown);
    }

    pub fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in effects {
            self.run_effect(effect);
        }
    }

    /// Applies whatever has already arrived without waiting.
    pub fn drain(&mut self) {
        while let Ok(inbound) = self.inbound_rx.try_recv() {
            self.receive(inbound);
        }
    }

    /// Waits for the next reply or timer tick and applies it.
    ///
    /// Never completes while nothing is in flight and no timer is running.
    pub async fn step(&mut self) -> bool {
        match self.inbound_rx.recv().await {
            Some(inbound) => {
                self.receive(inbound);
                true
            }
            None => false,
        }
    }

    /// Applies replies until no request is outstanding.
    pub async fn settle(&mut self) {
        loop {
            self.drain();
            if self.in_flight == 0 || !self.step().await {
                return;
            }
        }
    }

    fn receive(&mut self, inbound: Inbound) {
        match inbound {
            Inbound::Reply(msg) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.dispatch(msg);
            }
            Inbound::Timer(msg) => self.dispatch(msg),
        }
    }

    fn run_effect(&mut self, effect: Effect) {
        publish_debug!("Running effect {:?}", effect);
        match effect {
            Effect::CreatePublish { epoch, project_id } => self.spawn_request(|api| async move {
                let result = api
                    .create_publish(&project_id)
                    .await
                    .map_err(start_failure);
                Msg::PublishCreated { epoch, result }
            }),
            Effect::FetchStatus {
                epoch,
                project_id,
                publish_id,
            } => self.spawn_request(|api| async move {
                let result = api
                    .get_publish_status(&project_id, &publish_id)
                    .await
                    .map_err(|err| err.user_message());
                Msg::StatusFetched {
                    epoch,
                    publish_id,
                    result,
                }
            }),
            Effect::StartPolling { epoch, every } => {
                let tx = self.inbound_tx.clone();
                self.scheduler.start(
                    every,
                    Box::new(move || {
                        let _ = tx.send(Inbound::Timer(Msg::PollTick { epoch }));
                    }),
                );
            }
            Effect::StopPolling => self.scheduler.stop(),
            Effect::FetchLatest { epoch, project_id } => self.spawn_request(|api| async move {
                let result = api
                    .get_latest_publish(&project_id)
                    .await
                    .map_err(|err| err.user_message());
                Msg::LatestFetched { epoch, result }
            }),
            Effect::FetchHistory {
                epoch,
                project_id,
                limit,
            } => self.spawn_request(|api| async move {
                let result = api
                    .list_publish_history(&project_id, limit)
                    .await
                    .map_err(|err| err.user_message());
                Msg::HistoryFetched { epoch, result }
            }),
            Effect::FetchPages { epoch, project_id } => self.spawn_request(|api| async move {
                let result = api
                    .list_pages(&project_id)
                    .await
                    .map_err(|err| err.user_message());
                Msg::PagesFetched { epoch, result }
            }),
            Effect::FetchProjects => self.spawn_request(|api| async move {
                let result = api.list_projects().await.map_err(|err| err.user_message());
                Msg::ProjectsFetched { result }
            }),
            Effect::SetLatest {
                epoch,
                project_id,
                entry,
            } => self.spawn_request(|api| async move {
                let result = api
                    .set_latest_publish(&project_id, &entry.publish_id)
                    .await
                    .map_err(|err| err.user_message());
                Msg::LatestSet {
                    epoch,
                    entry,
                    result,
                }
            }),
        }
    }

    fn spawn_request<F, Fut>(&mut self, request: F)
    where
        F: FnOnce(Arc<dyn PublishApi>) -> Fut,
        Fut: Future<Output = Msg> + Send + 'static,
    {
        let reply = request(Arc::clone(&self.api));
        let tx = self.inbound_tx.clone();
        self.in_flight += 1;
        tokio::spawn(async move {
            let msg = reply.await;
            let _ = tx.send(Inbound::Reply(msg));
        });
    }
}

impl Drop for PublishController {
    fn drop(&mut self) {
        self.scheduler.stop();
    }
}

fn start_failure(err: ApiError) -> StartFailure {
    match err.kind {
        ApiErrorKind::PreflightFailed { details } if details.is_empty() => {
            StartFailure::Preflight(vec![err.message])
        }
        ApiErrorKind::PreflightFailed { details } => StartFailure::Preflight(details),
        kind => StartFailure::Failed(ApiError::new(kind, err.message).user_message()),
    }
}
