use crate::{
    Epoch, LatestPublishRecord, PageMeta, ProjectSummary, PublishHistoryEntry, PublishSnapshot,
    StartFailure, StatusSnapshot,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a different active project (or cleared the selection).
    ProjectSelected(Option<String>),
    /// User asked for a fresh publish of the active project.
    StartClicked,
    /// User asked to promote a historical publish to live.
    MakeLiveClicked(PublishHistoryEntry),
    /// User asked to re-read server state for the active project.
    RefreshRequested,
    /// Polling interval elapsed.
    PollTick { epoch: Epoch },
    PublishCreated {
        epoch: Epoch,
        result: Result<PublishSnapshot, StartFailure>,
    },
    StatusFetched {
        epoch: Epoch,
        publish_id: String,
        result: Result<StatusSnapshot, String>,
    },
    LatestFetched {
        epoch: Epoch,
        result: Result<Option<LatestPublishRecord>, String>,
    },
    HistoryFetched {
        epoch: Epoch,
        result: Result<Vec<PublishHistoryEntry>, String>,
    },
    PagesFetched {
        epoch: Epoch,
        result: Result<Vec<PageMeta>, String>,
    },
    /// The project list is not scoped to the active project.
    ProjectsFetched {
        result: Result<Vec<ProjectSummary>, String>,
    },
    LatestSet {
        epoch: Epoch,
        entry: PublishHistoryEntry,
        result: Result<(), String>,
    },
    /// Owner of the controller is going away.
    TornDown,
}
