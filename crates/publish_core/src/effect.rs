use std::time::Duration;

use crate::{Epoch, PublishHistoryEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    CreatePublish {
        epoch: Epoch,
        project_id: String,
    },
    FetchStatus {
        epoch: Epoch,
        project_id: String,
        publish_id: String,
    },
    StartPolling {
        epoch: Epoch,
        every: Duration,
    },
    StopPolling,
    FetchLatest {
        epoch: Epoch,
        project_id: String,
    },
    FetchHistory {
        epoch: Epoch,
        project_id: String,
        limit: usize,
    },
    FetchPages {
        epoch: Epoch,
        project_id: String,
    },
    FetchProjects,
    SetLatest {
        epoch: Epoch,
        project_id: String,
        entry: PublishHistoryEntry,
    },
}
