//! Publish core: URL codec, pure publish-session state machine and
//! view-model helpers.
mod effect;
mod msg;
mod notice;
mod staleness;
mod state;
mod types;
mod update;
mod url_codec;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use notice::{NoticeLog, DEFAULT_NOTICE_WINDOW};
pub use staleness::has_unpublished_changes;
pub use state::{
    PublishState, SessionSettings, DEFAULT_HISTORY_LIMIT, DEFAULT_POLL_INTERVAL,
    GENERIC_FAILURE_MESSAGE,
};
pub use types::{
    Epoch, LatestPublishRecord, PageMeta, ProjectSummary, PublishHistoryEntry, PublishSession,
    PublishSnapshot, PublishStatus, StartFailure, StatusSnapshot,
};
pub use update::update;
pub use url_codec::{
    build_base_url, build_index_url, build_page_url, parse_base_url, CodecError, PublishLocator,
    PublishPageRef, SITES_SEGMENT,
};
pub use view_model::{PublishViewModel, SessionPhase};
