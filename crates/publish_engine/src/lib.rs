//! Publish engine: collaborator IO, polling timers and effect execution.
mod api;
mod controller;
mod http;
mod scheduler;
mod types;
mod wire;

pub use api::PublishApi;
pub use controller::PublishController;
pub use http::{ApiSettings, ReqwestPublishApi};
pub use scheduler::{ManualScheduler, Scheduler, Tick, TokioScheduler, MIN_INTERVAL};
pub use types::{ApiError, ApiErrorKind};
