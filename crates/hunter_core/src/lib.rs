//! Image hunter core: pure job lifecycle state machine and view-model helpers.
mod effect;
mod input;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use input::{
    CrawlInput, MaxResults, Mode, Query, StagedImage, ValidationError, DEFAULT_MAX_RESULTS,
    MAX_RESULTS, MIN_RESULTS,
};
pub use msg::Msg;
pub use state::{
    AppState, DownloadFailure, Job, JobId, JobState, Notice, RemoteStatus, StatusUpdate, Ticket,
};
pub use update::{can_start, update};
pub use view_model::{AppViewModel, JobSnapshot};
