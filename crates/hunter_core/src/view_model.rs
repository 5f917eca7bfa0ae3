use crate::{JobId, JobState, MaxResults, Mode, Notice};

/// What the presentation layer needs to render the tracked job.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JobSnapshot {
    pub state: JobState,
    pub job_id: Option<JobId>,
    pub mode: Option<Mode>,
    pub message: Option<String>,
    pub download_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub mode: Mode,
    pub keyword: String,
    /// File name of the staged upload, if any.
    pub staged_image: Option<String>,
    pub max_results: MaxResults,
    pub job: JobSnapshot,
    pub notice: Option<Notice>,
    pub can_start: bool,
}
