use std::fmt;

use crate::input::{CrawlInput, MaxResults, Mode, Query, StagedImage, ValidationError};
use crate::view_model::{AppViewModel, JobSnapshot};

/// Opaque handle assigned by the remote service.
pub type JobId = String;

/// Local sequence number of a submission; identifies a job before the
/// remote id is known.
pub type Ticket = u64;

/// Lifecycle state reported to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Done,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Idle => write!(f, "idle"),
            JobState::Running => write!(f, "running"),
            JobState::Done => write!(f, "done"),
            JobState::Failed => write!(f, "failed"),
        }
    }
}

/// Status value returned by the remote status endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteStatus {
    Running,
    Done,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub status: RemoteStatus,
    pub message: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: RemoteStatus, message: Option<String>) -> Self {
        Self { status, message }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadFailure {
    /// The bundle is not staged yet; retrying later is expected to work.
    NotReady(String),
    Transport(String),
}

/// User-visible notices; informational, replaced by the next command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    CannotStart(ValidationError),
    SubmitFailed(String),
    DownloadNotReady(String),
    DownloadFailed(String),
    /// Download was requested while the job was not done.
    DownloadRejected,
}

/// The tracked crawl request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    ticket: Ticket,
    id: Option<JobId>,
    query: Query,
    max_results: MaxResults,
    state: JobState,
    message: Option<String>,
    download_url: Option<String>,
    poll_in_flight: bool,
}

impl Job {
    fn submitted(ticket: Ticket, query: Query, max_results: MaxResults) -> Self {
        Self {
            ticket,
            id: None,
            query,
            max_results,
            state: JobState::Running,
            message: None,
            download_url: None,
            poll_in_flight: false,
        }
    }

    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn mode(&self) -> Mode {
        self.query.mode()
    }

    pub fn query(&self) -> &Query {
        &self.query
    }

    pub fn max_results(&self) -> MaxResults {
        self.max_results
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }

    /// True until the remote service has acknowledged the submission.
    pub fn is_submitting(&self) -> bool {
        self.id.is_none()
    }

    fn has_id(&self, job_id: &str) -> bool {
        self.id.as_deref() == Some(job_id)
    }

    fn snapshot(&self) -> JobSnapshot {
        JobSnapshot {
            state: self.state,
            job_id: self.id.clone(),
            mode: Some(self.mode()),
            message: self.message.clone(),
            download_url: self.download_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollSlot {
    Claimed,
    InFlight,
    /// The job is no longer current or no longer running.
    Retired,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    form: CrawlInput,
    job: Option<Job>,
    last_ticket: Ticket,
    notice: Option<Notice>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            mode: self.form.mode,
            keyword: self.form.keyword.clone(),
            staged_image: self.form.image.as_ref().map(|img| img.file_name.clone()),
            max_results: self.form.max_results,
            job: self.job.as_ref().map(Job::snapshot).unwrap_or_default(),
            notice: self.notice.clone(),
            can_start: crate::can_start(self, &self.form),
        }
    }

    /// Returns whether the state changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn form(&self) -> &CrawlInput {
        &self.form
    }

    pub fn job(&self) -> Option<&Job> {
        self.job.as_ref()
    }

    pub fn job_state(&self) -> JobState {
        self.job.as_ref().map_or(JobState::Idle, Job::state)
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// True while a submission round trip is outstanding.
    pub fn submission_pending(&self) -> bool {
        self.job.as_ref().is_some_and(Job::is_submitting)
    }

    /// Whether `job_id` names the currently tracked job.
    pub fn is_current(&self, job_id: &str) -> bool {
        self.job.as_ref().is_some_and(|job| job.has_id(job_id))
    }

    /// Whether `ticket` names the currently tracked submission.
    pub fn is_current_ticket(&self, ticket: Ticket) -> bool {
        self.job.as_ref().is_some_and(|job| job.ticket == ticket)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn form_mut(&mut self) -> &mut CrawlInput {
        &mut self.form
    }

    pub(crate) fn set_notice(&mut self, notice: Option<Notice>) {
        if self.notice != notice {
            self.notice = notice;
            self.dirty = true;
        }
    }

    pub(crate) fn stage_image(&mut self, image: StagedImage) {
        self.form.image = Some(image);
        self.dirty = true;
    }

    /// Retires the current job and tracks a fresh submission for `query`.
    /// Returns the remote id of the retired job, if it had one.
    pub(crate) fn begin_submission(
        &mut self,
        query: Query,
        max_results: MaxResults,
    ) -> (Ticket, Option<JobId>) {
        let retired = self.job.take().and_then(|job| job.id);
        self.last_ticket += 1;
        let ticket = self.last_ticket;
        self.job = Some(Job::submitted(ticket, query, max_results));
        self.dirty = true;
        (ticket, retired)
    }

    /// Drops the current job and any staged upload; back to idle.
    pub(crate) fn reset(&mut self, mode: Mode) -> Option<JobId> {
        let retired = self.job.take().and_then(|job| job.id);
        self.form.mode = mode;
        self.form.image = None;
        self.notice = None;
        self.dirty = true;
        retired
    }

    pub(crate) fn submission_acknowledged(&mut self, ticket: Ticket, job_id: JobId) -> bool {
        match self.job.as_mut() {
            Some(job) if job.ticket == ticket && job.is_submitting() => {
                job.id = Some(job_id);
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn submission_failed(&mut self, ticket: Ticket, message: String) -> bool {
        if !self.job.as_ref().is_some_and(|job| job.ticket == ticket && job.is_submitting()) {
            return false;
        }
        self.job = None;
        self.notice = Some(Notice::SubmitFailed(message));
        self.dirty = true;
        true
    }

    /// Claims the poll slot for `job_id` so only one status request is in flight.
    pub(crate) fn claim_poll(&mut self, job_id: &str) -> PollSlot {
        let Some(job) = self.job.as_mut().filter(|job| job.has_id(job_id)) else {
            return PollSlot::Retired;
        };
        if job.state != JobState::Running {
            return PollSlot::Retired;
        }
        if job.poll_in_flight {
            return PollSlot::InFlight;
        }
        job.poll_in_flight = true;
        PollSlot::Claimed
    }

    /// Applies a status poll result to the current job. Returns `None` for a
    /// stale result, otherwise the job state after applying it.
    pub(crate) fn apply_status(
        &mut self,
        job_id: &str,
        result: Result<StatusUpdate, String>,
    ) -> Option<JobState> {
        let job = self.job.as_mut().filter(|job| job.has_id(job_id))?;
        job.poll_in_flight = false;
        if job.state != JobState::Running {
            return Some(job.state);
        }
        let Ok(update) = result else {
            return Some(job.state);
        };

        let next = match update.status {
            RemoteStatus::Running => JobState::Running,
            RemoteStatus::Done => JobState::Done,
            RemoteStatus::Error => JobState::Failed,
        };
        if job.message != update.message || job.state != next {
            job.message = update.message;
            job.state = next;
            self.dirty = true;
        }
        Some(next)
    }

    /// Remote id of the current job when it is done.
    pub(crate) fn done_job_id(&self) -> Option<JobId> {
        self.job
            .as_ref()
            .filter(|job| job.state == JobState::Done)
            .and_then(|job| job.id.clone())
    }

    pub(crate) fn apply_download(
        &mut self,
        job_id: &str,
        result: Result<String, DownloadFailure>,
    ) -> bool {
        let Some(job) = self
            .job
            .as_mut()
            .filter(|job| job.has_id(job_id) && job.state == JobState::Done)
        else {
            return false;
        };
        let notice = match result {
            Ok(url) => {
                job.download_url = Some(url);
                None
            }
            Err(DownloadFailure::NotReady(detail)) => Some(Notice::DownloadNotReady(detail)),
            Err(DownloadFailure::Transport(message)) => Some(Notice::DownloadFailed(message)),
        };
        self.notice = notice;
        self.dirty = true;
        true
    }
}
