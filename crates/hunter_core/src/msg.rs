use crate::{CrawlInput, DownloadFailure, JobId, Mode, StagedImage, StatusUpdate, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked a submission channel; discards the tracked job.
    ModeSwitched(Mode),
    /// User edited the keyword box.
    KeywordChanged(String),
    /// User edited the max-results box. Clamped on arrival.
    MaxResultsChanged(i64),
    /// User selected a reference image. Staging never submits.
    ImageStaged(StagedImage),
    ImageCleared,
    /// User asked to start a crawl with the given input.
    StartRequested(CrawlInput),
    /// Remote acknowledgement (or failure) of a submission.
    Submitted {
        ticket: Ticket,
        result: Result<JobId, String>,
    },
    /// Poll timer fired for a job.
    PollTick { job_id: JobId },
    /// Remote status for a job; `Err` is a transport failure.
    StatusFetched {
        job_id: JobId,
        result: Result<StatusUpdate, String>,
    },
    /// User clicked Download.
    DownloadRequested,
    /// Remote download-link resolution for a job.
    DownloadResolved {
        job_id: JobId,
        result: Result<String, DownloadFailure>,
    },
    NoticeDismissed,
    /// Fallback for placeholder wiring.
    NoOp,
}
