use crate::{JobId, MaxResults, StagedImage, Ticket};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitKeyword {
        ticket: Ticket,
        keyword: String,
        max_results: MaxResults,
    },
    SubmitUpload {
        ticket: Ticket,
        image: StagedImage,
        max_results: MaxResults,
    },
    StartPolling { job_id: JobId },
    StopPolling { job_id: JobId },
    FetchStatus { job_id: JobId },
    FetchDownloadUrl { job_id: JobId },
}
