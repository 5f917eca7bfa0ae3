use hunter_core::{AppViewModel, JobState, Notice};

/// One line describing the tracked job, e.g. `[J1] running: page 2`.
pub fn status_line(view: &AppViewModel) -> String {
    let job = &view.job;
    let label = job_label(job.job_id.as_deref());
    let state = match job.state {
        JobState::Running if job.job_id.is_none() => "submitting".to_string(),
        other => other.to_string(),
    };
    match &job.message {
        Some(message) => format!("[{label}] {state}: {message}"),
        None => format!("[{label}] {state}"),
    }
}

/// Job identity for status lines, `-` while the remote id is not known yet.
fn job_label(job_id: Option<&str>) -> &str {
    job_id.unwrap_or("-")
}

pub fn notice_text(notice: &Notice) -> String {
    match notice {
        Notice::CannotStart(reason) => format!("cannot start: {reason}"),
        Notice::SubmitFailed(detail) => format!("submission failed: {detail}"),
        Notice::DownloadNotReady(detail) => format!("bundle not ready yet: {detail}"),
        Notice::DownloadFailed(detail) => format!("download link request failed: {detail}"),
        Notice::DownloadRejected => "download is only available once the job is done".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hunter_core::{JobSnapshot, Mode, ValidationError};

    fn view(state: JobState, job_id: Option<&str>, message: Option<&str>) -> AppViewModel {
        AppViewModel {
            job: JobSnapshot {
                state,
                job_id: job_id.map(str::to_string),
                mode: Some(Mode::Text),
                message: message.map(str::to_string),
                download_url: None,
            },
            ..AppViewModel::default()
        }
    }

    #[test]
    fn pending_submission_has_no_label() {
        assert_eq!(
            status_line(&view(JobState::Running, None, None)),
            "[-] submitting"
        );
    }

    #[test]
    fn job_label_falls_back_to_dash() {
        assert_eq!(job_label(Some("J1")), "J1");
        assert_eq!(job_label(None), "-");
    }

    #[test]
    fn message_follows_state() {
        assert_eq!(
            status_line(&view(JobState::Running, Some("J1"), Some("page 2"))),
            "[J1] running: page 2"
        );
        assert_eq!(
            status_line(&view(JobState::Failed, Some("J1"), Some("Pexels API error 429"))),
            "[J1] failed: Pexels API error 429"
        );
        assert_eq!(status_line(&view(JobState::Done, Some("J1"), None)), "[J1] done");
    }

    #[test]
    fn notices_read_as_sentences() {
        assert_eq!(
            notice_text(&Notice::CannotStart(ValidationError::EmptyKeyword)),
            "cannot start: keyword is empty"
        );
        assert_eq!(
            notice_text(&Notice::DownloadNotReady("Images folder not found".to_string())),
            "bundle not ready yet: Images folder not found"
        );
    }
}
