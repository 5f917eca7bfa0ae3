use hunter_core::{
    update, AppState, CrawlInput, DownloadFailure, Effect, JobState, MaxResults, Msg, Notice,
    RemoteStatus, StatusUpdate,
};
use pretty_assertions::assert_eq;

fn running_job(job_id: &str) -> AppState {
    let (state, _) = update(
        AppState::new(),
        Msg::StartRequested(CrawlInput::keyword("cats", MaxResults::clamped(50))),
    );
    let (state, _) = update(
        state,
        Msg::Submitted {
            ticket: 1,
            result: Ok(job_id.to_string()),
        },
    );
    state
}

fn tick(state: AppState, job_id: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::PollTick {
            job_id: job_id.to_string(),
        },
    )
}

fn status(
    state: AppState,
    job_id: &str,
    result: Result<StatusUpdate, String>,
) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::StatusFetched {
            job_id: job_id.to_string(),
            result,
        },
    )
}

fn reported(status: RemoteStatus, message: Option<&str>) -> Result<StatusUpdate, String> {
    Ok(StatusUpdate::new(status, message.map(str::to_string)))
}

fn done_job(job_id: &str) -> AppState {
    let (state, _) = tick(running_job(job_id), job_id);
    let (state, _) = status(state, job_id, reported(RemoteStatus::Done, Some("Downloaded images")));
    state
}

#[test]
fn tick_requests_status_once_while_in_flight() {
    let state = running_job("J1");

    let (state, effects) = tick(state, "J1");
    assert_eq!(
        effects,
        vec![Effect::FetchStatus {
            job_id: "J1".to_string()
        }]
    );

    // Response still outstanding: further ticks are skipped, not stacked.
    let (state, effects) = tick(state, "J1");
    assert!(effects.is_empty());
    let (state, effects) = tick(state, "J1");
    assert!(effects.is_empty());

    let (state, _) = status(state, "J1", reported(RemoteStatus::Running, None));
    let (_state, effects) = tick(state, "J1");
    assert_eq!(effects.len(), 1);
}

#[test]
fn running_status_updates_message_and_keeps_polling() {
    let (state, _) = tick(running_job("J1"), "J1");
    let (mut state, effects) = status(state, "J1", reported(RemoteStatus::Running, Some("page 1")));

    assert!(effects.is_empty());
    let view = state.view();
    assert_eq!(view.job.state, JobState::Running);
    assert_eq!(view.job.message.as_deref(), Some("page 1"));
    assert!(state.consume_dirty());

    // Same report again: nothing visible changed.
    let (state, _) = tick(state, "J1");
    let (mut state, _) = status(state, "J1", reported(RemoteStatus::Running, Some("page 1")));
    assert!(!state.consume_dirty());
}

#[test]
fn done_status_stops_polling() {
    let (state, _) = tick(running_job("J1"), "J1");
    let (state, effects) = status(state, "J1", reported(RemoteStatus::Done, Some("Downloaded images")));

    assert_eq!(
        effects,
        vec![Effect::StopPolling {
            job_id: "J1".to_string()
        }]
    );
    let view = state.view();
    assert_eq!(view.job.state, JobState::Done);
    assert_eq!(view.job.message.as_deref(), Some("Downloaded images"));

    let (_state, effects) = tick(state, "J1");
    assert_eq!(
        effects,
        vec![Effect::StopPolling {
            job_id: "J1".to_string()
        }]
    );
}

#[test]
fn error_status_fails_the_job() {
    let (state, _) = tick(running_job("J1"), "J1");
    let (state, effects) = status(
        state,
        "J1",
        reported(RemoteStatus::Error, Some("Pexels API error 429")),
    );

    assert_eq!(effects.len(), 1);
    let view = state.view();
    assert_eq!(view.job.state, JobState::Failed);
    assert_eq!(view.job.message.as_deref(), Some("Pexels API error 429"));
}

#[test]
fn transport_errors_keep_job_running() {
    let mut state = running_job("J1");
    for attempt in 0..25 {
        let (next, effects) = tick(state, "J1");
        assert_eq!(effects.len(), 1, "attempt {attempt}");
        let (next, effects) = status(next, "J1", Err("network error".to_string()));
        assert!(effects.is_empty());
        assert_eq!(next.view().job.state, JobState::Running);
        state = next;
    }

    let (state, _) = tick(state, "J1");
    let (state, _) = status(state, "J1", reported(RemoteStatus::Done, None));
    assert_eq!(state.view().job.state, JobState::Done);
}

#[test]
fn late_status_for_retired_job_is_ignored() {
    let (state, _) = tick(running_job("A"), "A");

    // New submission makes B current while A's status request is in flight.
    let (state, _) = update(
        state,
        Msg::StartRequested(CrawlInput::keyword("dogs", MaxResults::clamped(10))),
    );
    let (mut state, _) = update(
        state,
        Msg::Submitted {
            ticket: 2,
            result: Ok("B".to_string()),
        },
    );
    state.consume_dirty();
    let before = state.view();

    for late in [
        reported(RemoteStatus::Done, Some("A finished")),
        reported(RemoteStatus::Error, None),
        reported(RemoteStatus::Running, Some("A page 9")),
        Err("timeout".to_string()),
    ] {
        let (mut next, effects) = status(state.clone(), "A", late);
        assert!(effects.is_empty());
        assert_eq!(next.view(), before);
        assert!(!next.consume_dirty());
    }

    let (_state, effects) = tick(state, "A");
    assert_eq!(
        effects,
        vec![Effect::StopPolling {
            job_id: "A".to_string()
        }]
    );
}

#[test]
fn download_rejected_unless_done() {
    let (state, effects) = update(running_job("J1"), Msg::DownloadRequested);
    assert!(effects.is_empty());
    assert_eq!(state.view().notice, Some(Notice::DownloadRejected));

    let (state, effects) = update(AppState::new(), Msg::DownloadRequested);
    assert!(effects.is_empty());
    assert_eq!(state.view().job.state, JobState::Idle);
}

#[test]
fn download_link_is_recorded_on_done_job() {
    let (state, effects) = update(done_job("J1"), Msg::DownloadRequested);
    assert_eq!(
        effects,
        vec![Effect::FetchDownloadUrl {
            job_id: "J1".to_string()
        }]
    );

    let (state, _) = update(
        state,
        Msg::DownloadResolved {
            job_id: "J1".to_string(),
            result: Err(DownloadFailure::NotReady("images folder missing".to_string())),
        },
    );
    let view = state.view();
    assert_eq!(view.job.state, JobState::Done);
    assert_eq!(view.job.download_url, None);
    assert_eq!(
        view.notice,
        Some(Notice::DownloadNotReady("images folder missing".to_string()))
    );

    let (state, _) = update(state, Msg::DownloadRequested);
    let (state, _) = update(
        state,
        Msg::DownloadResolved {
            job_id: "J1".to_string(),
            result: Ok("http://localhost:8000/static/J1.zip".to_string()),
        },
    );
    let view = state.view();
    assert_eq!(view.job.state, JobState::Done);
    assert_eq!(
        view.job.download_url.as_deref(),
        Some("http://localhost:8000/static/J1.zip")
    );
    assert_eq!(view.notice, None);
}

#[test]
fn download_transport_failure_is_reported() {
    let (state, _) = update(done_job("J1"), Msg::DownloadRequested);
    let (state, _) = update(
        state,
        Msg::DownloadResolved {
            job_id: "J1".to_string(),
            result: Err(DownloadFailure::Transport("timeout".to_string())),
        },
    );
    assert_eq!(
        state.view().notice,
        Some(Notice::DownloadFailed("timeout".to_string()))
    );
    assert_eq!(state.view().job.download_url, None);
}

#[test]
fn download_link_for_retired_job_is_ignored() {
    let (state, _) = update(done_job("J1"), Msg::DownloadRequested);
    let (state, _) = update(state, Msg::ModeSwitched(hunter_core::Mode::Upload));
    let (state, _) = update(
        state,
        Msg::DownloadResolved {
            job_id: "J1".to_string(),
            result: Ok("http://localhost:8000/static/J1.zip".to_string()),
        },
    );
    assert_eq!(state.view().job.download_url, None);
    assert_eq!(state.view().job.state, JobState::Idle);
}
