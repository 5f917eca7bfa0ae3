use hunter_logging::{hunter_debug, hunter_info, hunter_trace, hunter_warn};

use crate::state::PollSlot;
use crate::{AppState, CrawlInput, Effect, JobState, MaxResults, Msg, Notice, Query};

/// Pure gate for the start control.
///
/// The input must satisfy the preconditions of its mode, and no submission
/// round trip may be outstanding. A running or finished job does not block a
/// new start; starting retires it.
pub fn can_start(state: &AppState, input: &CrawlInput) -> bool {
    input.check().is_ok() && !state.submission_pending()
}

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ModeSwitched(mode) => {
            let retired = state.reset(mode);
            hunter_debug!("mode switched to {mode}; tracked job cleared");
            retired
                .map(|job_id| Effect::StopPolling { job_id })
                .into_iter()
                .collect()
        }
        Msg::KeywordChanged(keyword) => {
            if state.form().keyword != keyword {
                state.form_mut().keyword = keyword;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::MaxResultsChanged(raw) => {
            let clamped = MaxResults::clamped(raw);
            if state.form().max_results != clamped {
                state.form_mut().max_results = clamped;
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ImageStaged(image) => {
            state.stage_image(image);
            Vec::new()
        }
        Msg::ImageCleared => {
            if state.form_mut().image.take().is_some() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::StartRequested(input) => start(&mut state, input),
        Msg::Submitted { ticket, result } => {
            match result {
                Ok(job_id) => {
                    if state.submission_acknowledged(ticket, job_id.clone()) {
                        hunter_info!("submission {ticket} accepted as job {job_id}");
                        return (state, vec![Effect::StartPolling { job_id }]);
                    }
                    hunter_debug!("ignoring acknowledgement of retired submission {ticket} ({job_id})");
                }
                Err(message) => {
                    if state.submission_failed(ticket, message.clone()) {
                        hunter_warn!("submission {ticket} failed: {message}");
                    } else {
                        hunter_debug!("ignoring failure of retired submission {ticket}: {message}");
                    }
                }
            }
            Vec::new()
        }
        Msg::PollTick { job_id } => match state.claim_poll(&job_id) {
            PollSlot::Claimed => vec![Effect::FetchStatus { job_id }],
            PollSlot::InFlight => {
                hunter_trace!("status request for job {job_id} still in flight; tick skipped");
                Vec::new()
            }
            PollSlot::Retired => vec![Effect::StopPolling { job_id }],
        },
        Msg::StatusFetched { job_id, result } => {
            if let Err(message) = &result {
                hunter_warn!("status poll for job {job_id} failed, polling continues: {message}");
            }
            match state.apply_status(&job_id, result) {
                None => {
                    hunter_debug!("ignoring status for retired job {job_id}");
                    Vec::new()
                }
                Some(JobState::Running) => Vec::new(),
                Some(finished) => {
                    hunter_info!("job {job_id} is {finished}");
                    vec![Effect::StopPolling { job_id }]
                }
            }
        }
        Msg::DownloadRequested => match state.done_job_id() {
            Some(job_id) => {
                state.set_notice(None);
                vec![Effect::FetchDownloadUrl { job_id }]
            }
            None => {
                hunter_debug!("download requested while job is {}", state.job_state());
                state.set_notice(Some(Notice::DownloadRejected));
                Vec::new()
            }
        },
        Msg::DownloadResolved { job_id, result } => {
            if !state.apply_download(&job_id, result) {
                hunter_debug!("ignoring download link for retired job {job_id}");
            }
            Vec::new()
        }
        Msg::NoticeDismissed => {
            state.set_notice(None);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn start(state: &mut AppState, input: CrawlInput) -> Vec<Effect> {
    let query = match input.validate() {
        Ok(query) => query,
        Err(err) => {
            hunter_debug!("start refused: {err}");
            state.set_notice(Some(Notice::CannotStart(err)));
            return Vec::new();
        }
    };

    let max_results = input.max_results;
    *state.form_mut() = input;
    state.set_notice(None);
    let (ticket, retired) = state.begin_submission(query.clone(), max_results);

    let mut effects = Vec::with_capacity(2);
    if let Some(job_id) = retired {
        hunter_info!("job {job_id} retired by a new submission");
        effects.push(Effect::StopPolling { job_id });
    }
    effects.push(match query {
        Query::Keyword(keyword) => Effect::SubmitKeyword {
            ticket,
            keyword,
            max_results,
        },
        Query::Image(image) => Effect::SubmitUpload {
            ticket,
            image,
            max_results,
        },
    });
    effects
}
