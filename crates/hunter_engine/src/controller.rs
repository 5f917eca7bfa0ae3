use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use hunter_core::{
    update, AppState, AppViewModel, CrawlInput, DownloadFailure, Effect, JobId, MaxResults, Mode,
    Msg, StagedImage, Ticket, ValidationError,
};
use hunter_logging::{hunter_debug, hunter_info, hunter_warn};
use thiserror::Error;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::{ClientError, Clock, CrawlClient, TokioClock, TransportKind};

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub poll_interval: Duration,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StartError {
    #[error("cannot start: {0}")]
    Validation(#[from] ValidationError),
    #[error("submission failed: {0}")]
    Transport(ClientError),
    /// A later command retired this submission before it was acknowledged.
    #[error("submission was superseded by a newer command")]
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DownloadError {
    /// Precondition: only a finished job has a bundle. No remote call was made.
    #[error("no finished job to download")]
    NotDone,
    #[error("bundle not ready yet: {0}")]
    NotReady(String),
    #[error("download link request failed: {0}")]
    Transport(ClientError),
    #[error("job was retired before the download link arrived")]
    Superseded,
}

impl DownloadError {
    /// Whether issuing the same request again later may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DownloadError::NotReady(_) | DownloadError::Transport(_))
    }
}

/// Drives the lifecycle of one crawl job at a time against a [`CrawlClient`].
///
/// All state lives in a [`hunter_core::AppState`]; the controller feeds it
/// messages and executes the effects it returns. Every state change is
/// published to subscribers as an [`AppViewModel`]. Dropping the controller
/// stops the poll loop.
pub struct JobController {
    inner: Arc<Inner>,
}

/// Submission request taken out of a submit effect.
enum Submission {
    Keyword {
        keyword: String,
        max_results: MaxResults,
    },
    Upload {
        image: StagedImage,
        max_results: MaxResults,
    },
}

struct Poller {
    job_id: JobId,
    cancel: CancellationToken,
}

struct Inner {
    client: Arc<dyn CrawlClient>,
    clock: Arc<dyn Clock>,
    settings: ControllerSettings,
    state: Mutex<AppState>,
    view_tx: watch::Sender<AppViewModel>,
    poller: Mutex<Option<Poller>>,
}

impl JobController {
    pub fn new(client: Arc<dyn CrawlClient>, settings: ControllerSettings) -> Self {
        Self::with_clock(client, Arc::new(TokioClock), settings)
    }

    pub fn with_clock(
        client: Arc<dyn CrawlClient>,
        clock: Arc<dyn Clock>,
        settings: ControllerSettings,
    ) -> Self {
        let state = AppState::new();
        let (view_tx, _) = watch::channel(state.view());
        Self {
            inner: Arc::new(Inner {
                client,
                clock,
                settings,
                state: Mutex::new(state),
                view_tx,
                poller: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> AppViewModel {
        self.inner.view_tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AppViewModel> {
        self.inner.view_tx.subscribe()
    }

    pub fn can_start(&self, input: &CrawlInput) -> bool {
        hunter_core::can_start(&self.inner.lock_state(), input)
    }

    pub fn set_keyword(&self, keyword: impl Into<String>) {
        self.inner.dispatch(Msg::KeywordChanged(keyword.into()));
    }

    pub fn set_max_results(&self, raw: i64) {
        self.inner.dispatch(Msg::MaxResultsChanged(raw));
    }

    pub fn stage_image(&self, image: StagedImage) {
        self.inner.dispatch(Msg::ImageStaged(image));
    }

    pub fn clear_image(&self) {
        self.inner.dispatch(Msg::ImageCleared);
    }

    pub fn dismiss_notice(&self) {
        self.inner.dispatch(Msg::NoticeDismissed);
    }

    /// Submits a new crawl, retiring any tracked job, and starts polling once
    /// the service acknowledges it.
    pub async fn start(&self, input: CrawlInput) -> Result<JobId, StartError> {
        let checked = input.check();
        let effects = self.inner.dispatch(Msg::StartRequested(input));
        checked?;

        let mut submission = None;
        let mut rest = Vec::new();
        for effect in effects {
            match effect {
                Effect::SubmitKeyword {
                    ticket,
                    keyword,
                    max_results,
                } => submission = Some((ticket, Submission::Keyword { keyword, max_results })),
                Effect::SubmitUpload {
                    ticket,
                    image,
                    max_results,
                } => submission = Some((ticket, Submission::Upload { image, max_results })),
                other => rest.push(other),
            }
        }
        self.inner.run_effects(rest);
        let Some((ticket, submission)) = submission else {
            return Err(StartError::Superseded);
        };

        // The round trip runs on its own task so the acknowledgement is applied
        // even if the caller stops awaiting this future.
        let inner = Arc::clone(&self.inner);
        let round_trip = tokio::spawn(async move {
            let result = inner.submit(submission).await;
            inner.finish_submission(ticket, result)
        });
        match round_trip.await {
            Ok(outcome) => outcome,
            Err(err) => {
                hunter_warn!("submission {ticket} ended abnormally: {err}");
                self.inner.finish_submission(
                    ticket,
                    Err(ClientError::transport(TransportKind::Network, err.to_string())),
                )
            }
        }
    }

    /// Discards the tracked job and any staged upload; back to idle.
    pub fn switch_mode(&self, mode: Mode) {
        let effects = self.inner.dispatch(Msg::ModeSwitched(mode));
        self.inner.run_effects(effects);
    }

    /// Resolves the bundle location of the finished job.
    pub async fn request_download(&self) -> Result<String, DownloadError> {
        let effects = self.inner.dispatch(Msg::DownloadRequested);
        let Some(job_id) = effects.into_iter().find_map(|effect| match effect {
            Effect::FetchDownloadUrl { job_id } => Some(job_id),
            _ => None,
        }) else {
            return Err(DownloadError::NotDone);
        };

        let result = self.inner.client.fetch_download_url(&job_id).await;
        let outcome = match &result {
            Ok(url) => Ok(url.clone()),
            Err(ClientError::NotReady(detail)) => Err(DownloadFailure::NotReady(detail.clone())),
            Err(err) => Err(DownloadFailure::Transport(err.to_string())),
        };
        let msg = Msg::DownloadResolved {
            job_id: job_id.clone(),
            result: outcome,
        };
        let (effects, current) = self
            .inner
            .dispatch_with(msg, |state| state.is_current(&job_id));
        self.inner.run_effects(effects);

        if !current {
            hunter_debug!("download link outcome for retired job {job_id} discarded");
            return Err(DownloadError::Superseded);
        }
        match result {
            Ok(url) => {
                hunter_info!("bundle for job {job_id} available at {url}");
                Ok(url)
            }
            Err(ClientError::NotReady(detail)) => Err(DownloadError::NotReady(detail)),
            Err(err) => Err(DownloadError::Transport(err)),
        }
    }

    /// Stops the poll loop. In-flight requests complete but are not applied
    /// to a retired job.
    pub fn shutdown(&self) {
        self.inner.stop_any_polling();
    }
}

impl Drop for JobController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn lock_state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_poller(&self) -> MutexGuard<'_, Option<Poller>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn dispatch(&self, msg: Msg) -> Vec<Effect> {
        self.dispatch_with(msg, |_| ()).0
    }

    /// Applies `msg` and evaluates `inspect` on the resulting state under the
    /// same lock, so no other message can interleave between the two.
    fn dispatch_with<R>(&self, msg: Msg, inspect: impl FnOnce(&AppState) -> R) -> (Vec<Effect>, R) {
        let mut guard = self.lock_state();
        let (mut state, effects) = update(std::mem::take(&mut *guard), msg);
        if state.consume_dirty() {
            self.view_tx.send_replace(state.view());
        }
        let inspected = inspect(&state);
        *guard = state;
        (effects, inspected)
    }

    fn run_effects(self: &Arc<Self>, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartPolling { job_id } => self.start_polling(job_id),
                Effect::StopPolling { job_id } => self.stop_polling(&job_id),
                Effect::FetchStatus { job_id } => self.spawn_status_fetch(job_id),
                Effect::SubmitKeyword { ticket, .. } | Effect::SubmitUpload { ticket, .. } => {
                    hunter_warn!("submission {ticket} emitted outside of start; dropped");
                }
                Effect::FetchDownloadUrl { job_id } => {
                    hunter_warn!("download link for job {job_id} requested outside of request_download; dropped");
                }
            }
        }
    }

    async fn submit(&self, submission: Submission) -> Result<JobId, ClientError> {
        match submission {
            Submission::Keyword {
                keyword,
                max_results,
            } => {
                hunter_info!("submitting keyword {keyword:?} (max {max_results})");
                self.client.submit_by_keyword(&keyword, max_results).await
            }
            Submission::Upload { image, max_results } => {
                hunter_info!("submitting upload {} (max {max_results})", image.file_name);
                self.client.submit_by_upload(image, max_results).await
            }
        }
    }

    fn finish_submission(
        self: &Arc<Self>,
        ticket: Ticket,
        result: Result<JobId, ClientError>,
    ) -> Result<JobId, StartError> {
        let msg = Msg::Submitted {
            ticket,
            result: result.clone().map_err(|err| err.to_string()),
        };
        let (effects, current) = self.dispatch_with(msg, |state| state.is_current_ticket(ticket));
        self.run_effects(effects);

        match result {
            Ok(job_id) if current => Ok(job_id),
            Ok(job_id) => {
                hunter_debug!("job {job_id} acknowledged after its submission was retired");
                Err(StartError::Superseded)
            }
            Err(err) => Err(StartError::Transport(err)),
        }
    }

    fn start_polling(self: &Arc<Self>, job_id: JobId) {
        let cancel = CancellationToken::new();
        let previous = self.lock_poller().replace(Poller {
            job_id: job_id.clone(),
            cancel: cancel.clone(),
        });
        if let Some(previous) = previous {
            hunter_debug!("poll loop for job {} replaced", previous.job_id);
            previous.cancel.cancel();
        }

        let inner = Arc::clone(self);
        tokio::spawn(inner.poll_loop(job_id, cancel));
    }

    fn stop_polling(&self, job_id: &str) {
        if let Some(poller) = self.lock_poller().take_if(|poller| poller.job_id == job_id) {
            hunter_debug!("stopping poll loop for job {job_id}");
            poller.cancel.cancel();
        }
    }

    fn stop_any_polling(&self) {
        if let Some(poller) = self.lock_poller().take() {
            hunter_debug!("stopping poll loop for job {}", poller.job_id);
            poller.cancel.cancel();
        }
    }

    async fn poll_loop(self: Arc<Self>, job_id: JobId, cancel: CancellationToken) {
        hunter_debug!(
            "polling job {job_id} every {:?}",
            self.settings.poll_interval
        );
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.clock.sleep(self.settings.poll_interval) => {}
            }

            let effects = self.dispatch(Msg::PollTick {
                job_id: job_id.clone(),
            });
            let finished = effects
                .iter()
                .any(|effect| matches!(effect, Effect::StopPolling { .. }));
            self.run_effects(effects);
            if finished {
                break;
            }
        }
        hunter_debug!("poll loop for job {job_id} exited");
    }

    /// Issues one status request without blocking the timer; the core skips
    /// ticks while it is outstanding.
    fn spawn_status_fetch(self: &Arc<Self>, job_id: JobId) {
        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = inner
                .client
                .fetch_status(&job_id)
                .await
                .map_err(|err| err.to_string());
            let effects = inner.dispatch(Msg::StatusFetched { job_id, result });
            inner.run_effects(effects);
        });
    }
}
