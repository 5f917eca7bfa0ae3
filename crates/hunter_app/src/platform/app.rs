use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use hunter_core::{AppViewModel, JobState};
use hunter_engine::{
    ensure_output_dir, BundleWriter, DownloadError, JobController, ReqwestCrawlClient,
};
use hunter_logging::{hunter_info, hunter_warn};
use tokio::sync::watch;

use super::args::Args;
use super::ui::render;

/// A freshly finished job may not have its bundle staged yet.
const DOWNLOAD_ATTEMPTS: u32 = 5;
const DOWNLOAD_RETRY_DELAY: Duration = Duration::from_secs(2);

pub async fn run_app(args: Args) -> Result<()> {
    let input = args.crawl_input()?;
    let client = ReqwestCrawlClient::new(args.client_settings())
        .with_context(|| format!("invalid --base-url {}", args.base_url))?;
    if let Some(dir) = &args.save {
        ensure_output_dir(dir)
            .with_context(|| format!("cannot save bundles to {}", dir.display()))?;
    }

    let controller = JobController::new(Arc::new(client.clone()), args.controller_settings());
    let mut views = controller.subscribe();
    hunter_info!("submitting to {}", client.base_url());

    let job_id = controller
        .start(input)
        .await
        .context("could not start the crawl")?;

    let finished = follow(&mut views).await?;
    if finished.job.state == JobState::Failed {
        let reason = finished.job.message.as_deref().unwrap_or("no details");
        bail!("job {job_id} failed: {reason}");
    }

    let url = resolve_download(&controller).await?;
    controller.shutdown();
    println!("{url}");

    if let Some(dir) = &args.save {
        save_bundle(&client, dir, &job_id, &url).await?;
    }
    Ok(())
}

/// Prints a status line for every visible change until the job settles.
async fn follow(views: &mut watch::Receiver<AppViewModel>) -> Result<AppViewModel> {
    let mut last_line = String::new();
    loop {
        let view = views.borrow_and_update().clone();
        let line = render::status_line(&view);
        if line != last_line {
            println!("{line}");
            last_line = line;
        }
        match view.job.state {
            JobState::Running => {}
            JobState::Done | JobState::Failed => return Ok(view),
            JobState::Idle => bail!("job was discarded before it finished"),
        }
        views
            .changed()
            .await
            .context("job controller stopped unexpectedly")?;
    }
}

async fn resolve_download(controller: &JobController) -> Result<String> {
    let mut attempt = 1;
    loop {
        match controller.request_download().await {
            Ok(url) => return Ok(url),
            Err(DownloadError::NotReady(detail)) if attempt < DOWNLOAD_ATTEMPTS => {
                if let Some(notice) = controller.snapshot().notice {
                    eprintln!(
                        "{} (attempt {attempt}/{DOWNLOAD_ATTEMPTS})",
                        render::notice_text(&notice)
                    );
                }
                hunter_warn!("bundle not ready on attempt {attempt}: {detail}");
                tokio::time::sleep(DOWNLOAD_RETRY_DELAY).await;
                attempt += 1;
            }
            Err(err) => return Err(err).context("could not resolve the download link"),
        }
    }
}

async fn save_bundle(client: &ReqwestCrawlClient, dir: &Path, job_id: &str, url: &str) -> Result<()> {
    let bytes = client
        .download_bundle(url)
        .await
        .with_context(|| format!("could not download {url}"))?;
    let path = BundleWriter::new(dir.to_path_buf())
        .write(job_id, &bytes)
        .with_context(|| format!("could not save bundle into {}", dir.display()))?;
    hunter_info!("bundle for job {job_id} saved to {}", path.display());
    println!("saved {}", path.display());
    Ok(())
}
