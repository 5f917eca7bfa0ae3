use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use hunter_core::{CrawlInput, MaxResults, StagedImage, DEFAULT_MAX_RESULTS};
use hunter_engine::{ClientSettings, ControllerSettings};

use super::logging::LogDestination;

/// Submit an image crawl, follow it to completion and fetch its bundle.
#[derive(Debug, Parser)]
#[command(name = "image-hunter", version)]
pub struct Args {
    /// Base URL of the crawl service.
    #[arg(
        long,
        value_name = "URL",
        env = "HUNTER_BASE_URL",
        default_value = "http://localhost:8000"
    )]
    pub base_url: String,

    /// Number of images to collect. Clamped to 1..=500.
    #[arg(
        long = "max",
        value_name = "N",
        default_value_t = i64::from(DEFAULT_MAX_RESULTS),
        allow_negative_numbers = true
    )]
    pub max: i64,

    /// Status poll interval in milliseconds.
    #[arg(long, value_name = "MS", default_value_t = 1000)]
    pub interval_ms: u64,

    /// Directory to save the finished bundle into as `<job_id>.zip`.
    #[arg(long, value_name = "DIR")]
    pub save: Option<PathBuf>,

    /// Where log output goes.
    #[arg(long, value_enum, default_value_t = LogTarget::File)]
    pub log: LogTarget,

    #[command(flatten)]
    pub source: Source,
}

/// What to search for: exactly one of a keyword or a reference image.
#[derive(Debug, clap::Args)]
#[group(required = true, multiple = false)]
pub struct Source {
    /// Search keyword.
    #[arg(long, value_name = "TEXT")]
    pub keyword: Option<String>,

    /// Reference image to search by.
    #[arg(long, value_name = "PATH")]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogTarget {
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

impl Args {
    /// Builds the submission, reading the reference image from disk if given.
    pub fn crawl_input(&self) -> Result<CrawlInput> {
        let max_results = MaxResults::clamped(self.max);
        match (&self.source.keyword, &self.source.image) {
            (_, Some(path)) => {
                let bytes = fs::read(path)
                    .with_context(|| format!("could not read image {}", path.display()))?;
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .with_context(|| format!("{} has no file name", path.display()))?;
                Ok(CrawlInput::upload(
                    StagedImage::new(file_name, bytes),
                    max_results,
                ))
            }
            (Some(keyword), None) => Ok(CrawlInput::keyword(keyword.as_str(), max_results)),
            (None, None) => anyhow::bail!("either --keyword or --image is required"),
        }
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            ..ClientSettings::default()
        }
    }

    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            poll_interval: Duration::from_millis(self.interval_ms.max(1)),
        }
    }
}
