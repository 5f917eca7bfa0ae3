//! Image hunter engine: crawl service client and job controller.
mod client;
mod clock;
mod controller;
mod persist;
mod types;

pub use client::{resolve_bundle_url, ClientSettings, CrawlClient, ReqwestCrawlClient};
pub use clock::{Clock, TokioClock};
pub use controller::{ControllerSettings, DownloadError, JobController, StartError};
pub use persist::{ensure_output_dir, BundleWriter, PersistError};
pub use types::{ClientError, TransportKind};
