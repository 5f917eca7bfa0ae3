mod app;
pub mod args;
pub mod logging;
mod ui;

pub use app::run_app;
