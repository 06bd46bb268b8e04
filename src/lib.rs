pub mod config;
pub mod dashboard;
pub mod entity;
pub mod error;
pub mod forms;
pub mod geometry;
pub mod icon;
pub mod logging;
pub mod measure;
pub mod modal;
pub mod relocator;
pub mod resizer;
pub mod scheduler;
pub mod session;
pub mod sync;
pub mod tree;

pub use dashboard::Dashboard;
pub use error::{AdminError, AdminResult};

/// Entrypoint for hosts: installs logging, loads the user's settings and
/// binds a dashboard to the rendered `page`.
pub fn start(page: tree::Tree) -> AdminResult<Dashboard> {
    logging::init();
    tracing::info!("starting passport admin");

    let config = config::load_admin_config();
    let dashboard = Dashboard::headless(page, config)?;

    tracing::info!("startup complete with state={:?}", dashboard.state());
    Ok(dashboard)
}
