//! Dukani POS Server
//!
//! Backend for a multi-branch retail POS/CRM. The two engines are
//! customer segmentation with branch-scoped data sharing, and the bulk
//! message dispatch throttler.
//!
//! # Module structure
//!
//! ```text
//! pos-server/src/
//! ├── core/          # config, state, server, background tasks
//! ├── api/           # HTTP routes and handlers
//! ├── segmentation/  # customer classification rules
//! ├── branches/      # data-sharing resolver, branch switch flow
//! ├── dispatch/      # message throttler, transports, job service
//! ├── db/            # SQLite pool, migrations, repositories
//! └── utils/         # errors, logger, query builder
//! ```

pub mod api;
pub mod branches;
pub mod core;
pub mod db;
pub mod dispatch;
pub mod segmentation;
pub mod utils;

pub use api::CurrentUser;
pub use crate::core::{Config, Server, ServerState};
pub use utils::{AppError, AppResponse, AppResult};

/// Load `.env`, then bring up logging from the resulting environment.
/// Call once, before anything that logs.
pub fn setup_environment() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();
    let config = Config::from_env();
    let log_dir = config.log_dir();
    utils::logger::init_logger(
        &config.log_level,
        config.log_json,
        config.is_production().then_some(log_dir.as_str()),
    )?;
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
    ____        __              _
   / __ \__  __/ /______ _____  (_)
  / / / / / / / //_/ __ `/ __ \/ /
 / /_/ / /_/ / ,< / /_/ / / / / /
/_____/\__,_/_/|_|\__,_/_/ /_/_/
    "#
    );
}
