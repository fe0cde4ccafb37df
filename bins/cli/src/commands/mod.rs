//! CLI command handlers.

pub mod cache;
pub mod config;
pub mod detail;
pub mod info;
pub mod warm;

pub use cache::{run_cache_cleanup, run_cache_stats};
pub use config::{run_config_check, run_config_show};
pub use detail::{run_detail_get, run_detail_invalidate};
pub use info::run_info;
pub use warm::{run_warm_all, run_warm_item, run_warm_one, run_warm_stats};
