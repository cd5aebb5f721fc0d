//! CLI command implementations for fatscope.
//!
//! Available commands:
//! - **select**: Print the buckets to run for a change set
//! - **should-run**: Answer yes or no for one bucket
//! - **classify**: Show how paths are categorized
//! - **explain**: Walk through every stage of a selection
//! - **init**: Write a default configuration file

pub mod classify;
pub mod explain;
pub mod init;
pub mod input;
pub mod select;
pub mod should_run;

pub use classify::classify_paths;
pub use explain::explain_selection;
pub use init::init_config;
pub use input::{gather_paths, load_detector, resolve_config};
pub use select::select_buckets;
pub use should_run::should_run;
