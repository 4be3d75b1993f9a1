//! Music generation API client
//!
//! Submits song and MP4 jobs, reads their status, fetches timed lyrics and
//! downloads the resulting media.

pub mod api;
pub mod models;

pub use api::SunoClient;
pub use models::TaskState;
