//! Long running jobs. Each one runs on its own tokio task.
pub mod http_tracker;
pub mod scheduler;
pub mod signals;
