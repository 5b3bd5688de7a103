pub mod coordinator;
pub mod io;
pub mod list;
pub mod models;
pub mod observer;
pub mod store;
pub mod task_runner;
pub mod url;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use coordinator::*;
pub use io::*;
pub use list::*;
pub use models::*;
pub use observer::{ObserverId, ObserverList};
pub use store::*;
pub use task_runner::TaskRunner;
pub use url::original_url_from_distiller_url;
