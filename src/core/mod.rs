pub mod export;
pub mod retry_job;
pub mod validation;

pub use crate::domain::model::{JobRequest, JobStats};
pub use crate::domain::ports::{IsinApi, RegistryStore, Storage};
pub use crate::utils::error::Result;
