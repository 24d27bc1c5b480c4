pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{IsinClient, JsonPatientStore, LocalStorage};
pub use config::AppConfig;
pub use core::{
    export::IsinExportService, retry_job::IsinRetryJob, validation::PatientValidationService,
};
pub use domain::model::{JobRequest, JobStats, ValidationResult, ValidationStatus};
pub use utils::error::{IsinError, Result};
