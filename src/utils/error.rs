use thiserror::Error;

#[derive(Error, Debug)]
pub enum IsinError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Certificate error: {message}")]
    CertificateError { message: String },

    #[error("ISIN rejected request ({status}): {message}")]
    RemoteError { status: u16, message: String },

    #[error("Data integrity violation: {message}")]
    PreconditionError { message: String },

    #[error("{entity} '{id}' not found")]
    NotFoundError { entity: String, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    DataIntegrity,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl IsinError {
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionError {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_) | Self::RemoteError { .. } => ErrorCategory::Network,
            Self::TomlError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::CertificateError { .. } => ErrorCategory::Configuration,
            Self::PreconditionError { .. } | Self::NotFoundError { .. } => {
                ErrorCategory::DataIntegrity
            }
            Self::IoError(_) | Self::SerializationError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // a later job run retries these
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::DataIntegrity => ErrorSeverity::Critical,
            ErrorCategory::Storage => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::HttpError(_) => "Check connectivity to ISIN and rerun the job later",
            Self::RemoteError { .. } => "Inspect the ISIN response message and rerun the job later",
            Self::CertificateError { .. } => {
                "Verify cert_base64, cert_password and store_type in the [isin] section"
            }
            Self::TomlError(_)
            | Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => "Fix the configuration file and try again",
            Self::PreconditionError { .. } | Self::NotFoundError { .. } => {
                "Inspect the patient record named in the error; the store is inconsistent"
            }
            Self::IoError(_) | Self::SerializationError(_) => {
                "Check that the patient store exists, is readable and contains valid JSON"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Communication with ISIN failed: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::DataIntegrity => format!("Job aborted, inconsistent record: {}", self),
            ErrorCategory::Storage => format!("Patient store failure: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, IsinError>;
