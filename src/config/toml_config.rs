use crate::domain::model::JobRequest;
use crate::utils::error::{IsinError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// ISIN documents 15 seconds as the upper bound for a request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;
pub const DEFAULT_PATIENTS_COUNT: usize = 100;
pub const SUPPORTED_STORE_TYPES: [&str; 2] = ["PKCS12", "PEM"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub isin: IsinSettings,
    pub store: StoreConfig,
    pub job: Option<JobDefaults>,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct IsinSettings {
    pub root_url: String,
    pub cert_base64: Option<String>,
    #[serde(default)]
    pub cert_password: String,
    pub key_password: Option<String>,
    #[serde(default = "default_store_type")]
    pub store_type: String,
    pub timeout_seconds: Option<u64>,
    pub pracovnik: WorkerIdentification,
}

fn default_store_type() -> String {
    "PKCS12".to_string()
}

// keeps certificate material and passwords out of logs
impl std::fmt::Debug for IsinSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IsinSettings")
            .field("root_url", &self.root_url)
            .field(
                "cert_base64",
                &self.cert_base64.as_ref().map(|c| format!("<{} chars>", c.len())),
            )
            .field("cert_password", &"<redacted>")
            .field("key_password", &self.key_password.as_ref().map(|_| "<redacted>"))
            .field("store_type", &self.store_type)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("pracovnik", &self.pracovnik)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerIdentification {
    pub pcz: String,
    pub nrzp_cislo: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub path: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDefaults {
    pub patients_count: Option<usize>,
    pub patients_offset: Option<usize>,
    pub validate_patients: Option<bool>,
    pub export_patients_info: Option<bool>,
    pub export_vaccinations: Option<bool>,
}

impl IsinSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS))
    }

    /// Password for the private key, falling back to the store password.
    pub fn key_password(&self) -> &str {
        self.key_password.as_deref().unwrap_or(&self.cert_password)
    }

    /// Store password first, then the key password when it differs.
    pub fn passwords(&self) -> Vec<&str> {
        let mut passwords = vec![self.cert_password.as_str()];
        if self.key_password() != self.cert_password {
            passwords.push(self.key_password());
        }
        passwords
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the environment value; unknown variables are left as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| IsinError::config(format!("invalid substitution pattern: {}", e)))?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn store_file(&self) -> &str {
        self.store.file.as_deref().unwrap_or("patients.json")
    }

    /// Job request assembled from the `[job]` section.
    pub fn job_request(&self) -> JobRequest {
        let defaults = self.job.clone().unwrap_or_default();
        JobRequest {
            patients_count: defaults.patients_count.unwrap_or(DEFAULT_PATIENTS_COUNT),
            patients_offset: defaults.patients_offset.unwrap_or(0),
            validate_patients: defaults.validate_patients.unwrap_or(true),
            export_patients_info: defaults.export_patients_info.unwrap_or(true),
            export_vaccinations: defaults.export_vaccinations.unwrap_or(true),
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("isin.root_url", &self.isin.root_url)?;
        validation::validate_one_of(
            "isin.store_type",
            &self.isin.store_type,
            &SUPPORTED_STORE_TYPES,
        )?;
        validation::validate_non_empty_string("isin.pracovnik.pcz", &self.isin.pracovnik.pcz)?;
        validation::validate_non_empty_string(
            "isin.pracovnik.nrzp_cislo",
            &self.isin.pracovnik.nrzp_cislo,
        )?;
        if let Some(cert) = &self.isin.cert_base64 {
            validation::validate_resolved("isin.cert_base64", cert)?;
        }
        validation::validate_resolved("isin.cert_password", &self.isin.cert_password)?;
        if let Some(timeout) = self.isin.timeout_seconds {
            validation::validate_positive_number("isin.timeout_seconds", timeout as usize, 1)?;
        }

        validation::validate_path("store.path", &self.store.path)?;
        validation::validate_path("store.file", self.store_file())?;

        self.job_request().validate()
    }
}

/// Checked again after command line overrides are applied.
impl Validate for JobRequest {
    fn validate(&self) -> Result<()> {
        validation::validate_positive_number("job.patients_count", self.patients_count, 1)
    }
}
