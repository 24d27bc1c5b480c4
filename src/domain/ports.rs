use crate::domain::model::{Patient, PatientLookupResponse, VaccinationDetail};
use crate::domain::requests::{ContactInfoUpdate, DoseCreate, VaccinationCreate};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Remote operations offered by the ISIN registry.
#[async_trait]
pub trait IsinApi: Send + Sync {
    async fn find_patient(
        &self,
        first_name: &str,
        last_name: &str,
        personal_number: &str,
    ) -> Result<PatientLookupResponse>;

    async fn update_contact_info(&self, request: &ContactInfoUpdate) -> Result<()>;

    /// Returns the ISIN id of the created vaccination.
    async fn create_vaccination(&self, request: &VaccinationCreate) -> Result<String>;

    async fn create_dose(&self, request: &DoseCreate) -> Result<()>;
}

#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn get_patients(&self, count: usize, offset: usize) -> Result<Vec<Patient>>;
    async fn update_isin_id(&self, patient_id: &str, isin_id: &str) -> Result<()>;
}

#[async_trait]
pub trait DataCorrectnessRepository: Send + Sync {
    async fn mark_correctness_exported(
        &self,
        correctness_id: &str,
        exported_on: DateTime<Utc>,
    ) -> Result<()>;
}

#[async_trait]
pub trait VaccinationRepository: Send + Sync {
    async fn get_vaccination(&self, vaccination_id: &str) -> Result<VaccinationDetail>;
    async fn mark_vaccination_exported(
        &self,
        vaccination_id: &str,
        exported_on: DateTime<Utc>,
    ) -> Result<()>;
}

/// Everything the retry job reads from and writes to.
pub trait RegistryStore: PatientRepository + DataCorrectnessRepository + VaccinationRepository {}

impl<T> RegistryStore for T where
    T: PatientRepository + DataCorrectnessRepository + VaccinationRepository
{
}
