use crate::domain::model::{Patient, VaccinationDetail};
use crate::domain::ports::{
    DataCorrectnessRepository, PatientRepository, Storage, VaccinationRepository,
};
use crate::utils::error::{IsinError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

/// On-disk shape of the patient store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub vaccinations: Vec<VaccinationDetail>,
}

/// Patient store kept as one JSON document; every update is written back immediately.
pub struct JsonPatientStore<S: Storage> {
    storage: S,
    file: String,
    snapshot: Mutex<RegistrySnapshot>,
}

fn not_found(entity: &str, id: &str) -> IsinError {
    IsinError::NotFoundError {
        entity: entity.to_string(),
        id: id.to_string(),
    }
}

impl<S: Storage> JsonPatientStore<S> {
    pub async fn load(storage: S, file: impl Into<String>) -> Result<Self> {
        let file = file.into();
        let data = storage.read_file(&file).await?;
        let snapshot: RegistrySnapshot = serde_json::from_slice(&data)?;

        tracing::debug!(
            "Loaded {} patients and {} vaccinations from {}",
            snapshot.patients.len(),
            snapshot.vaccinations.len(),
            file
        );

        Ok(Self::with_snapshot(storage, file, snapshot))
    }

    pub fn with_snapshot(storage: S, file: impl Into<String>, snapshot: RegistrySnapshot) -> Self {
        Self {
            storage,
            file: file.into(),
            snapshot: Mutex::new(snapshot),
        }
    }

    pub async fn snapshot(&self) -> RegistrySnapshot {
        self.snapshot.lock().await.clone()
    }

    /// Applies `change` to a copy; memory follows only once the copy is on disk.
    async fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut RegistrySnapshot) -> Result<()> + Send,
    {
        let mut snapshot = self.snapshot.lock().await;
        let mut updated = snapshot.clone();
        change(&mut updated)?;
        self.flush(&updated).await?;
        *snapshot = updated;
        Ok(())
    }

    async fn flush(&self, snapshot: &RegistrySnapshot) -> Result<()> {
        let data = serde_json::to_vec_pretty(snapshot)?;
        self.storage.write_file(&self.file, &data).await
    }
}

#[async_trait]
impl<S: Storage> PatientRepository for JsonPatientStore<S> {
    async fn get_patients(&self, count: usize, offset: usize) -> Result<Vec<Patient>> {
        let snapshot = self.snapshot.lock().await;
        Ok(snapshot
            .patients
            .iter()
            .skip(offset)
            .take(count)
            .cloned()
            .collect())
    }

    async fn update_isin_id(&self, patient_id: &str, isin_id: &str) -> Result<()> {
        self.update(|snapshot| {
            let patient = snapshot
                .patients
                .iter_mut()
                .find(|p| p.id == patient_id)
                .ok_or_else(|| not_found("Patient", patient_id))?;
            patient.isin_id = Some(isin_id.to_string());
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl<S: Storage> DataCorrectnessRepository for JsonPatientStore<S> {
    async fn mark_correctness_exported(
        &self,
        correctness_id: &str,
        exported_on: DateTime<Utc>,
    ) -> Result<()> {
        self.update(|snapshot| {
            let correctness = snapshot
                .patients
                .iter_mut()
                .filter_map(|p| p.data_correctness.as_mut())
                .find(|dc| dc.id == correctness_id)
                .ok_or_else(|| not_found("Data correctness", correctness_id))?;
            correctness.exported_to_isin_on = Some(exported_on);
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl<S: Storage> VaccinationRepository for JsonPatientStore<S> {
    async fn get_vaccination(&self, vaccination_id: &str) -> Result<VaccinationDetail> {
        let snapshot = self.snapshot.lock().await;
        snapshot
            .vaccinations
            .iter()
            .find(|v| v.vaccination_id == vaccination_id)
            .cloned()
            .ok_or_else(|| not_found("Vaccination", vaccination_id))
    }

    async fn mark_vaccination_exported(
        &self,
        vaccination_id: &str,
        exported_on: DateTime<Utc>,
    ) -> Result<()> {
        self.update(|snapshot| {
            let mut touched = false;

            if let Some(detail) = snapshot
                .vaccinations
                .iter_mut()
                .find(|v| v.vaccination_id == vaccination_id)
            {
                detail.exported_to_isin_on = Some(exported_on);
                touched = true;
            }
            // the patient carries its own copy of the marker
            for summary in snapshot
                .patients
                .iter_mut()
                .filter_map(|p| p.vaccinated.as_mut())
                .filter(|v| v.id == vaccination_id)
            {
                summary.exported_to_isin_on = Some(exported_on);
                touched = true;
            }

            if touched {
                Ok(())
            } else {
                Err(not_found("Vaccination", vaccination_id))
            }
        })
        .await
    }
}
