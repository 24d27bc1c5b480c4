use crate::core::export::IsinExportService;
use crate::core::validation::PatientValidationService;
use crate::domain::model::{JobRequest, JobStats, Patient};
use crate::domain::ports::{IsinApi, RegistryStore};
use crate::utils::error::{IsinError, Result};
use chrono::Utc;
use std::sync::Arc;

/// Retries ISIN validation and exports for one page of patients.
///
/// Records are processed one at a time and each step is independent: a
/// failed remote call is counted and the job moves on, so rerunning the
/// job is the retry mechanism. A record that contradicts its own
/// eligibility (a sub-record missing when a step needs it) aborts the run.
/// Counters of one run plus the size of the page actually read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobRun {
    pub stats: JobStats,
    pub patients_processed: usize,
}

pub struct IsinRetryJob<S: RegistryStore, A: IsinApi> {
    store: S,
    validation: PatientValidationService<A>,
    export: IsinExportService<A>,
}

impl<S: RegistryStore, A: IsinApi> IsinRetryJob<S, A> {
    pub fn new(store: S, api: Arc<A>) -> Result<Self> {
        Ok(Self {
            store,
            validation: PatientValidationService::new(api.clone())?,
            export: IsinExportService::new(api),
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn run(&self, request: &JobRequest) -> Result<JobStats> {
        Ok(self.run_page(request).await?.stats)
    }

    pub async fn run_page(&self, request: &JobRequest) -> Result<JobRun> {
        let mut stats = JobStats::default();

        let patients = self
            .store
            .get_patients(request.patients_count, request.patients_offset)
            .await?;
        tracing::info!(
            "ISIN retry: {} patients (count={}, offset={}, validate={}, exportInfo={}, exportVaccinations={})",
            patients.len(),
            request.patients_count,
            request.patients_offset,
            request.validate_patients,
            request.export_patients_info,
            request.export_vaccinations
        );

        let patients_processed = patients.len();
        for patient in patients {
            self.process_patient(patient, request, &mut stats).await?;
        }

        tracing::info!("ISIN retry finished: {:?}", stats);
        Ok(JobRun {
            stats,
            patients_processed,
        })
    }

    async fn process_patient(
        &self,
        mut patient: Patient,
        request: &JobRequest,
        stats: &mut JobStats,
    ) -> Result<()> {
        tracing::debug!("Checking ISIN id of patient {}", patient.id);

        // 1. personal number present but no ISIN id
        if patient.isin_id().is_none() {
            if !request.validate_patients || patient.personal_number().is_none() {
                return Ok(());
            }
            tracing::info!(
                "Patient {} has personal number but no ISIN id. Validating in ISIN...",
                patient.id
            );
            let new_isin_id = self.retry_patient_validation(&patient).await?;
            stats.record_validation(new_isin_id.is_some());
            match new_isin_id {
                Some(id) => patient.isin_id = Some(id),
                None => return Ok(()),
            }
        }

        // 2. data confirmed correct but not exported
        tracing::debug!("Checking correctness exported to ISIN of patient {}", patient.id);
        if request.export_patients_info
            && patient
                .data_correctness
                .as_ref()
                .is_some_and(|dc| dc.awaits_export())
        {
            let exported = self.retry_contact_info_export(&patient).await?;
            stats.record_info_export(exported);
        }

        // 3. vaccinated but vaccination not exported
        if request.export_vaccinations
            && patient
                .vaccinated
                .as_ref()
                .is_some_and(|v| v.exported_to_isin_on.is_none())
        {
            let exported = self.retry_vaccination_export(&patient).await?;
            stats.record_vaccination_export(exported);
        }

        Ok(())
    }

    /// Returns the trimmed ISIN id once it has been stored.
    async fn retry_patient_validation(&self, patient: &Patient) -> Result<Option<String>> {
        let personal_number = patient
            .personal_number()
            .ok_or_else(|| IsinError::precondition("Personal number cannot be null."))?;

        let result = self
            .validation
            .validate_patient(&patient.first_name, &patient.last_name, personal_number)
            .await;
        tracing::info!(
            "Validation of patient {} completed: status={:?}, isinPatientId={:?}.",
            patient.id,
            result.status,
            result.patient_id
        );

        let new_isin_id = result
            .found_patient_id()
            .map(str::trim)
            .filter(|id| !id.is_empty());
        match new_isin_id {
            Some(id) => {
                tracing::debug!("Updating ISIN id of patient {} to {}", patient.id, id);
                self.store.update_isin_id(&patient.id, id).await?;
                Ok(Some(id.to_string()))
            }
            None => {
                tracing::debug!("NOT updating ISIN id of patient {}", patient.id);
                Ok(None)
            }
        }
    }

    async fn retry_contact_info_export(&self, patient: &Patient) -> Result<bool> {
        let correctness = patient
            .data_correctness
            .as_ref()
            .ok_or_else(|| IsinError::precondition("Data correctness cannot be null."))?;

        let exported = self
            .export
            .try_export_patient_contact_info(patient, correctness.notes.as_deref())
            .await?;

        if exported {
            tracing::debug!(
                "Updating exported to ISIN of correctness {} (patient {})",
                correctness.id,
                patient.id
            );
            self.store
                .mark_correctness_exported(&correctness.id, Utc::now())
                .await?;
        } else {
            tracing::debug!(
                "NOT updating exported to ISIN of correctness {} (patient {})",
                correctness.id,
                patient.id
            );
        }
        Ok(exported)
    }

    async fn retry_vaccination_export(&self, patient: &Patient) -> Result<bool> {
        let summary = patient
            .vaccinated
            .as_ref()
            .ok_or_else(|| IsinError::precondition("Vaccination cannot be null."))?;

        let vaccination = self.store.get_vaccination(&summary.id).await?;
        let exported = self
            .export
            .try_create_vaccination_and_dose(&vaccination, patient)
            .await?;

        if exported {
            tracing::debug!(
                "Updating exported to ISIN of vaccination {} (patient {})",
                summary.id,
                patient.id
            );
            self.store
                .mark_vaccination_exported(&summary.id, Utc::now())
                .await?;
        } else {
            tracing::debug!(
                "NOT updating exported to ISIN of vaccination {} (patient {})",
                summary.id,
                patient.id
            );
        }
        Ok(exported)
    }
}
