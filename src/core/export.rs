use crate::domain::model::{Patient, VaccinationDetail};
use crate::domain::ports::IsinApi;
use crate::domain::requests::{ContactInfoUpdate, DoseCreate, VaccinationCreate};
use crate::utils::error::{IsinError, Result};
use std::sync::Arc;

/// Pushes locally confirmed data to ISIN. Persisting the export marker is
/// left to the caller once `Ok(true)` comes back.
pub struct IsinExportService<A: IsinApi> {
    api: Arc<A>,
}

fn require_isin_id(patient: &Patient) -> Result<&str> {
    patient.isin_id().map(str::trim).ok_or_else(|| {
        IsinError::precondition(format!("ISIN id of patient {} cannot be null.", patient.id))
    })
}

impl<A: IsinApi> IsinExportService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn try_export_patient_contact_info(
        &self,
        patient: &Patient,
        notes: Option<&str>,
    ) -> Result<bool> {
        let isin_id = require_isin_id(patient)?;
        let request = ContactInfoUpdate::new(isin_id, patient, notes);

        match self.api.update_contact_info(&request).await {
            Ok(()) => {
                tracing::debug!("Contact info of patient {} exported to ISIN", patient.id);
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(
                    "Export of contact info of patient {} to ISIN failed: {}",
                    patient.id,
                    e
                );
                Ok(false)
            }
        }
    }

    /// Creates the vaccination, then its dose. Both must succeed.
    pub async fn try_create_vaccination_and_dose(
        &self,
        vaccination: &VaccinationDetail,
        patient: &Patient,
    ) -> Result<bool> {
        let isin_id = require_isin_id(patient)?;

        let vaccination_isin_id = match self
            .api
            .create_vaccination(&VaccinationCreate::new(isin_id, vaccination))
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(
                    "Creating vaccination {} of patient {} in ISIN failed: {}",
                    vaccination.vaccination_id,
                    patient.id,
                    e
                );
                return Ok(false);
            }
        };
        tracing::debug!(
            "Vaccination {} created in ISIN as {}",
            vaccination.vaccination_id,
            vaccination_isin_id
        );

        let dose = DoseCreate::new(&vaccination_isin_id, isin_id, vaccination);
        match self.api.create_dose(&dose).await {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::warn!(
                    "Creating dose {} of vaccination {} in ISIN failed: {}",
                    vaccination.dose_number,
                    vaccination_isin_id,
                    e
                );
                Ok(false)
            }
        }
    }
}
