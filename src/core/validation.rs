use crate::domain::model::{ValidationResult, ValidationStatus};
use crate::domain::personal_number;
use crate::domain::ports::IsinApi;
use crate::domain::result_code::ResultCodeTable;
use crate::utils::error::Result;
use std::sync::Arc;

/// Validates patient identity against ISIN.
pub struct PatientValidationService<A: IsinApi> {
    api: Arc<A>,
    codes: ResultCodeTable,
}

impl<A: IsinApi> PatientValidationService<A> {
    pub fn new(api: Arc<A>) -> Result<Self> {
        Ok(Self {
            api,
            codes: ResultCodeTable::verified()?,
        })
    }

    /// Never fails: transport and parse errors come back as `WasNotVerified`.
    pub async fn validate_patient(
        &self,
        first_name: &str,
        last_name: &str,
        personal_number: &str,
    ) -> ValidationResult {
        let first_name = first_name.trim().to_uppercase();
        let last_name = last_name.trim().to_uppercase();
        let personal_number = personal_number::normalize(personal_number);

        if let Err(reason) = personal_number::validate(&personal_number) {
            tracing::warn!("Submitting personal number despite local check failure: {}", reason);
            tracing::debug!("Personal number failing local check: {}", personal_number);
        }

        let response = match self
            .api
            .find_patient(&first_name, &last_name, &personal_number)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("Getting data from isin server failed: {}", e);
                tracing::debug!(
                    "Failed lookup was for patient {}/{}/{}",
                    first_name,
                    last_name,
                    personal_number
                );
                return ValidationResult::not_verified();
            }
        };

        tracing::debug!(
            "Data from ISIN for patient {}/{}/{}: result={:?}, resultMessage={:?}, patientId={:?}",
            first_name,
            last_name,
            personal_number,
            response.vysledek,
            response.vysledek_zprava,
            response.patient_id()
        );

        match self.codes.status_of(response.vysledek.as_deref()) {
            ValidationStatus::PatientFound => {
                ValidationResult::found(response.patient_id().map(str::to_string))
            }
            ValidationStatus::PatientNotFound => ValidationResult::not_found(),
            ValidationStatus::WasNotVerified => ValidationResult::not_verified(),
        }
    }
}
