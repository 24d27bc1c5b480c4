//! Request bodies sent to ISIN.

use crate::domain::model::{Patient, VaccinationDetail};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfoUpdate {
    pub pacient_id: String,
    pub kontaktni_mobilni_telefon: Option<String>,
    pub kontaktni_email: Option<String>,
    pub poznamka: Option<String>,
}

impl ContactInfoUpdate {
    pub fn new(isin_id: &str, patient: &Patient, notes: Option<&str>) -> Self {
        Self {
            pacient_id: isin_id.to_string(),
            kontaktni_mobilni_telefon: patient.phone_number.clone(),
            kontaktni_email: patient.email.clone(),
            poznamka: notes.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationCreate {
    pub pacient_id: String,
    pub datum_vakcinace: DateTime<Utc>,
    pub sarze: String,
    pub expirace: Option<NaiveDate>,
    pub misto_aplikace: &'static str,
    pub poznamka: Option<String>,
}

impl VaccinationCreate {
    pub fn new(isin_id: &str, detail: &VaccinationDetail) -> Self {
        Self {
            pacient_id: isin_id.to_string(),
            datum_vakcinace: detail.vaccinated_on,
            sarze: detail.vaccine_serial_number.clone(),
            expirace: detail.vaccine_expiration,
            misto_aplikace: detail.body_part.isin_code(),
            poznamka: detail.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoseCreate {
    pub vakcinace_id: String,
    pub pacient_id: String,
    pub datum_vakcinace: DateTime<Utc>,
    pub davka: u32,
    pub sarze: String,
    pub misto_aplikace: &'static str,
    pub ockujici_lekar: String,
}

impl DoseCreate {
    pub fn new(vaccination_isin_id: &str, isin_id: &str, detail: &VaccinationDetail) -> Self {
        Self {
            vakcinace_id: vaccination_isin_id.to_string(),
            pacient_id: isin_id.to_string(),
            datum_vakcinace: detail.vaccinated_on,
            davka: detail.dose_number,
            sarze: detail.vaccine_serial_number.clone(),
            misto_aplikace: detail.body_part.isin_code(),
            ockujici_lekar: format!("{} {}", detail.doctor.first_name, detail.doctor.last_name),
        }
    }
}
