use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub personal_number: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub insurance_company: Option<String>,
    #[serde(default)]
    pub isin_id: Option<String>,
    #[serde(default, alias = "dataCorrect")]
    pub data_correctness: Option<DataCorrectness>,
    #[serde(default)]
    pub vaccinated: Option<VaccinationSummary>,
}

impl Patient {
    /// Registry id, treating blank strings as absent.
    pub fn isin_id(&self) -> Option<&str> {
        non_blank(&self.isin_id)
    }

    pub fn personal_number(&self) -> Option<&str> {
        non_blank(&self.personal_number)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCorrectness {
    pub id: String,
    pub data_are_correct: bool,
    #[serde(default)]
    pub exported_to_isin_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DataCorrectness {
    pub fn awaits_export(&self) -> bool {
        self.data_are_correct && self.exported_to_isin_on.is_none()
    }
}

/// Vaccination reference embedded in a patient record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationSummary {
    pub id: String,
    #[serde(default)]
    pub exported_to_isin_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BodyPart {
    DominantHand,
    NonDominantHand,
    Buttock,
}

impl BodyPart {
    /// Application site code understood by ISIN.
    pub fn isin_code(&self) -> &'static str {
        match self {
            BodyPart::DominantHand => "DominantniRameno",
            BodyPart::NonDominantHand => "NedominantniRameno",
            BodyPart::Buttock => "Hyzde",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personnel {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

fn default_dose_number() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VaccinationDetail {
    pub vaccination_id: String,
    pub patient_id: String,
    pub body_part: BodyPart,
    pub vaccinated_on: DateTime<Utc>,
    pub vaccine_serial_number: String,
    #[serde(default)]
    pub vaccine_expiration: Option<NaiveDate>,
    #[serde(default = "default_dose_number")]
    pub dose_number: u32,
    pub doctor: Personnel,
    #[serde(default)]
    pub nurse: Option<Personnel>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub exported_to_isin_on: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    pub patients_count: usize,
    #[serde(default)]
    pub patients_offset: usize,
    #[serde(default = "default_true")]
    pub validate_patients: bool,
    #[serde(default = "default_true")]
    pub export_patients_info: bool,
    #[serde(default = "default_true")]
    pub export_vaccinations: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStats {
    pub validated_patients_success: u64,
    pub validated_patients_errors: u64,
    pub exported_patients_info_success: u64,
    pub exported_patients_info_errors: u64,
    pub exported_vaccinations_success: u64,
    pub exported_vaccinations_errors: u64,
}

impl JobStats {
    pub fn record_validation(&mut self, success: bool) {
        if success {
            self.validated_patients_success += 1;
        } else {
            self.validated_patients_errors += 1;
        }
    }

    pub fn record_info_export(&mut self, success: bool) {
        if success {
            self.exported_patients_info_success += 1;
        } else {
            self.exported_patients_info_errors += 1;
        }
    }

    pub fn record_vaccination_export(&mut self, success: bool) {
        if success {
            self.exported_vaccinations_success += 1;
        } else {
            self.exported_vaccinations_errors += 1;
        }
    }

    pub fn errors(&self) -> u64 {
        self.validated_patients_errors
            + self.exported_patients_info_errors
            + self.exported_vaccinations_errors
    }

    /// True when no step was attempted at all.
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationStatus {
    PatientFound,
    PatientNotFound,
    WasNotVerified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub status: ValidationStatus,
    pub patient_id: Option<String>,
}

impl ValidationResult {
    pub fn found(patient_id: Option<String>) -> Self {
        Self {
            status: ValidationStatus::PatientFound,
            patient_id,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: ValidationStatus::PatientNotFound,
            patient_id: None,
        }
    }

    pub fn not_verified() -> Self {
        Self {
            status: ValidationStatus::WasNotVerified,
            patient_id: None,
        }
    }

    /// The registry id, present only for a found patient.
    pub fn found_patient_id(&self) -> Option<&str> {
        match self.status {
            ValidationStatus::PatientFound => self.patient_id.as_deref(),
            _ => None,
        }
    }
}

/// Fields ISIN returns for a patient lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientLookupResponse {
    #[serde(default)]
    pub vysledek: Option<String>,
    #[serde(default)]
    pub vysledek_zprava: Option<String>,
    #[serde(default)]
    pub pacient: Option<LookupPatient>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LookupPatient {
    #[serde(default)]
    pub id: Option<String>,
}

impl PatientLookupResponse {
    pub fn patient_id(&self) -> Option<&str> {
        self.pacient.as_ref().and_then(|p| p.id.as_deref())
    }
}
