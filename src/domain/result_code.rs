//! Patient lookup result codes returned by ISIN in the `vysledek` field.

use crate::domain::model::ValidationStatus;
use crate::utils::error::{IsinError, Result};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatientLookupCode {
    PacientNalezen,
    NalezenoVicePacientu,
    PacientNebylNalezen,
    CizinecZaloz,
    ChybaVstupnichDat,
    Chyba,
}

impl PatientLookupCode {
    pub const ALL: [PatientLookupCode; 6] = [
        PatientLookupCode::PacientNalezen,
        PatientLookupCode::NalezenoVicePacientu,
        PatientLookupCode::PacientNebylNalezen,
        PatientLookupCode::CizinecZaloz,
        PatientLookupCode::ChybaVstupnichDat,
        PatientLookupCode::Chyba,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PacientNalezen => "PacientNalezen",
            Self::NalezenoVicePacientu => "NalezenoVicePacientu",
            Self::PacientNebylNalezen => "PacientNebylNalezen",
            Self::CizinecZaloz => "CizinecZaloz",
            Self::ChybaVstupnichDat => "ChybaVstupnichDat",
            Self::Chyba => "Chyba",
        }
    }

    pub fn status(&self) -> ValidationStatus {
        match self {
            Self::PacientNalezen | Self::NalezenoVicePacientu => ValidationStatus::PatientFound,
            Self::PacientNebylNalezen | Self::ChybaVstupnichDat => {
                ValidationStatus::PatientNotFound
            }
            Self::CizinecZaloz | Self::Chyba => ValidationStatus::WasNotVerified,
        }
    }
}

/// Code to status lookup, built once when the client starts.
#[derive(Debug, Clone)]
pub struct ResultCodeTable {
    entries: HashMap<&'static str, ValidationStatus>,
}

impl ResultCodeTable {
    pub fn verified() -> Result<Self> {
        Self::from_codes(&PatientLookupCode::ALL)
    }

    fn from_codes(codes: &[PatientLookupCode]) -> Result<Self> {
        let mut entries = HashMap::with_capacity(codes.len());
        for code in codes {
            let name = code.as_str();
            if name.trim().is_empty() {
                return Err(IsinError::config("empty ISIN result code in mapping table"));
            }
            if entries.insert(name, code.status()).is_some() {
                return Err(IsinError::config(format!(
                    "ISIN result code '{}' mapped more than once",
                    name
                )));
            }
        }

        for required in [ValidationStatus::PatientFound, ValidationStatus::PatientNotFound] {
            if !entries.values().any(|status| *status == required) {
                return Err(IsinError::config(format!(
                    "no ISIN result code maps to {:?}",
                    required
                )));
            }
        }

        Ok(Self { entries })
    }

    /// Unknown or missing codes are treated as unverified.
    pub fn status_of(&self, code: Option<&str>) -> ValidationStatus {
        code.and_then(|c| self.entries.get(c).copied())
            .unwrap_or(ValidationStatus::WasNotVerified)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
