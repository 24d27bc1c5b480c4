use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use isin_retry::adapters::RegistrySnapshot;
use isin_retry::domain::model::{
    BodyPart, DataCorrectness, Patient, PatientLookupResponse, Personnel, VaccinationDetail,
    VaccinationSummary,
};
use isin_retry::domain::ports::{IsinApi, Storage};
use isin_retry::domain::requests::{ContactInfoUpdate, DoseCreate, VaccinationCreate};
use isin_retry::{IsinError, IsinRetryJob, JobRequest, JobStats, JsonPatientStore, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Default)]
struct MockStorage {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl Storage for MockStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let files = self.files.lock().await;
        files.get(path).cloned().ok_or_else(|| {
            IsinError::IoError(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("File not found: {}", path),
            ))
        })
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let mut files = self.files.lock().await;
        files.insert(path.to_string(), data.to_vec());
        Ok(())
    }
}

const FOUND_AB12: &str = r#"{"vysledek": "PacientNalezen", "pacient": {"id": "AB12 "}}"#;

/// ISIN double; `lookup_body: None` simulates a transport failure.
struct ScriptedIsin {
    lookup_body: Option<String>,
    contact_ok: bool,
    vaccination_ok: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl ScriptedIsin {
    fn new() -> Self {
        Self {
            lookup_body: Some(FOUND_AB12.to_string()),
            contact_ok: true,
            vaccination_ok: true,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn with_lookup(mut self, body: Option<&str>) -> Self {
        self.lookup_body = body.map(str::to_string);
        self
    }

    fn with_contact_ok(mut self, ok: bool) -> Self {
        self.contact_ok = ok;
        self
    }

    fn with_vaccination_ok(mut self, ok: bool) -> Self {
        self.vaccination_ok = ok;
        self
    }

    async fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().await.clone()
    }
}

fn rejected() -> IsinError {
    IsinError::RemoteError {
        status: 400,
        message: "rejected".to_string(),
    }
}

#[async_trait]
impl IsinApi for ScriptedIsin {
    async fn find_patient(&self, _: &str, _: &str, _: &str) -> Result<PatientLookupResponse> {
        self.calls.lock().await.push("find");
        match &self.lookup_body {
            Some(body) => Ok(serde_json::from_str(body)?),
            None => Err(IsinError::IoError(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset",
            ))),
        }
    }

    async fn update_contact_info(&self, _request: &ContactInfoUpdate) -> Result<()> {
        self.calls.lock().await.push("contact");
        if self.contact_ok {
            Ok(())
        } else {
            Err(rejected())
        }
    }

    async fn create_vaccination(&self, _request: &VaccinationCreate) -> Result<String> {
        self.calls.lock().await.push("vaccination");
        if self.vaccination_ok {
            Ok("VAK-1".to_string())
        } else {
            Err(rejected())
        }
    }

    async fn create_dose(&self, _request: &DoseCreate) -> Result<()> {
        self.calls.lock().await.push("dose");
        Ok(())
    }
}

fn patient(id: &str, personal_number: Option<&str>, isin_id: Option<&str>) -> Patient {
    Patient {
        id: id.to_string(),
        first_name: "Jan".to_string(),
        last_name: "Novak".to_string(),
        personal_number: personal_number.map(str::to_string),
        phone_number: Some("+420123456789".to_string()),
        email: Some("jan@example.cz".to_string()),
        insurance_company: Some("111".to_string()),
        isin_id: isin_id.map(str::to_string),
        data_correctness: None,
        vaccinated: None,
    }
}

fn awaiting_correctness(id: &str) -> Option<DataCorrectness> {
    Some(DataCorrectness {
        id: id.to_string(),
        data_are_correct: true,
        exported_to_isin_on: None,
        notes: Some("phone confirmed".to_string()),
    })
}

fn vaccination_detail(id: &str, patient_id: &str) -> VaccinationDetail {
    VaccinationDetail {
        vaccination_id: id.to_string(),
        patient_id: patient_id.to_string(),
        body_part: BodyPart::DominantHand,
        vaccinated_on: Utc.with_ymd_and_hms(2021, 3, 1, 9, 30, 0).unwrap(),
        vaccine_serial_number: "EW2243".to_string(),
        vaccine_expiration: None,
        dose_number: 1,
        doctor: Personnel {
            id: "d1".to_string(),
            first_name: "Karel".to_string(),
            last_name: "Lekar".to_string(),
            email: "k@example.cz".to_string(),
        },
        nurse: None,
        notes: None,
        exported_to_isin_on: None,
    }
}

fn request(validate: bool, export_info: bool, export_vaccinations: bool) -> JobRequest {
    JobRequest {
        patients_count: 100,
        patients_offset: 0,
        validate_patients: validate,
        export_patients_info: export_info,
        export_vaccinations,
    }
}

fn job(
    snapshot: RegistrySnapshot,
    api: ScriptedIsin,
) -> (IsinRetryJob<JsonPatientStore<MockStorage>, ScriptedIsin>, Arc<ScriptedIsin>) {
    let api = Arc::new(api);
    let store =
        JsonPatientStore::with_snapshot(MockStorage::default(), "patients.json", snapshot);
    (IsinRetryJob::new(store, api.clone()).unwrap(), api)
}

#[tokio::test]
async fn test_validation_disabled_makes_no_call() {
    let snapshot = RegistrySnapshot {
        patients: vec![patient("p1", Some("990101/1234"), None)],
        vaccinations: vec![],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new());

    let stats = job.run(&request(false, true, true)).await.unwrap();

    assert_eq!(stats, JobStats::default());
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn test_found_patient_gets_trimmed_isin_id() {
    let snapshot = RegistrySnapshot {
        patients: vec![patient("p1", Some("990101/1234"), None)],
        vaccinations: vec![],
    };
    let (job, _api) = job(snapshot, ScriptedIsin::new());

    let stats = job.run(&request(true, false, false)).await.unwrap();

    assert_eq!(stats.validated_patients_success, 1);
    assert_eq!(stats.validated_patients_errors, 0);
    let stored = job.store().snapshot().await;
    assert_eq!(stored.patients[0].isin_id.as_deref(), Some("AB12"));
}

#[tokio::test]
async fn test_transport_error_counts_validation_error() {
    let snapshot = RegistrySnapshot {
        patients: vec![patient("p1", Some("990101/1234"), None)],
        vaccinations: vec![],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new().with_lookup(None));

    let stats = job.run(&request(true, true, true)).await.unwrap();

    assert_eq!(stats.validated_patients_errors, 1);
    assert_eq!(stats.validated_patients_success, 0);
    assert_eq!(api.calls().await, vec!["find"]);
    assert!(job.store().snapshot().await.patients[0].isin_id.is_none());
}

#[tokio::test]
async fn test_not_found_patient_skips_exports() {
    let mut unvalidated = patient("p1", Some("990101/1234"), None);
    unvalidated.data_correctness = awaiting_correctness("dc1");
    let snapshot = RegistrySnapshot {
        patients: vec![unvalidated],
        vaccinations: vec![],
    };
    let (job, api) = job(
        snapshot,
        ScriptedIsin::new().with_lookup(Some(r#"{"vysledek": "PacientNebylNalezen"}"#)),
    );

    let stats = job.run(&request(true, true, true)).await.unwrap();

    assert_eq!(stats.validated_patients_errors, 1);
    assert_eq!(stats.exported_patients_info_success + stats.exported_patients_info_errors, 0);
    assert_eq!(api.calls().await, vec!["find"]);
}

#[tokio::test]
async fn test_found_without_usable_id_counts_validation_error() {
    let bodies = [
        r#"{"vysledek": "PacientNalezen"}"#,
        r#"{"vysledek": "PacientNalezen", "pacient": {"id": "   "}}"#,
    ];

    for body in bodies {
        let mut unvalidated = patient("p1", Some("990101/1234"), None);
        unvalidated.data_correctness = awaiting_correctness("dc1");
        unvalidated.vaccinated = Some(VaccinationSummary {
            id: "v1".to_string(),
            exported_to_isin_on: None,
        });
        let snapshot = RegistrySnapshot {
            patients: vec![unvalidated],
            vaccinations: vec![vaccination_detail("v1", "p1")],
        };
        let (job, api) = job(snapshot, ScriptedIsin::new().with_lookup(Some(body)));

        let stats = job.run(&request(true, true, true)).await.unwrap();

        assert_eq!(stats.validated_patients_errors, 1, "body: {}", body);
        assert_eq!(stats.validated_patients_success, 0);
        assert_eq!(stats.exported_patients_info_success, 0);
        assert_eq!(stats.exported_patients_info_errors, 0);
        assert_eq!(stats.exported_vaccinations_success, 0);
        assert_eq!(stats.exported_vaccinations_errors, 0);
        assert_eq!(api.calls().await, vec!["find"]);
        assert!(job.store().snapshot().await.patients[0].isin_id.is_none());
    }
}

#[tokio::test]
async fn test_missing_isin_id_gates_exports() {
    let mut unvalidated = patient("p1", None, None);
    unvalidated.data_correctness = awaiting_correctness("dc1");
    unvalidated.vaccinated = Some(VaccinationSummary {
        id: "v1".to_string(),
        exported_to_isin_on: None,
    });
    let snapshot = RegistrySnapshot {
        patients: vec![unvalidated],
        vaccinations: vec![vaccination_detail("v1", "p1")],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new());

    let stats = job.run(&request(true, true, true)).await.unwrap();

    assert!(stats.is_idle());
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn test_already_exported_correctness_is_not_exported_again() {
    let mut validated = patient("p1", Some("990101/1234"), Some("AB12"));
    validated.data_correctness = Some(DataCorrectness {
        id: "dc1".to_string(),
        data_are_correct: true,
        exported_to_isin_on: Some(Utc::now()),
        notes: None,
    });
    let snapshot = RegistrySnapshot {
        patients: vec![validated],
        vaccinations: vec![],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new());

    let stats = job.run(&request(true, true, true)).await.unwrap();

    assert!(stats.is_idle());
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn test_incorrect_data_is_not_exported() {
    let mut validated = patient("p1", None, Some("AB12"));
    validated.data_correctness = Some(DataCorrectness {
        id: "dc1".to_string(),
        data_are_correct: false,
        exported_to_isin_on: None,
        notes: None,
    });
    let snapshot = RegistrySnapshot {
        patients: vec![validated],
        vaccinations: vec![],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new());

    let stats = job.run(&request(true, true, true)).await.unwrap();

    assert!(stats.is_idle());
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn test_rejected_contact_export_keeps_timestamp_null() {
    let mut validated = patient("p1", None, Some("AB12"));
    validated.data_correctness = awaiting_correctness("dc1");
    let snapshot = RegistrySnapshot {
        patients: vec![validated],
        vaccinations: vec![],
    };
    let (job, _api) = job(snapshot, ScriptedIsin::new().with_contact_ok(false));

    let stats = job.run(&request(true, true, true)).await.unwrap();

    assert_eq!(stats.exported_patients_info_errors, 1);
    assert_eq!(stats.exported_patients_info_success, 0);
    let stored = job.store().snapshot().await;
    let correctness = stored.patients[0].data_correctness.as_ref().unwrap();
    assert!(correctness.exported_to_isin_on.is_none());
}

#[tokio::test]
async fn test_failed_step_does_not_block_next_step() {
    let mut validated = patient("p1", None, Some("AB12"));
    validated.data_correctness = awaiting_correctness("dc1");
    validated.vaccinated = Some(VaccinationSummary {
        id: "v1".to_string(),
        exported_to_isin_on: None,
    });
    let snapshot = RegistrySnapshot {
        patients: vec![validated],
        vaccinations: vec![vaccination_detail("v1", "p1")],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new().with_contact_ok(false));

    let stats = job.run(&request(true, true, true)).await.unwrap();

    assert_eq!(stats.exported_patients_info_errors, 1);
    assert_eq!(stats.exported_vaccinations_success, 1);
    assert_eq!(api.calls().await, vec!["contact", "vaccination", "dose"]);
}

#[tokio::test]
async fn test_newly_validated_patient_is_exported_in_same_run() {
    let mut unvalidated = patient("p1", Some("990101/1234"), None);
    unvalidated.data_correctness = awaiting_correctness("dc1");
    unvalidated.vaccinated = Some(VaccinationSummary {
        id: "v1".to_string(),
        exported_to_isin_on: None,
    });
    let snapshot = RegistrySnapshot {
        patients: vec![unvalidated],
        vaccinations: vec![vaccination_detail("v1", "p1")],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new());

    let stats = job.run(&request(true, true, true)).await.unwrap();

    assert_eq!(
        stats,
        JobStats {
            validated_patients_success: 1,
            validated_patients_errors: 0,
            exported_patients_info_success: 1,
            exported_patients_info_errors: 0,
            exported_vaccinations_success: 1,
            exported_vaccinations_errors: 0,
        }
    );
    assert_eq!(api.calls().await, vec!["find", "contact", "vaccination", "dose"]);

    let stored = job.store().snapshot().await;
    assert!(stored.patients[0].data_correctness.as_ref().unwrap().exported_to_isin_on.is_some());
    assert!(stored.patients[0].vaccinated.as_ref().unwrap().exported_to_isin_on.is_some());
    assert!(stored.vaccinations[0].exported_to_isin_on.is_some());
}

#[tokio::test]
async fn test_second_run_after_full_repair_is_idle() {
    let mut unvalidated = patient("p1", Some("990101/1234"), None);
    unvalidated.data_correctness = awaiting_correctness("dc1");
    unvalidated.vaccinated = Some(VaccinationSummary {
        id: "v1".to_string(),
        exported_to_isin_on: None,
    });
    let snapshot = RegistrySnapshot {
        patients: vec![unvalidated, patient("p2", Some("015101/0002"), None)],
        vaccinations: vec![vaccination_detail("v1", "p1")],
    };
    let (job, _api) = job(snapshot, ScriptedIsin::new());
    let flags = request(true, true, true);

    let first = job.run(&flags).await.unwrap();
    assert_eq!(first.validated_patients_success, 2);
    assert_eq!(first.errors(), 0);

    let second = job.run(&flags).await.unwrap();
    assert!(second.is_idle());
}

#[tokio::test]
async fn test_paging_limits_processed_patients() {
    let snapshot = RegistrySnapshot {
        patients: vec![
            patient("p1", Some("990101/1234"), None),
            patient("p2", Some("990101/1234"), None),
            patient("p3", Some("990101/1234"), None),
        ],
        vaccinations: vec![],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new());
    let page = JobRequest {
        patients_count: 1,
        patients_offset: 1,
        ..request(true, false, false)
    };

    let outcome = job.run_page(&page).await.unwrap();

    assert_eq!(outcome.patients_processed, 1);
    assert_eq!(outcome.stats.validated_patients_success, 1);
    assert_eq!(api.calls().await.len(), 1);
    let stored = job.store().snapshot().await;
    assert!(stored.patients[0].isin_id.is_none());
    assert_eq!(stored.patients[1].isin_id.as_deref(), Some("AB12"));
    assert!(stored.patients[2].isin_id.is_none());
}

#[tokio::test]
async fn test_missing_vaccination_detail_aborts_run() {
    let mut validated = patient("p1", None, Some("AB12"));
    validated.vaccinated = Some(VaccinationSummary {
        id: "v-missing".to_string(),
        exported_to_isin_on: None,
    });
    let snapshot = RegistrySnapshot {
        patients: vec![validated, patient("p2", Some("990101/1234"), None)],
        vaccinations: vec![],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new());

    let err = job.run(&request(true, true, true)).await.unwrap_err();

    assert!(matches!(err, IsinError::NotFoundError { .. }));
    // p2 never reached
    assert!(api.calls().await.is_empty());
}

#[tokio::test]
async fn test_rejected_vaccination_counts_error() {
    let mut validated = patient("p1", None, Some("AB12"));
    validated.vaccinated = Some(VaccinationSummary {
        id: "v1".to_string(),
        exported_to_isin_on: None,
    });
    let snapshot = RegistrySnapshot {
        patients: vec![validated],
        vaccinations: vec![vaccination_detail("v1", "p1")],
    };
    let (job, api) = job(snapshot, ScriptedIsin::new().with_vaccination_ok(false));

    let stats = job.run(&request(false, false, true)).await.unwrap();

    assert_eq!(stats.exported_vaccinations_errors, 1);
    assert_eq!(api.calls().await, vec!["vaccination"]);
    assert!(job.store().snapshot().await.vaccinations[0].exported_to_isin_on.is_none());
}
