use crate::config::toml_config::{IsinSettings, WorkerIdentification};
use crate::domain::model::PatientLookupResponse;
use crate::domain::ports::IsinApi;
use crate::domain::requests::{ContactInfoUpdate, DoseCreate, VaccinationCreate};
use crate::utils::error::{IsinError, Result};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, Identity, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

const URL_FIND_PATIENT: &str = "pacienti/VyhledatDleJmenoPrijmeniRc";
const URL_UPDATE_CONTACT_INFO: &str = "pacienti/AktualizujKontaktniUdajePacienta";
const URL_CREATE_VACCINATION: &str = "vakcinace/VytvorNeboZmenVakcinaci";
const URL_CREATE_DOSE: &str = "vakcinace/VytvorNeboZmenDavku";

/// Longest response excerpt kept in error messages.
const MAX_ERROR_BODY: usize = 300;

enum ClientIdentity {
    NativeTls(Identity),
    Rustls(Identity),
}

#[derive(Debug, Deserialize)]
struct VaccinationCreated {
    id: String,
}

/// Certificate-authenticated ISIN client. No retries: a failed call is
/// reported to the caller and picked up again by a later job run.
pub struct IsinClient {
    client: Client,
    root_url: Url,
    worker: WorkerIdentification,
}

impl IsinClient {
    pub fn new(settings: &IsinSettings) -> Result<Self> {
        let root_url = Url::parse(&settings.root_url).map_err(|e| {
            IsinError::InvalidConfigValueError {
                field: "isin.root_url".to_string(),
                value: settings.root_url.clone(),
                reason: e.to_string(),
            }
        })?;

        let mut builder = Client::builder().timeout(settings.request_timeout());
        match load_identity(settings) {
            Ok(ClientIdentity::NativeTls(identity)) => {
                tracing::debug!("KeyStore loaded.");
                builder = builder.use_native_tls().identity(identity);
            }
            Ok(ClientIdentity::Rustls(identity)) => {
                tracing::debug!("PEM identity loaded.");
                builder = builder.use_rustls_tls().identity(identity);
            }
            Err(e) => {
                // requests will fail at the TLS layer and count as unverified
                tracing::error!("It was not possible to load key store: {}", e);
            }
        }

        Ok(Self {
            client: builder.build()?,
            root_url,
            worker: settings.pracovnik.clone(),
        })
    }

    /// `{root}/{operation}/{p1}/.../{pN}?pcz=..&pracovnikNrzpCislo=..`
    pub fn isin_url(&self, operation: &str, parameters: &[&str]) -> Result<Url> {
        build_url(&self.root_url, operation, parameters, &self.worker)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> Result<Response> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let message = excerpt(&response.text().await.unwrap_or_default());
            return Err(IsinError::RemoteError {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    async fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        match serde_json::from_str(&body) {
            Ok(parsed) => Ok(parsed),
            Err(_) if !status.is_success() => Err(IsinError::RemoteError {
                status: status.as_u16(),
                message: excerpt(&body),
            }),
            Err(e) => Err(IsinError::SerializationError(e)),
        }
    }
}

#[async_trait]
impl IsinApi for IsinClient {
    async fn find_patient(
        &self,
        first_name: &str,
        last_name: &str,
        personal_number: &str,
    ) -> Result<PatientLookupResponse> {
        let url = self.isin_url(URL_FIND_PATIENT, &[first_name, last_name, personal_number])?;
        let response = self.client.get(url).send().await?;
        tracing::debug!("ISIN lookup responded with {}", response.status());
        // lookup rejections still carry a result code in the body
        Self::parse_body(response).await
    }

    async fn update_contact_info(&self, request: &ContactInfoUpdate) -> Result<()> {
        let url = self.isin_url(URL_UPDATE_CONTACT_INFO, &[])?;
        self.post_json(url, request).await?;
        Ok(())
    }

    async fn create_vaccination(&self, request: &VaccinationCreate) -> Result<String> {
        let url = self.isin_url(URL_CREATE_VACCINATION, &[])?;
        let response = self.post_json(url, request).await?;
        let created: VaccinationCreated = Self::parse_body(response).await?;
        Ok(created.id)
    }

    async fn create_dose(&self, request: &DoseCreate) -> Result<()> {
        let url = self.isin_url(URL_CREATE_DOSE, &[])?;
        self.post_json(url, request).await?;
        Ok(())
    }
}

fn build_url(
    root: &Url,
    operation: &str,
    parameters: &[&str],
    worker: &WorkerIdentification,
) -> Result<Url> {
    let mut url = root.clone();
    url.path_segments_mut()
        .map_err(|_| IsinError::config(format!("ISIN root URL '{}' cannot be a base", root)))?
        .pop_if_empty()
        .extend(operation.split('/'))
        .extend(parameters);
    url.query_pairs_mut()
        .clear()
        .append_pair("pcz", &worker.pcz)
        .append_pair("pracovnikNrzpCislo", &worker.nrzp_cislo);
    Ok(url)
}

fn load_identity(settings: &IsinSettings) -> Result<ClientIdentity> {
    let encoded = settings
        .cert_base64
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| IsinError::CertificateError {
            message: "no certificate configured".to_string(),
        })?;
    let der = general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| IsinError::CertificateError {
            message: format!("certificate is not valid base64: {}", e),
        })?;

    match settings.store_type.to_ascii_uppercase().as_str() {
        "PKCS12" => {
            let mut last_error = None;
            for password in settings.passwords() {
                match Identity::from_pkcs12_der(&der, password) {
                    Ok(identity) => return Ok(ClientIdentity::NativeTls(identity)),
                    Err(e) => last_error = Some(e),
                }
            }
            Err(IsinError::CertificateError {
                message: format!(
                    "unable to open PKCS12 store: {}",
                    last_error.map(|e| e.to_string()).unwrap_or_default()
                ),
            })
        }
        "PEM" => Identity::from_pem(&der)
            .map(ClientIdentity::Rustls)
            .map_err(|e| IsinError::CertificateError {
                message: format!("unable to read PEM identity: {}", e),
            }),
        other => Err(IsinError::CertificateError {
            message: format!("unsupported store type {}", other),
        }),
    }
}

fn excerpt(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}
