use std::sync::Arc;

use anyhow::Context;
use folio_extern_contracts::relay::{
    FormRelayApiService, FormRelayErrorBody, FormRelayFieldError, FormRelayResponse,
};
use folio_models::contact::ContactPayload;
use folio_utils::trace_instrument;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use url::Url;

use crate::http::HttpClient;

const DEFAULT_ENDPOINT: &str = "https://formspree.io/f/mnnejlpn";

#[derive(Debug, Clone)]
pub struct FormRelayApiServiceImpl {
    config: FormRelayApiServiceConfig,
    http: HttpClient,
}

#[derive(Debug, Clone)]
pub struct FormRelayApiServiceConfig {
    endpoint: Arc<Url>,
}

impl FormRelayApiServiceConfig {
    pub fn new(endpoint_override: Option<Url>) -> anyhow::Result<Self> {
        let endpoint = match endpoint_override {
            Some(endpoint) => endpoint,
            None => DEFAULT_ENDPOINT
                .parse()
                .context("Failed to parse default relay endpoint")?,
        };
        Ok(Self {
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl FormRelayApiServiceImpl {
    pub fn new(config: FormRelayApiServiceConfig) -> anyhow::Result<Self> {
        Ok(Self {
            config,
            http: HttpClient::new()?,
        })
    }
}

impl FormRelayApiService for FormRelayApiServiceImpl {
    #[trace_instrument(skip(self, payload), fields(endpoint = %self.config.endpoint))]
    async fn post(&self, payload: ContactPayload) -> anyhow::Result<FormRelayResponse> {
        let response = self
            .http
            .post((*self.config.endpoint).clone())
            .header(ACCEPT, "application/json")
            .json(&payload)
            .send()
            .await
            .context("Failed to send contact form request")?;

        let status = response.status();
        if status.is_success() {
            return Ok(FormRelayResponse::Accepted);
        }

        // the relay does not always answer with json, e.g. behind a proxy
        let body = response
            .json::<ErrorResponse>()
            .await
            .ok()
            .map(Into::into);

        Ok(FormRelayResponse::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<String>,
    #[serde(default)]
    errors: Vec<FieldErrorResponse>,
}

#[derive(Deserialize)]
struct FieldErrorResponse {
    field: Option<String>,
    message: String,
}

impl From<ErrorResponse> for FormRelayErrorBody {
    fn from(value: ErrorResponse) -> Self {
        Self {
            error: value.error,
            errors: value
                .errors
                .into_iter()
                .map(|err| FormRelayFieldError {
                    field: err.field,
                    message: err.message,
                })
                .collect(),
        }
    }
}
