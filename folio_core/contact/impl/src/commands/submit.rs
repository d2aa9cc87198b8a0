use std::time::Duration;

use folio_core_contact_contracts::commands::submit::{
    ContactSubmitCommandError, ContactSubmitCommandService,
};
use folio_extern_contracts::relay::{FormRelayApiService, FormRelayErrorBody, FormRelayResponse};
use folio_models::contact::ContactPayload;
use folio_utils::trace_instrument;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct ContactSubmitCommandServiceImpl<FormRelay> {
    form_relay: FormRelay,
    config: ContactSubmitCommandServiceConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct ContactSubmitCommandServiceConfig {
    /// Number of attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry, the n-th retry waits `n * base_delay`.
    pub base_delay: Duration,
}

impl Default for ContactSubmitCommandServiceConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
        }
    }
}

impl<FormRelay> ContactSubmitCommandServiceImpl<FormRelay> {
    pub fn new(form_relay: FormRelay, config: ContactSubmitCommandServiceConfig) -> Self {
        Self { form_relay, config }
    }
}

impl<FormRelay> ContactSubmitCommandService for ContactSubmitCommandServiceImpl<FormRelay>
where
    FormRelay: FormRelayApiService,
{
    #[trace_instrument(skip(self, cancel))]
    async fn invoke(
        &self,
        payload: ContactPayload,
        cancel: CancellationToken,
    ) -> Result<(), ContactSubmitCommandError> {
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = retry_delay(self.config.base_delay, attempt);
                debug!(attempt, ?delay, "waiting before retry");
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ContactSubmitCommandError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            if cancel.is_cancelled() {
                return Err(ContactSubmitCommandError::Cancelled);
            }

            let response = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(ContactSubmitCommandError::Cancelled),
                response = self.form_relay.post(payload.clone()) => response,
            };

            match response {
                Ok(FormRelayResponse::Accepted) => {
                    info!(attempt, "contact message delivered to form relay");
                    return Ok(());
                }
                Ok(FormRelayResponse::Rejected { status, body }) if is_client_error(status) => {
                    let message = rejection_message(status, body.as_ref());
                    warn!(status, reason = %message, "form relay rejected contact message");
                    return Err(ContactSubmitCommandError::Rejected { status, message });
                }
                Ok(FormRelayResponse::Rejected { status, .. }) => {
                    warn!(attempt, status, "form relay failed to accept contact message");
                }
                Err(err) => {
                    warn!(attempt, "failed to reach form relay: {err:#}");
                }
            }
        }

        Err(ContactSubmitCommandError::Unavailable)
    }
}

/// Delay before the given retry, saturating instead of overflowing.
fn retry_delay(base_delay: Duration, attempt: u32) -> Duration {
    base_delay.checked_mul(attempt).unwrap_or(Duration::MAX)
}

fn is_client_error(status: u16) -> bool {
    (400..500).contains(&status)
}

/// Builds the message shown to the user for a 4xx answer of the relay.
pub fn rejection_message(status: u16, body: Option<&FormRelayErrorBody>) -> String {
    let error = || body.and_then(|body| body.error.clone());

    match status {
        400 => body
            .filter(|body| !body.errors.is_empty())
            .map(|body| {
                body.errors
                    .iter()
                    .map(|err| err.message.as_str())
                    .collect::<Vec<_>>()
                    .join(". ")
            })
            .or_else(error)
            .unwrap_or_else(|| "Invalid form data. Please check your input.".into()),
        403 => "Form submission blocked. Please contact support.".into(),
        404 => "Contact form not configured. Please use email directly.".into(),
        429 => "Too many requests. Please try again in a few minutes.".into(),
        _ => error().unwrap_or_else(|| {
            format!("Request failed ({status}). Please try again or use email.")
        }),
    }
}
