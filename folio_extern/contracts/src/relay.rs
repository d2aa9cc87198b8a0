use std::future::Future;

use folio_models::contact::ContactPayload;

/// Client for the third-party form relay that forwards contact messages by
/// email.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait FormRelayApiService: Send + Sync + 'static {
    /// Posts the payload to the relay once. `Err` means the request did not
    /// produce an HTTP response at all.
    fn post(
        &self,
        payload: ContactPayload,
    ) -> impl Future<Output = anyhow::Result<FormRelayResponse>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormRelayResponse {
    /// The relay answered with a 2xx status.
    Accepted,
    /// The relay answered with any other status. `body` is present if the
    /// response contained a parseable error document.
    Rejected {
        status: u16,
        body: Option<FormRelayErrorBody>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormRelayErrorBody {
    pub error: Option<String>,
    pub errors: Vec<FormRelayFieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRelayFieldError {
    pub field: Option<String>,
    pub message: String,
}

impl FormRelayResponse {
    pub fn rejected(status: u16) -> Self {
        Self::Rejected { status, body: None }
    }
}

#[cfg(feature = "mock")]
impl MockFormRelayApiService {
    pub fn with_post(mut self, payload: ContactPayload, result: FormRelayResponse) -> Self {
        self.expect_post()
            .once()
            .with(mockall::predicate::eq(payload))
            .return_once(|_| Box::pin(std::future::ready(Ok(result))));
        self
    }

    /// Expects one call per entry of `results`, answered in order. `None`
    /// simulates a network failure.
    pub fn with_post_sequence(
        mut self,
        payload: ContactPayload,
        results: impl IntoIterator<Item = Option<FormRelayResponse>>,
    ) -> Self {
        let mut seq = mockall::Sequence::new();
        for result in results {
            self.expect_post()
                .once()
                .in_sequence(&mut seq)
                .with(mockall::predicate::eq(payload.clone()))
                .return_once(|_| {
                    Box::pin(std::future::ready(
                        result.ok_or_else(|| anyhow::anyhow!("connection refused")),
                    ))
                });
        }
        self
    }
}
