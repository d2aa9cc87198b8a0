use std::future::Future;

use folio_models::contact::ContactPayload;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Delivers a contact payload to the form relay, retrying server and network
/// failures with a linear backoff.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ContactSubmitCommandService: Send + Sync + 'static {
    /// Resolves with [`ContactSubmitCommandError::Cancelled`] as soon as
    /// `cancel` fires, without starting further attempts.
    fn invoke(
        &self,
        payload: ContactPayload,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<(), ContactSubmitCommandError>> + Send;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactSubmitCommandError {
    /// The relay refused the submission (4xx). Never retried.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    /// All attempts failed with a server or network error.
    #[error(
        "Network error. Please check your connection and try again, or contact via email."
    )]
    Unavailable,
    #[error("Request cancelled")]
    Cancelled,
}

#[cfg(feature = "mock")]
impl MockContactSubmitCommandService {
    pub fn with_invoke(
        mut self,
        payload: ContactPayload,
        result: Result<(), ContactSubmitCommandError>,
    ) -> Self {
        self.expect_invoke()
            .once()
            .with(
                mockall::predicate::eq(payload),
                mockall::predicate::always(),
            )
            .return_once(|_, _| Box::pin(std::future::ready(result)));
        self
    }
}
