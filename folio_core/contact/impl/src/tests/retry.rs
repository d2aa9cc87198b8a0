//! Runs the form against the real submit command with a mocked relay.

use std::sync::{Arc, Mutex};

use folio_core_contact_contracts::{ContactFormService, ContactFormState, SubmissionResult};
use folio_extern_contracts::relay::{FormRelayResponse, MockFormRelayApiService};
use folio_shared_contracts::time::MockTimeService;
use pretty_assertions::assert_eq;
use tokio::time::{Duration, Instant};

use super::{fill, t0, valid_input, valid_payload};
use crate::{
    commands::submit::ContactSubmitCommandServiceImpl, ContactFormServiceConfig,
    ContactFormServiceImpl,
};

#[tokio::test(start_paused = true)]
async fn server_errors_then_success() {
    // Arrange
    let time = MockTimeService::new().with_now_sequence([t0(), t0()]);

    let calls = Arc::new(Mutex::new(Vec::new()));
    let mut responses = [
        FormRelayResponse::rejected(500),
        FormRelayResponse::rejected(500),
        FormRelayResponse::Accepted,
    ]
    .into_iter();
    let mut form_relay = MockFormRelayApiService::new();
    form_relay
        .expect_post()
        .times(3)
        .with(mockall::predicate::eq(valid_payload()))
        .returning({
            let calls = Arc::clone(&calls);
            move |_| {
                calls.lock().unwrap().push(Instant::now());
                let response = responses.next().unwrap();
                Box::pin(std::future::ready(Ok(response)))
            }
        });

    let sut = ContactFormServiceImpl::new(
        time,
        ContactSubmitCommandServiceImpl::new(form_relay, Default::default()),
        ContactFormServiceConfig::default(),
    );
    fill(&sut, valid_input());

    // Act
    let result = sut.submit().await;

    // Assert
    assert_eq!(result, SubmissionResult::Success);
    assert_eq!(sut.state(), ContactFormState::Success);
    let calls = calls.lock().unwrap();
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[1] - calls[0], Duration::from_secs(1));
    assert_eq!(calls[2] - calls[1], Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn client_error_fails_after_single_call() {
    // Arrange
    let time = MockTimeService::new().with_now(t0());
    let form_relay =
        MockFormRelayApiService::new().with_post(valid_payload(), FormRelayResponse::rejected(400));

    let sut = ContactFormServiceImpl::new(
        time,
        ContactSubmitCommandServiceImpl::new(form_relay, Default::default()),
        ContactFormServiceConfig::default(),
    );
    fill(&sut, valid_input());
    let start = Instant::now();

    // Act
    let result = sut.submit().await;

    // Assert
    let message = "Invalid form data. Please check your input.".to_owned();
    assert_eq!(result, SubmissionResult::FatalError(message.clone()));
    assert_eq!(sut.state().error_message(), Some(message.as_str()));
    assert_eq!(start.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries() {
    // Arrange
    let time = MockTimeService::new().with_now(t0());
    let form_relay = MockFormRelayApiService::new().with_post_sequence(
        valid_payload(),
        [None, None, Some(FormRelayResponse::rejected(500))],
    );

    let sut = ContactFormServiceImpl::new(
        time,
        ContactSubmitCommandServiceImpl::new(form_relay, Default::default()),
        ContactFormServiceConfig::default(),
    );
    fill(&sut, valid_input());

    // Act
    let result = sut.submit().await;

    // Assert
    assert_eq!(
        result,
        SubmissionResult::FatalError(
            "Network error. Please check your connection and try again, or contact via email."
                .into()
        )
    );
    assert_eq!(sut.draft(), valid_input());
}
