use chrono::{DateTime, TimeZone, Utc};
use folio_core_contact_contracts::{
    commands::submit::MockContactSubmitCommandService, ContactFormService, ContactFormState,
};
use folio_models::contact::{ContactFormField, ContactFormInput, ContactPayload};
use folio_shared_contracts::time::MockTimeService;

use crate::{ContactFormServiceConfig, ContactFormServiceImpl};

mod retry;

type Sut = ContactFormServiceImpl<MockTimeService, MockContactSubmitCommandService>;

fn make_sut(time: MockTimeService, contact_submit: MockContactSubmitCommandService) -> Sut {
    ContactFormServiceImpl::new(time, contact_submit, ContactFormServiceConfig::default())
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn valid_input() -> ContactFormInput {
    ContactFormInput {
        name: "Jo Smith".into(),
        email: "jo@x.com".into(),
        message: "I need a website for my small bakery.".into(),
        company: "Acme".into(),
        ..Default::default()
    }
}

fn valid_payload() -> ContactPayload {
    valid_input().validate().unwrap().into_payload()
}

fn fill(sut: &impl ContactFormService, input: ContactFormInput) {
    for field in ContactFormField::ALL {
        sut.edit(field, input.get(field).into());
    }
}

async fn wait_for_state(sut: &impl ContactFormService, state: ContactFormState) {
    while sut.state() != state {
        tokio::task::yield_now().await;
    }
}
