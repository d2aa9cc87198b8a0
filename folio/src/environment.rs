use folio_config::Config;
use folio_core_contact_impl::{
    commands::submit::{ContactSubmitCommandServiceConfig, ContactSubmitCommandServiceImpl},
    ContactFormServiceConfig, ContactFormServiceImpl,
};
use folio_extern_impl::relay::{FormRelayApiServiceConfig, FormRelayApiServiceImpl};
use folio_shared_impl::time::TimeServiceImpl;

pub type ContactSubmit = ContactSubmitCommandServiceImpl<FormRelayApiServiceImpl>;

pub type ContactForm = ContactFormServiceImpl<TimeServiceImpl, ContactSubmit>;

/// Builds a fresh contact form instance from the config.
pub fn contact_form(config: &Config) -> anyhow::Result<ContactForm> {
    let form_relay = FormRelayApiServiceImpl::new(FormRelayApiServiceConfig::new(Some(
        config.contact.endpoint.clone(),
    ))?)?;

    let contact_submit = ContactSubmitCommandServiceImpl::new(
        form_relay,
        ContactSubmitCommandServiceConfig {
            max_retries: config.contact.retry.max_retries,
            base_delay: config.contact.retry.base_delay.into(),
        },
    );

    Ok(ContactFormServiceImpl::new(
        TimeServiceImpl,
        contact_submit,
        ContactFormServiceConfig {
            cooldown: config.contact.cooldown.into(),
        },
    ))
}
