use anyhow::bail;
use clap::Args;
use folio_config::Config;
use folio_core_contact_contracts::{ContactFormService, SubmissionResult};
use folio_models::contact::{ContactFormField, ContactFormInput};
use tracing::{info, warn};

use crate::environment;

#[derive(Debug, Args)]
pub struct SubmitCommand {
    /// Your name
    #[arg(long)]
    name: String,
    /// Address the reply should go to
    #[arg(long)]
    email: String,
    /// What you need built, your timeline and budget range
    #[arg(long)]
    message: String,
    #[arg(long, default_value = "")]
    company: String,
    #[arg(long, default_value = "")]
    project_type: String,
    #[arg(long, default_value = "")]
    budget: String,
    #[arg(long, default_value = "", hide = true)]
    honeypot: String,
}

impl SubmitCommand {
    pub async fn invoke(self, config: Config) -> anyhow::Result<()> {
        let form = environment::contact_form(&config)?;
        let input = ContactFormInput {
            name: self.name,
            email: self.email,
            message: self.message,
            company: self.company,
            project_type: self.project_type,
            budget: self.budget,
            honeypot: self.honeypot,
        };

        let result = tokio::select! {
            result = run(&form, input) => result,
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, cancelling submission");
                form.teardown();
                SubmissionResult::Cancelled
            }
        };

        report(result, config.contact.fallback_email.as_deref())
    }
}

/// Fills the form with `input` and submits it.
pub async fn run(form: &impl ContactFormService, input: ContactFormInput) -> SubmissionResult {
    for field in ContactFormField::ALL {
        form.edit(field, input.get(field).into());
    }
    form.submit().await
}

fn report(result: SubmissionResult, fallback_email: Option<&str>) -> anyhow::Result<()> {
    match result {
        SubmissionResult::Success => {
            info!("Message sent");
            println!("Message sent! Thanks for reaching out, expect a reply within 24 hours.");
            Ok(())
        }
        SubmissionResult::RecoverableError(message) => bail!(message),
        SubmissionResult::FatalError(message) => match fallback_email {
            Some(email) => bail!("{message} You can also write to {email}."),
            None => bail!(message),
        },
        SubmissionResult::Cancelled => bail!("Submission cancelled"),
    }
}
