use std::{fmt, sync::LazyLock};

use nutype::nutype;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub static CONTACT_EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^@\s]+@[^@\s]+\.[^@\s]+").unwrap());

/// The raw values of a contact form, exactly as entered by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactFormInput {
    pub name: String,
    pub email: String,
    pub message: String,
    pub company: String,
    pub project_type: String,
    pub budget: String,
    /// Hidden field that legitimate users never fill in.
    pub honeypot: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactFormField {
    Name,
    Email,
    Message,
    Company,
    ProjectType,
    Budget,
    Honeypot,
}

impl ContactFormField {
    pub const ALL: [Self; 7] = [
        Self::Name,
        Self::Email,
        Self::Message,
        Self::Company,
        Self::ProjectType,
        Self::Budget,
        Self::Honeypot,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: ContactName,
    pub email: ContactEmail,
    pub message: ContactMessageBody,
    pub company: Option<ContactCompany>,
    pub project_type: Option<String>,
    pub budget: Option<String>,
}

/// The JSON body sent to the form relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactPayload {
    pub name: ContactName,
    pub email: ContactEmail,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<ContactCompany>,
}

#[nutype(
    sanitize(trim),
    validate(len_char_min = 2),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactName(String);

#[nutype(
    sanitize(trim),
    validate(regex = CONTACT_EMAIL_REGEX),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactEmail(String);

#[nutype(
    sanitize(trim),
    validate(len_char_min = 24, len_char_max = 2000),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactMessageBody(String);

impl ContactMessageBody {
    pub const MIN_LEN: usize = 24;
    pub const MAX_LEN: usize = 2000;
}

#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(Debug, Clone, PartialEq, Eq, TryFrom, Deref, Serialize, Deserialize)
)]
pub struct ContactCompany(String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContactFieldError {
    #[error("Your name is required")]
    NameRequired,
    #[error("Name is too short")]
    NameTooShort,
    #[error("Email is required")]
    EmailRequired,
    #[error("Enter a valid email address")]
    EmailInvalid,
    #[error("A short project summary helps me respond quickly")]
    MessageRequired,
    #[error("Please include a few more details")]
    MessageTooShort,
    #[error("Message is too long (max {} characters)", ContactMessageBody::MAX_LEN)]
    MessageTooLong,
}

impl ContactFieldError {
    pub fn field(self) -> ContactFormField {
        match self {
            Self::NameRequired | Self::NameTooShort => ContactFormField::Name,
            Self::EmailRequired | Self::EmailInvalid => ContactFormField::Email,
            Self::MessageRequired | Self::MessageTooShort | Self::MessageTooLong => {
                ContactFormField::Message
            }
        }
    }
}

/// All field errors of a rejected form, in field order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactValidationError(pub Vec<ContactFieldError>);

impl std::error::Error for ContactValidationError {}

impl fmt::Display for ContactValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(". ")?;
            }
            fmt::Display::fmt(error, f)?;
        }
        Ok(())
    }
}

impl ContactFormInput {
    pub fn get(&self, field: ContactFormField) -> &str {
        match field {
            ContactFormField::Name => &self.name,
            ContactFormField::Email => &self.email,
            ContactFormField::Message => &self.message,
            ContactFormField::Company => &self.company,
            ContactFormField::ProjectType => &self.project_type,
            ContactFormField::Budget => &self.budget,
            ContactFormField::Honeypot => &self.honeypot,
        }
    }

    pub fn set(&mut self, field: ContactFormField, value: String) {
        let slot = match field {
            ContactFormField::Name => &mut self.name,
            ContactFormField::Email => &mut self.email,
            ContactFormField::Message => &mut self.message,
            ContactFormField::Company => &mut self.company,
            ContactFormField::ProjectType => &mut self.project_type,
            ContactFormField::Budget => &mut self.budget,
            ContactFormField::Honeypot => &mut self.honeypot,
        };
        *slot = value;
    }

    /// Whether the honeypot field has been filled in.
    pub fn is_spam(&self) -> bool {
        !self.honeypot.is_empty()
    }

    /// Checks a single field, for feedback while the user is still typing.
    pub fn validate_field(&self, field: ContactFormField) -> Option<ContactFieldError> {
        match field {
            ContactFormField::Name => self.parse_name().err(),
            ContactFormField::Email => self.parse_email().err(),
            ContactFormField::Message => self.parse_message().err(),
            ContactFormField::Company
            | ContactFormField::ProjectType
            | ContactFormField::Budget
            | ContactFormField::Honeypot => None,
        }
    }

    /// Validates and normalizes all fields.
    ///
    /// The honeypot is not considered here, see [`Self::is_spam`].
    pub fn validate(&self) -> Result<ContactSubmission, ContactValidationError> {
        let name = self.parse_name();
        let email = self.parse_email();
        let message = self.parse_message();

        match (name, email, message) {
            (Ok(name), Ok(email), Ok(message)) => Ok(ContactSubmission {
                name,
                email,
                message,
                company: ContactCompany::try_new(self.company.as_str()).ok(),
                project_type: non_empty(&self.project_type),
                budget: non_empty(&self.budget),
            }),
            (name, email, message) => Err(ContactValidationError(
                [name.err(), email.err(), message.err()]
                    .into_iter()
                    .flatten()
                    .collect(),
            )),
        }
    }

    fn parse_name(&self) -> Result<ContactName, ContactFieldError> {
        if self.name.trim().is_empty() {
            return Err(ContactFieldError::NameRequired);
        }
        ContactName::try_new(self.name.as_str()).map_err(|_| ContactFieldError::NameTooShort)
    }

    fn parse_email(&self) -> Result<ContactEmail, ContactFieldError> {
        if self.email.trim().is_empty() {
            return Err(ContactFieldError::EmailRequired);
        }
        ContactEmail::try_new(self.email.as_str()).map_err(|_| ContactFieldError::EmailInvalid)
    }

    fn parse_message(&self) -> Result<ContactMessageBody, ContactFieldError> {
        if self.message.trim().is_empty() {
            return Err(ContactFieldError::MessageRequired);
        }
        ContactMessageBody::try_new(self.message.as_str()).map_err(|err| match err {
            ContactMessageBodyError::LenCharMaxViolated => ContactFieldError::MessageTooLong,
            _ => ContactFieldError::MessageTooShort,
        })
    }
}

impl ContactSubmission {
    /// Builds the relay payload, folding project type and budget into the
    /// message body.
    pub fn into_payload(self) -> ContactPayload {
        let details = [("Project type", self.project_type), ("Budget", self.budget)]
            .into_iter()
            .filter_map(|(label, value)| value.map(|value| format!("{label}: {value}")))
            .collect::<Vec<_>>();

        let mut message = self.message.into_inner();
        if !details.is_empty() {
            message.push_str("\n\n");
            message.push_str(&details.join("\n"));
        }

        ContactPayload {
            name: self.name,
            email: self.email,
            message,
            company: self.company,
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.into())
}

#[cfg(test)]
mod tests {
    use folio_utils::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;

    fn make_input() -> ContactFormInput {
        ContactFormInput {
            name: "Jo Smith".into(),
            email: "jo@x.com".into(),
            message: "A".repeat(24),
            ..Default::default()
        }
    }

    #[test]
    fn message_length_bounds() {
        for (len, expected) in [
            (23, Some(ContactFieldError::MessageTooShort)),
            (24, None),
            (1000, None),
            (2000, None),
            (2001, Some(ContactFieldError::MessageTooLong)),
        ] {
            let input = ContactFormInput {
                message: "x".repeat(len),
                ..make_input()
            };
            assert_eq!(
                input.validate_field(ContactFormField::Message),
                expected,
                "len = {len}"
            );
            assert_eq!(input.validate().is_ok(), expected.is_none(), "len = {len}");
        }
    }

    #[test]
    fn message_body_limits() {
        let body = |len: usize| ContactMessageBody::try_new("x".repeat(len));

        assert_eq!(
            body(ContactMessageBody::MIN_LEN - 1),
            Err(ContactMessageBodyError::LenCharMinViolated)
        );
        assert!(body(ContactMessageBody::MIN_LEN).is_ok());
        assert!(body(ContactMessageBody::MAX_LEN).is_ok());
        assert_eq!(
            body(ContactMessageBody::MAX_LEN + 1),
            Err(ContactMessageBodyError::LenCharMaxViolated)
        );
    }

    #[test]
    fn message_is_trimmed_before_counting() {
        let input = ContactFormInput {
            message: format!("   {}\n\t", "x".repeat(23)),
            ..make_input()
        };
        assert_eq!(
            input.validate_field(ContactFormField::Message),
            Some(ContactFieldError::MessageTooShort)
        );

        let input = ContactFormInput {
            message: format!("  {}  ", "x".repeat(2000)),
            ..make_input()
        };
        let submission = input.validate().unwrap();
        assert_eq!(submission.message.chars().count(), 2000);
    }

    #[test]
    fn message_length_counts_chars_not_bytes() {
        let input = ContactFormInput {
            message: "ü".repeat(2000),
            ..make_input()
        };
        input.validate().unwrap();
    }

    #[test]
    fn too_long_message_is_distinct_from_required() {
        assert_ne!(
            ContactFieldError::MessageTooLong.to_string(),
            ContactFieldError::MessageRequired.to_string()
        );
        assert_eq!(
            ContactFieldError::MessageTooLong.to_string(),
            "Message is too long (max 2000 characters)"
        );
    }

    #[test]
    fn name_rules() {
        for (name, expected) in [
            ("", Some(ContactFieldError::NameRequired)),
            ("   ", Some(ContactFieldError::NameRequired)),
            (" J ", Some(ContactFieldError::NameTooShort)),
            ("Jo", None),
        ] {
            let input = ContactFormInput {
                name: name.into(),
                ..make_input()
            };
            assert_eq!(input.validate_field(ContactFormField::Name), expected);
        }
    }

    #[test]
    fn email_rules() {
        for (email, expected) in [
            ("", Some(ContactFieldError::EmailRequired)),
            ("jo", Some(ContactFieldError::EmailInvalid)),
            ("jo@x", Some(ContactFieldError::EmailInvalid)),
            ("jo@@x.com", Some(ContactFieldError::EmailInvalid)),
            ("jo@x.com", None),
            ("  jo.smith+tag@mail.example.org ", None),
        ] {
            let input = ContactFormInput {
                email: email.into(),
                ..make_input()
            };
            assert_eq!(
                input.validate_field(ContactFormField::Email),
                expected,
                "email = {email:?}"
            );
        }
    }

    #[test]
    fn collects_all_field_errors() {
        // Arrange
        let input = ContactFormInput {
            name: "J".into(),
            email: "nope".into(),
            message: String::new(),
            ..Default::default()
        };

        // Act
        let result = input.validate();

        // Assert
        let err = result.unwrap_err();
        assert_eq!(
            err.0,
            [
                ContactFieldError::NameTooShort,
                ContactFieldError::EmailInvalid,
                ContactFieldError::MessageRequired,
            ]
        );
        assert_eq!(
            err.to_string(),
            "Name is too short. Enter a valid email address. A short project summary helps me \
             respond quickly"
        );
    }

    #[test]
    fn honeypot_marks_spam() {
        assert!(!make_input().is_spam());
        let input = ContactFormInput {
            honeypot: "https://spam.example".into(),
            ..make_input()
        };
        assert!(input.is_spam());
    }

    #[test]
    fn empty_company_is_absent() {
        let input = ContactFormInput {
            company: "   ".into(),
            ..make_input()
        };
        assert_eq!(input.validate().unwrap().company, None);

        let input = ContactFormInput {
            company: " Acme ".into(),
            ..make_input()
        };
        assert_matches!(input.validate().unwrap().company, Some(c) if c.as_str() == "Acme");
    }

    #[test]
    fn payload_omits_absent_company() {
        // Arrange
        let input = ContactFormInput {
            company: String::new(),
            ..make_input()
        };

        // Act
        let payload = input.validate().unwrap().into_payload();

        // Assert
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            serde_json::json!({
                "name": "Jo Smith",
                "email": "jo@x.com",
                "message": "A".repeat(24),
            })
        );
    }

    #[test]
    fn payload_includes_company() {
        let input = ContactFormInput {
            company: "Acme".into(),
            ..make_input()
        };

        let payload = input.validate().unwrap().into_payload();

        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains(r#""company":"Acme""#), "{json}");
    }

    #[test]
    fn payload_folds_project_details_into_message() {
        let input = ContactFormInput {
            project_type: " Website ".into(),
            budget: "2-5k EUR".into(),
            ..make_input()
        };

        let payload = input.validate().unwrap().into_payload();

        assert_eq!(
            payload.message,
            format!(
                "{}\n\nProject type: Website\nBudget: 2-5k EUR",
                "A".repeat(24)
            )
        );
    }

    #[test]
    fn payload_never_contains_honeypot() {
        let input = ContactFormInput {
            honeypot: "bot".into(),
            ..make_input()
        };

        let payload = input.validate().unwrap().into_payload();

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json.as_object().unwrap().len(), 3);
    }
}
