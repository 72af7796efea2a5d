use serde::Deserialize;

use crate::error::ValidationErrors;
use crate::models::InquiryStatus;

/// Inquirer-supplied fields for `POST /properties/:id/inquire`. Missing
/// fields deserialize as empty strings so they fall out of validation as
/// blank, keyed by field.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InquiryForm {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
}

impl InquiryForm {
    /// Validates every field and reports all failures at once.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.name.trim().is_empty() {
            errors.add("name", "This field may not be blank.");
        }
        if self.email.trim().is_empty() {
            errors.add("email", "This field may not be blank.");
        } else if !is_valid_email(self.email.trim()) {
            errors.add("email", "Enter a valid email address.");
        }
        if self.message.trim().is_empty() {
            errors.add("message", "This field may not be blank.");
        }
        // Phone is optional, but must look like a phone number when given.
        let phone = self.phone.trim();
        if !phone.is_empty() && !is_valid_phone(phone) {
            errors.add("phone", "Enter a valid phone number.");
        }

        errors.into_result()
    }
}

fn is_valid_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn is_valid_phone(value: &str) -> bool {
    value.len() <= 20
        && value
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '(' | ')' | ' '))
}

/// Filters accepted by `GET /inquiries`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InquiryListParams {
    pub property: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InquiryFilter {
    pub property: Option<i32>,
    pub status: Option<InquiryStatus>,
}

impl InquiryFilter {
    pub fn from_params(params: &InquiryListParams) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut filter = InquiryFilter::default();

        if let Some(raw) = &params.property {
            match raw.parse::<i32>() {
                Ok(id) => filter.property = Some(id),
                Err(_) => errors.add("property", "A valid integer is required."),
            }
        }
        if let Some(raw) = &params.status {
            match raw.parse::<InquiryStatus>() {
                Ok(status) => filter.status = Some(status),
                Err(()) => errors.add("status", format!("\"{}\" is not a valid choice.", raw)),
            }
        }

        errors.into_result()?;
        Ok(filter)
    }
}
