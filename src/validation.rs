//! Field-level validation of customer and recipient input.
//!
//! Validators never stop at the first problem: they return every violation
//! found, so a client can fix a whole form in one round trip. Callers run
//! them before touching any stored state.

use serde::{Deserialize, Serialize};

use crate::models::{customer::CustomerProfile, recipient::NewRecipient};

const NAME_MIN: usize = 3;
const NAME_MAX: usize = 64;
const PHONE_MIN: usize = 9;
const PHONE_MAX: usize = 16;

/// One problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub fn validate_profile(profile: &CustomerProfile) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    check_name(&mut violations, "first_name", "first name", &profile.first_name);
    check_name(&mut violations, "last_name", "last name", &profile.last_name);
    check_contact(&mut violations, profile.email.as_deref(), profile.phone.as_deref());

    violations
}

pub fn validate_recipient(recipient: &NewRecipient) -> Vec<FieldViolation> {
    let mut violations = Vec::new();

    check_name(&mut violations, "name", "name", &recipient.name);

    if recipient.account_number.trim().is_empty() {
        violations.push(FieldViolation::new(
            "account_number",
            "account number is mandatory",
        ));
    } else if !recipient.account_number.chars().all(|c| c.is_ascii_digit()) {
        violations.push(FieldViolation::new(
            "account_number",
            "account number must contain only digits",
        ));
    }

    check_contact(
        &mut violations,
        recipient.email.as_deref(),
        recipient.phone.as_deref(),
    );

    violations
}

fn check_name(violations: &mut Vec<FieldViolation>, field: &str, label: &str, value: &str) {
    if value.trim().is_empty() {
        violations.push(FieldViolation::new(field, format!("{label} is mandatory")));
        return;
    }

    let len = value.chars().count();
    if !(NAME_MIN..=NAME_MAX).contains(&len) {
        violations.push(FieldViolation::new(
            field,
            format!("{label} must be between {NAME_MIN} and {NAME_MAX} characters"),
        ));
    }
}

fn check_contact(violations: &mut Vec<FieldViolation>, email: Option<&str>, phone: Option<&str>) {
    // A blank email counts as not given.
    if let Some(email) = email.filter(|e| !e.trim().is_empty()) {
        if !is_email(email) {
            violations.push(FieldViolation::new("email", "email is not well formed"));
        }
    }

    if let Some(phone) = phone {
        let digits = phone.strip_prefix('+').unwrap_or(phone);
        if !digits.chars().all(|c| c.is_ascii_digit()) {
            violations.push(FieldViolation::new("phone", "phone has invalid characters"));
        }

        let len = phone.chars().count();
        if !(PHONE_MIN..=PHONE_MAX).contains(&len) {
            violations.push(FieldViolation::new(
                "phone",
                format!("phone must be between {PHONE_MIN} and {PHONE_MAX} characters"),
            ));
        }
    }
}

/// `local@domain.tld`, no whitespace, exactly one `@`.
fn is_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };

    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}
