//! Form checks that run before anything is sent to the backend.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::ClientError;
use crate::models::{NewTicket, Role};

const PASSWORD_SPECIALS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";
const MIN_PASSWORD_LEN: usize = 8;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex is valid")
    })
}

pub fn validate_email(email: &str) -> Result<(), ClientError> {
    if email_regex().is_match(email) {
        Ok(())
    } else {
        Err(ClientError::Validation(
            "Please enter a valid email address.".to_string(),
        ))
    }
}

pub fn validate_password(password: &str) -> Result<(), ClientError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LEN;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| PASSWORD_SPECIALS.contains(c));

    if long_enough && has_upper && has_digit && has_special {
        Ok(())
    } else {
        Err(ClientError::Validation(
            "Password must be at least 8 characters long and include uppercase, number, and special char."
                .to_string(),
        ))
    }
}

pub fn validate_login(email: &str, password: &str) -> Result<(), ClientError> {
    validate_email(email)?;
    validate_password(password)
}

pub fn validate_signup(name: &str, email: &str, password: &str, role: Role) -> Result<(), ClientError> {
    if name.trim().is_empty() {
        let label = match role {
            Role::Admin => "Admin Name",
            Role::User => "User Name",
        };
        return Err(ClientError::Validation(format!("{} is required.", label)));
    }
    validate_login(email, password)
}

pub fn validate_new_ticket(ticket: &NewTicket) -> Result<(), ClientError> {
    if ticket.subject.trim().is_empty() {
        return Err(ClientError::Validation("Subject is required.".to_string()));
    }
    if ticket.description.trim().is_empty() {
        return Err(ClientError::Validation("Description is required.".to_string()));
    }
    Ok(())
}
