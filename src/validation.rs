//! Request Validator
//!
//! Schema checks for the path id and the update body. Every check runs before the
//! policy or the store sees the request, and failures carry per-field detail so the
//! client can tell which input was rejected.

use serde_json::{Map, Value};

use crate::models::{FieldError, Role, UpdateUserRequest, UserId};

const NAME_MIN: usize = 2;
const MAX_LEN: usize = 255;

/// ValidationErrors
///
/// An ordered list of `(field, message)` problems. Never empty when returned as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.push(field, message);
        errors
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|e| (e.field.as_str(), e.message.as_str()))
    }

    pub fn into_details(self) -> Vec<FieldError> {
        self.0
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join(", ");
        f.write_str(&joined)
    }
}

/// parse_user_id
///
/// Accepts only a non-empty run of ASCII digits that fits a positive `i32`.
/// Signs, whitespace and hex are all rejected.
pub fn parse_user_id(raw: &str) -> Result<UserId, ValidationErrors> {
    let invalid = || ValidationErrors::single("id", "Invalid user ID format");

    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }

    match raw.parse::<UserId>() {
        Ok(id) if id > 0 => Ok(id),
        Ok(_) => Err(ValidationErrors::single("id", "User ID must be positive")),
        Err(_) => Err(invalid()),
    }
}

/// parse_update
///
/// Validates a JSON update body. Unknown keys are dropped; known keys are
/// normalized (names trimmed, emails trimmed and lowercased). All field problems are
/// collected before returning, so one response lists every rejected field.
pub fn parse_update(body: &Value) -> Result<UpdateUserRequest, ValidationErrors> {
    let Some(object) = body.as_object() else {
        return Err(ValidationErrors::single("body", "Expected a JSON object"));
    };

    let mut errors = ValidationErrors::default();
    let name = parse_name(object, &mut errors);
    let email = parse_email(object, &mut errors);
    let role = parse_role(object, &mut errors);

    if !errors.is_empty() {
        return Err(errors);
    }

    let request = UpdateUserRequest { name, email, role };
    if request.name.is_none() && request.email.is_none() && request.role.is_none() {
        return Err(ValidationErrors::single(
            "body",
            "At least one field must be provided for update",
        ));
    }

    Ok(request)
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &str,
    errors: &mut ValidationErrors,
) -> Option<&'a str> {
    match object.get(field) {
        None => None,
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => {
            errors.push(field, format!("{field} must be a string"));
            None
        }
    }
}

fn parse_name(object: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<String> {
    let name = string_field(object, "name", errors)?.trim();
    let len = name.chars().count();

    if len < NAME_MIN {
        errors.push("name", format!("Name must be at least {NAME_MIN} characters"));
        return None;
    }
    if len > MAX_LEN {
        errors.push("name", format!("Name must be at most {MAX_LEN} characters"));
        return None;
    }
    Some(name.to_string())
}

fn parse_email(object: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<String> {
    let email = string_field(object, "email", errors)?.trim().to_lowercase();

    if email.chars().count() > MAX_LEN {
        errors.push("email", format!("Email must be at most {MAX_LEN} characters"));
        return None;
    }
    if !looks_like_email(&email) {
        errors.push("email", "Invalid email address");
        return None;
    }
    Some(email)
}

fn parse_role(object: &Map<String, Value>, errors: &mut ValidationErrors) -> Option<Role> {
    let raw = string_field(object, "role", errors)?;
    match raw.parse::<Role>() {
        Ok(role) => Some(role),
        Err(_) => {
            errors.push("role", "Role must be one of: user, admin");
            None
        }
    }
}

// local@domain.tld with no whitespace and exactly one '@'.
fn looks_like_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !host.starts_with('.') && tld.len() >= 2,
        None => false,
    }
}
