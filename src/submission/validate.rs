//! Contact form validation
//!
//! Turns an untyped JSON body into a normalized [`ContactForm`] or a map of
//! field errors. Every field is checked; within one field only the first failing
//! rule is reported.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub const NAME_LEN: (usize, usize) = (2, 80);
pub const EMAIL_MAX_LEN: usize = 254;
pub const COMPANY_MAX_LEN: usize = 120;
pub const PHONE_LEN: (usize, usize) = (7, 20);
pub const MESSAGE_LEN: (usize, usize) = (20, 1500);

/// Field name -> message, ordered by field name
pub type FieldErrors = BTreeMap<String, String>;

/// Normalized contact form: trimmed text, consent coerced to a boolean
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub company: String,
    pub phone: String,
    pub message: String,
    pub consent: bool,
}

impl ContactForm {
    /// Read the raw fields without checking them
    pub fn normalize(raw: &Value) -> Self {
        Self {
            name: text_field(raw, "name"),
            email: text_field(raw, "email"),
            company: text_field(raw, "company"),
            phone: text_field(raw, "phone"),
            message: text_field(raw, "message"),
            consent: raw.get("consent").is_some_and(truthy),
        }
    }

    /// Collect all field errors for this form
    pub fn errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        let checks = [
            ("name", check_name(&self.name)),
            ("email", check_email(&self.email)),
            ("company", check_company(&self.company)),
            ("phone", check_phone(&self.phone)),
            ("message", check_message(&self.message)),
            ("consent", check_consent(self.consent)),
        ];
        for (field, result) in checks {
            if let Err(message) = result {
                errors.insert(field.to_string(), message.to_string());
            }
        }
        errors
    }
}

/// Validate a raw submission body
pub fn validate(raw: &Value) -> Result<ContactForm, FieldErrors> {
    let form = ContactForm::normalize(raw);
    let errors = form.errors();
    if errors.is_empty() {
        Ok(form)
    } else {
        Err(errors)
    }
}

fn check_name(name: &str) -> Result<(), &'static str> {
    if name.is_empty() {
        return Err("Full name is required.");
    }
    if !within(name, NAME_LEN) {
        return Err("Name must be between 2 and 80 characters.");
    }
    Ok(())
}

fn check_email(email: &str) -> Result<(), &'static str> {
    if email.is_empty() {
        return Err("Work email is required.");
    }
    if char_len(email) > EMAIL_MAX_LEN || !is_email_shaped(email) {
        return Err("Enter a valid work email address.");
    }
    Ok(())
}

fn check_company(company: &str) -> Result<(), &'static str> {
    if char_len(company) > COMPANY_MAX_LEN {
        return Err("Company must be 120 characters or fewer.");
    }
    Ok(())
}

fn check_phone(phone: &str) -> Result<(), &'static str> {
    if phone.is_empty() {
        return Ok(());
    }
    let body = phone.strip_prefix('+').unwrap_or(phone);
    if !within(phone, PHONE_LEN) || char_len(body) < PHONE_LEN.0 || !is_phone_shaped(phone) {
        return Err("Enter a valid phone number (7-20 digits/symbols).");
    }
    Ok(())
}

fn check_message(message: &str) -> Result<(), &'static str> {
    if message.is_empty() {
        return Err("Project details are required.");
    }
    if !within(message, MESSAGE_LEN) {
        return Err("Project details must be between 20 and 1500 characters.");
    }
    Ok(())
}

const fn check_consent(consent: bool) -> Result<(), &'static str> {
    if consent {
        Ok(())
    } else {
        Err("Consent is required to submit this form.")
    }
}

/// `local@domain.tld`: one `@`, no whitespace, a dot inside the domain part
pub fn is_email_shaped(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Optional leading `+`, then digits, dashes, parentheses and spaces only
pub fn is_phone_shaped(phone: &str) -> bool {
    let body = phone.strip_prefix('+').unwrap_or(phone);
    !body.is_empty()
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '-' | '(' | ')' | ' '))
}

/// JavaScript truthiness for JSON values
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn text_field(raw: &Value, field: &str) -> String {
    raw.get(field)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn within(s: &str, (min, max): (usize, usize)) -> bool {
    (min..=max).contains(&char_len(s))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn valid_body() -> Value {
        json!({
            "name": "Al",
            "email": "al@example.com",
            "company": "",
            "phone": "",
            "message": "x".repeat(20),
            "consent": true
        })
    }

    fn errors_for(body: &Value) -> FieldErrors {
        validate(body).expect_err("expected validation failure")
    }

    #[test]
    fn test_valid_minimal_body() {
        let form = validate(&valid_body()).unwrap();
        assert_eq!(form.name, "Al");
        assert_eq!(form.email, "al@example.com");
        assert!(form.consent);
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        let mut body = valid_body();
        body["name"] = json!("   Ada Lovelace  ");
        body["company"] = json!("  Analytical Engines ");
        let form = validate(&body).unwrap();
        assert_eq!(form.name, "Ada Lovelace");
        assert_eq!(form.company, "Analytical Engines");
    }

    #[test]
    fn test_empty_required_fields_reported() {
        let errors = errors_for(&json!({ "consent": true }));
        assert_eq!(errors["name"], "Full name is required.");
        assert_eq!(errors["email"], "Work email is required.");
        assert_eq!(errors["message"], "Project details are required.");
        assert!(!errors.contains_key("company"));
        assert!(!errors.contains_key("phone"));
        assert!(!errors.contains_key("consent"));
    }

    #[test]
    fn test_whitespace_only_counts_as_empty() {
        let mut body = valid_body();
        body["name"] = json!("    ");
        assert_eq!(errors_for(&body)["name"], "Full name is required.");
    }

    #[test]
    fn test_all_errors_collected() {
        let errors = errors_for(&json!({
            "name": "A",
            "email": "not-an-email",
            "company": "c".repeat(121),
            "phone": "12",
            "message": "short",
            "consent": false
        }));
        assert_eq!(errors.len(), 6);
        assert_eq!(errors["name"], "Name must be between 2 and 80 characters.");
        assert_eq!(errors["email"], "Enter a valid work email address.");
    }

    #[test]
    fn test_message_bounds() {
        for (len, ok) in [(19, false), (20, true), (1500, true), (1501, false)] {
            let mut body = valid_body();
            body["message"] = json!("m".repeat(len));
            let result = validate(&body);
            assert_eq!(result.is_ok(), ok, "message length {len}");
            if let Err(errors) = result {
                assert_eq!(errors.len(), 1);
                assert!(errors.contains_key("message"));
            }
        }
    }

    #[test]
    fn test_name_bounds() {
        let mut body = valid_body();
        body["name"] = json!("n".repeat(80));
        assert!(validate(&body).is_ok());
        body["name"] = json!("n".repeat(81));
        assert!(errors_for(&body).contains_key("name"));
    }

    #[test]
    fn test_lengths_count_characters_not_bytes() {
        let mut body = valid_body();
        body["message"] = json!("é".repeat(20));
        assert!(validate(&body).is_ok());
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_email_shaped("a@b.com"));
        assert!(is_email_shaped("first.last@sub.example.co"));
        assert!(!is_email_shaped("not-an-email"));
        assert!(!is_email_shaped("a@bcom"));
        assert!(!is_email_shaped("a@b."));
        assert!(!is_email_shaped("a@.com"));
        assert!(!is_email_shaped("@b.com"));
        assert!(!is_email_shaped("a b@c.com"));
        assert!(!is_email_shaped("a@b@c.com"));
    }

    #[test]
    fn test_email_too_long() {
        let mut body = valid_body();
        body["email"] = json!(format!("{}@example.com", "a".repeat(250)));
        assert_eq!(errors_for(&body)["email"], "Enter a valid work email address.");
    }

    #[test]
    fn test_phone_rules() {
        let mut body = valid_body();
        for good in ["+1 (555) 123-4567", "+1234567", "5551234", "020 7946 0958"] {
            body["phone"] = json!(good);
            assert!(validate(&body).is_ok(), "{good} should pass");
        }
        for bad in [
            "555-12",
            "+123456",
            "555 123 4567 ext 9",
            "++15551234567",
            "1".repeat(21).as_str(),
        ] {
            body["phone"] = json!(bad);
            assert!(errors_for(&body).contains_key("phone"), "{bad} should fail");
        }
    }

    #[test]
    fn test_consent_truthiness() {
        let mut body = valid_body();
        for falsy in [json!(false), json!(null), json!(0), json!("")] {
            body["consent"] = falsy;
            assert_eq!(
                errors_for(&body)["consent"],
                "Consent is required to submit this form."
            );
        }
        body.as_object_mut().unwrap().remove("consent");
        assert!(errors_for(&body).contains_key("consent"));

        for truthy_value in [json!(true), json!("on"), json!(1)] {
            body["consent"] = truthy_value;
            assert!(validate(&body).is_ok());
        }
    }

    #[test]
    fn test_non_string_fields_treated_as_empty() {
        let mut body = valid_body();
        body["name"] = json!(42);
        assert_eq!(errors_for(&body)["name"], "Full name is required.");
    }

    #[test]
    fn test_non_object_body_rejects_everything_required() {
        let errors = errors_for(&json!([1, 2, 3]));
        for field in ["name", "email", "message", "consent"] {
            assert!(errors.contains_key(field));
        }
    }
}
