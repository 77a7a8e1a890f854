//! QR content types
//!
//! Each content type carries the raw string the user typed and knows how to
//! validate it and turn it into the payload that gets encoded in the matrix.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a valid URL")]
    InvalidUrl,
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Please enter a valid phone number")]
    InvalidPhone,
    #[error("Short code cannot be empty")]
    EmptyShortCode,
    #[error("Only letters, numbers, and hyphens are allowed")]
    InvalidShortCode,
    #[error("Invalid color '{0}'")]
    InvalidColor(String),
    #[error("{0} is required")]
    Required(&'static str),
    #[error("Invalid pagination cursor")]
    InvalidCursor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Url,
    Email,
    Phone,
    Sms,
}

impl ContentKind {
    /// Turn a raw user string into the encoded payload for this type.
    pub fn format(&self, raw: &str) -> String {
        match self {
            ContentKind::Url => {
                if raw.starts_with("http") {
                    raw.to_string()
                } else {
                    format!("https://{raw}")
                }
            }
            ContentKind::Email => format!("mailto:{raw}"),
            ContentKind::Phone => format!("tel:{}", strip_dial_separators(raw)),
            ContentKind::Sms => format!("smsto:{}", strip_dial_separators(raw)),
        }
    }

    /// Validate the raw (pre-format) value.
    pub fn validate(&self, raw: &str) -> Result<(), ValidationError> {
        match self {
            ContentKind::Url => {
                Url::parse(&ContentKind::Url.format(raw)).map_err(|_| ValidationError::InvalidUrl)?;
                Ok(())
            }
            ContentKind::Email => {
                if is_email(raw) {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidEmail)
                }
            }
            ContentKind::Phone | ContentKind::Sms => {
                if is_phone(raw) {
                    Ok(())
                } else {
                    Err(ValidationError::InvalidPhone)
                }
            }
        }
    }
}

/// Tagged content payload: the variant decides formatting and validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum QrContent {
    Url(String),
    Email(String),
    Phone(String),
    Sms(String),
}

impl QrContent {
    pub fn new(kind: ContentKind, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match kind {
            ContentKind::Url => QrContent::Url(raw),
            ContentKind::Email => QrContent::Email(raw),
            ContentKind::Phone => QrContent::Phone(raw),
            ContentKind::Sms => QrContent::Sms(raw),
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            QrContent::Url(_) => ContentKind::Url,
            QrContent::Email(_) => ContentKind::Email,
            QrContent::Phone(_) => ContentKind::Phone,
            QrContent::Sms(_) => ContentKind::Sms,
        }
    }

    pub fn raw(&self) -> &str {
        match self {
            QrContent::Url(v) | QrContent::Email(v) | QrContent::Phone(v) | QrContent::Sms(v) => v,
        }
    }

    pub fn encoded_payload(&self) -> String {
        self.kind().format(self.raw())
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.kind().validate(self.raw())
    }

    /// Human-friendly default name: the raw value without scheme or type
    /// prefixes, cut at the first path separator.
    pub fn default_name(&self) -> String {
        let mut value = self.raw().trim();
        for prefix in ["https://", "http://"] {
            if let Some(rest) = value.strip_prefix(prefix) {
                value = rest;
                break;
            }
        }
        value = value.strip_prefix("www.").unwrap_or(value);
        for prefix in ["mailto:", "tel:", "smsto:"] {
            if let Some(rest) = value.strip_prefix(prefix) {
                value = rest;
                break;
            }
        }
        value.split('/').next().unwrap_or_default().to_string()
    }
}

impl Default for QrContent {
    fn default() -> Self {
        QrContent::Url("https://example.com".to_string())
    }
}

/// Short codes are letters, digits and hyphens only.
pub fn validate_short_code(code: &str) -> Result<(), ValidationError> {
    if code.trim().is_empty() {
        return Err(ValidationError::EmptyShortCode);
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(ValidationError::InvalidShortCode);
    }
    Ok(())
}

fn strip_dial_separators(raw: &str) -> String {
    raw.chars()
        .filter(|c| !(c.is_whitespace() || matches!(c, '-' | '(' | ')')))
        .collect()
}

// local@domain.tld: no whitespace, a single '@', and a dot inside the domain
// with at least one character on each side.
fn is_email(raw: &str) -> bool {
    if raw.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = raw.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

// Optional leading '+', then at least eight digits, spaces, hyphens or parentheses.
fn is_phone(raw: &str) -> bool {
    let body = raw.strip_prefix('+').unwrap_or(raw);
    body.chars().count() >= 8
        && body
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_whitespace() || matches!(c, '-' | '(' | ')'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_gets_https_prefix_unless_already_http() {
        assert_eq!(ContentKind::Url.format("example.com"), "https://example.com");
        assert_eq!(ContentKind::Url.format("http://example.com"), "http://example.com");
        assert!(ContentKind::Url.validate("example.com").is_ok());
        assert!(ContentKind::Url.validate("").is_err());
    }

    #[test]
    fn email_rules() {
        assert!(ContentKind::Email.validate("a@b.co").is_ok());
        assert_eq!(
            ContentKind::Email.validate("not-an-email"),
            Err(ValidationError::InvalidEmail)
        );
        assert!(ContentKind::Email.validate("a@b.").is_err());
        assert!(ContentKind::Email.validate("a b@c.de").is_err());
        assert!(ContentKind::Email.validate("a@@c.de").is_err());
        assert_eq!(ContentKind::Email.format("a@b.co"), "mailto:a@b.co");
    }

    #[test]
    fn phone_and_sms_strip_separators() {
        assert!(ContentKind::Phone.validate("+1 (555) 123-4567").is_ok());
        assert!(ContentKind::Phone.validate("12345").is_err());
        assert!(ContentKind::Sms.validate("555-abc-1234").is_err());
        assert_eq!(ContentKind::Phone.format("+1 (555) 123-4567"), "tel:+15551234567");
        assert_eq!(ContentKind::Sms.format("555 123 4567"), "smsto:5551234567");
    }

    #[test]
    fn tagged_content_serializes_with_type_and_value() {
        let content = QrContent::Email("a@b.co".into());
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["type"], "email");
        assert_eq!(json["value"], "a@b.co");
        assert_eq!(content.encoded_payload(), "mailto:a@b.co");
    }

    #[test]
    fn default_name_strips_prefixes() {
        assert_eq!(QrContent::Url("https://www.example.com/a/b".into()).default_name(), "example.com");
        assert_eq!(QrContent::Url("shop.test".into()).default_name(), "shop.test");
        assert_eq!(QrContent::Email("me@x.io".into()).default_name(), "me@x.io");
    }

    #[test]
    fn short_code_charset() {
        assert!(validate_short_code("promo-1").is_ok());
        assert_eq!(validate_short_code("  "), Err(ValidationError::EmptyShortCode));
        assert_eq!(validate_short_code("bad code"), Err(ValidationError::InvalidShortCode));
        assert_eq!(validate_short_code("é"), Err(ValidationError::InvalidShortCode));
        assert_eq!(validate_short_code(" promo1 "), Err(ValidationError::InvalidShortCode));
        assert_eq!(validate_short_code("promo1\t"), Err(ValidationError::InvalidShortCode));
    }
}
