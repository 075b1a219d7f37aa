use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

pub const CNPJ_DIGITS: usize = 14;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Campo obrigatório: {0}")]
    Required(&'static str),

    #[error("E-mail inválido: {0}")]
    InvalidEmail(String),

    #[error("CNPJ deve ter 14 dígitos (informado: {0})")]
    InvalidCnpj(usize),
}

/// Reject empty or whitespace-only values for `field`.
pub fn required(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::Required(field))
    } else {
        Ok(())
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn validate_email(value: &str) -> Result<(), ValidationError> {
    if is_valid_email(value.trim()) {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(value.trim().to_string()))
    }
}

/// Strip everything but ASCII digits.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// A CNPJ is accepted when exactly 14 digits remain after stripping punctuation.
/// Check digits are not verified.
pub fn validate_cnpj(value: &str) -> Result<(), ValidationError> {
    let digits = digits_only(value);
    if digits.len() == CNPJ_DIGITS {
        Ok(())
    } else {
        Err(ValidationError::InvalidCnpj(digits.len()))
    }
}

/// Format a CNPJ as `XX.XXX.XXX/XXXX-XX`. Inputs that do not carry exactly
/// 14 digits are returned unchanged.
pub fn format_cnpj(value: &str) -> String {
    let d = digits_only(value);
    if d.len() != CNPJ_DIGITS {
        return value.to_string();
    }
    format!(
        "{}.{}.{}/{}-{}",
        &d[0..2],
        &d[2..5],
        &d[5..8],
        &d[8..12],
        &d[12..14]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert_eq!(required("Nome", ""), Err(ValidationError::Required("Nome")));
        assert_eq!(required("Nome", "   "), Err(ValidationError::Required("Nome")));
        assert!(required("Nome", "Ana").is_ok());
    }

    #[test]
    fn test_email_examples() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("financeiro@empresa.com.br"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a b@c.com"));
        assert!(!is_valid_email("a@@b.com"));
    }

    #[test]
    fn test_validate_email_trims() {
        assert!(validate_email("  a@b.co ").is_ok());
        let err = validate_email("a@b").unwrap_err();
        assert_eq!(err.to_string(), "E-mail inválido: a@b");
    }

    #[test]
    fn test_cnpj_digit_length() {
        assert!(validate_cnpj("11222333000144").is_ok());
        assert!(validate_cnpj("11.222.333/0001-44").is_ok());
        assert_eq!(validate_cnpj("1122233300014"), Err(ValidationError::InvalidCnpj(13)));
        assert_eq!(validate_cnpj("112223330001445"), Err(ValidationError::InvalidCnpj(15)));
        assert_eq!(validate_cnpj(""), Err(ValidationError::InvalidCnpj(0)));
    }

    #[test]
    fn test_format_cnpj() {
        assert_eq!(format_cnpj("11222333000144"), "11.222.333/0001-44");
        assert_eq!(format_cnpj("11.222.333/0001-44"), "11.222.333/0001-44");
        assert_eq!(format_cnpj("123"), "123");
    }
}
