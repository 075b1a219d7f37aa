use colored::Colorize;

use crate::error::Result;
use crate::validation::{digits_only, format_cnpj, validate_cnpj, validate_email};

/// Invalid input surfaces as an error so the process exits non-zero.
pub fn cnpj(value: &str) -> Result<()> {
    validate_cnpj(value)?;
    println!(
        "{} {} ({})",
        "CNPJ válido:".green(),
        format_cnpj(value),
        digits_only(value)
    );
    Ok(())
}

pub fn email(value: &str) -> Result<()> {
    validate_email(value)?;
    println!("{} {}", "E-mail válido:".green(), value.trim());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DreError;
    use crate::validation::ValidationError;

    #[test]
    fn test_cnpj_verdicts() {
        assert!(cnpj("11.222.333/0001-44").is_ok());
        assert!(matches!(
            cnpj("1122233300014"),
            Err(DreError::Validation(ValidationError::InvalidCnpj(13)))
        ));
    }

    #[test]
    fn test_email_verdicts() {
        assert!(email("a@b.co").is_ok());
        assert!(email("a@b").is_err());
        assert!(email("").is_err());
    }
}
