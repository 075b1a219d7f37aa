use super::form::{Form, FormField};
use super::ModalEntity;
use crate::models::Company;
use crate::validation::{format_cnpj, required, validate_cnpj, validate_email, ValidationError};

pub const LEGAL_NAME_IDX: usize = 0;
pub const TRADE_NAME_IDX: usize = 1;
pub const CNPJ_IDX: usize = 2;
pub const EMAIL_IDX: usize = 3;
pub const ACTIVE_IDX: usize = 4;

impl ModalEntity for Company {
    const NAME: &'static str = "Empresa";

    fn form_fields(&self) -> Vec<FormField> {
        vec![
            FormField::text("Razão social", &self.legal_name),
            FormField::text("Nome fantasia", &self.trade_name),
            FormField::text("CNPJ", &self.cnpj),
            FormField::text("E-mail", &self.email),
            FormField::toggle("Status", self.active),
        ]
    }

    /// The CNPJ is stored formatted whenever it carries 14 digits.
    fn from_form(form: &Form) -> Self {
        Company {
            legal_name: form.text(LEGAL_NAME_IDX),
            trade_name: form.text(TRADE_NAME_IDX),
            cnpj: format_cnpj(&form.text(CNPJ_IDX)),
            email: form.text(EMAIL_IDX),
            active: form.is_on(ACTIVE_IDX),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required("Razão social", &self.legal_name)?;
        required("CNPJ", &self.cnpj)?;
        validate_cnpj(&self.cnpj)?;
        if !self.email.is_empty() {
            validate_email(&self.email)?;
        }
        Ok(())
    }

    fn title(&self) -> String {
        if self.trade_name.is_empty() {
            self.legal_name.clone()
        } else {
            self.trade_name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(cnpj: &str, email: &str) -> Form {
        let mut form = Form::new(Company::default().form_fields());
        form.set_text(LEGAL_NAME_IDX, "Acme Comércio Ltda");
        form.set_text(CNPJ_IDX, cnpj);
        form.set_text(EMAIL_IDX, email);
        form
    }

    #[test]
    fn test_raw_cnpj_is_formatted() {
        let company = Company::from_form(&draft("11222333000144", ""));
        assert_eq!(company.cnpj, "11.222.333/0001-44");
        assert!(company.validate().is_ok());
    }

    #[test]
    fn test_cnpj_length_checked() {
        let short = Company::from_form(&draft("1122233300014", ""));
        assert_eq!(short.validate(), Err(ValidationError::InvalidCnpj(13)));
        let long = Company::from_form(&draft("112223330001445", ""));
        assert_eq!(long.validate(), Err(ValidationError::InvalidCnpj(15)));
    }

    #[test]
    fn test_optional_email_validated_when_present() {
        let bad = Company::from_form(&draft("11222333000144", "financeiro@acme"));
        assert!(matches!(bad.validate(), Err(ValidationError::InvalidEmail(_))));
    }

    #[test]
    fn test_title_prefers_trade_name() {
        let mut company = Company::from_form(&draft("11222333000144", ""));
        assert_eq!(company.title(), "Acme Comércio Ltda");
        company.trade_name = "Acme".into();
        assert_eq!(company.title(), "Acme");
    }
}
