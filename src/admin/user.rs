use super::form::{Form, FormField};
use super::ModalEntity;
use crate::models::{Role, User};
use crate::validation::{required, validate_email, ValidationError};

pub const NAME_IDX: usize = 0;
pub const EMAIL_IDX: usize = 1;
pub const ROLE_IDX: usize = 2;
pub const ACTIVE_IDX: usize = 3;

impl ModalEntity for User {
    const NAME: &'static str = "Usuário";

    fn form_fields(&self) -> Vec<FormField> {
        let roles: Vec<&str> = Role::ALL.iter().map(|r| r.label()).collect();
        let selected = Role::ALL.iter().position(|r| *r == self.role).unwrap_or(0);
        vec![
            FormField::text("Nome", &self.name),
            FormField::text("E-mail", &self.email),
            FormField::selector("Perfil", &roles, selected),
            FormField::toggle("Status", self.active),
        ]
    }

    fn from_form(form: &Form) -> Self {
        User {
            name: form.text(NAME_IDX),
            email: form.text(EMAIL_IDX),
            role: Role::ALL
                .get(form.selected(ROLE_IDX))
                .copied()
                .unwrap_or_default(),
            active: form.is_on(ACTIVE_IDX),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required("Nome", &self.name)?;
        required("E-mail", &self.email)?;
        validate_email(&self.email)
    }

    fn title(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user_defaults_to_viewer() {
        let form = Form::new(User::default().form_fields());
        assert_eq!(form.value(ROLE_IDX), "Visualizador");
        assert!(form.is_on(ACTIVE_IDX));
    }

    #[test]
    fn test_email_format() {
        let mut user = User {
            name: "Ana".into(),
            email: "a@b.co".into(),
            ..User::default()
        };
        assert!(user.validate().is_ok());
        user.email = "a@b".into();
        assert_eq!(user.validate(), Err(ValidationError::InvalidEmail("a@b".into())));
        user.email = String::new();
        assert_eq!(user.validate(), Err(ValidationError::Required("E-mail")));
    }
}
