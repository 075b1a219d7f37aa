use super::form::{Form, FormField};
use super::ModalEntity;
use crate::models::{Account, AccountKind};
use crate::validation::{required, ValidationError};

// Field order of Account::form_fields
pub const CODE_IDX: usize = 0;
pub const NAME_IDX: usize = 1;
pub const KIND_IDX: usize = 2;
pub const GROUP_IDX: usize = 3;
pub const ACTIVE_IDX: usize = 4;

impl ModalEntity for Account {
    const NAME: &'static str = "Conta";

    fn form_fields(&self) -> Vec<FormField> {
        let kinds: Vec<&str> = AccountKind::ALL.iter().map(|k| k.label()).collect();
        let selected = AccountKind::ALL
            .iter()
            .position(|k| *k == self.kind)
            .unwrap_or(0);
        vec![
            FormField::text("Código", &self.code),
            FormField::text("Nome", &self.name),
            FormField::selector("Tipo", &kinds, selected),
            FormField::text("Grupo", &self.group),
            FormField::toggle("Status", self.active),
        ]
    }

    fn from_form(form: &Form) -> Self {
        Account {
            code: form.text(CODE_IDX),
            name: form.text(NAME_IDX),
            kind: AccountKind::ALL
                .get(form.selected(KIND_IDX))
                .copied()
                .unwrap_or_default(),
            group: form.text(GROUP_IDX),
            active: form.is_on(ACTIVE_IDX),
        }
    }

    fn validate(&self) -> Result<(), ValidationError> {
        required("Código", &self.code)?;
        required("Nome", &self.name)
    }

    fn title(&self) -> String {
        format!("{} {}", self.code, self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_round_trip_keeps_kind() {
        let account = Account {
            code: "4.1.01".into(),
            name: "CMV".into(),
            kind: AccountKind::Custo,
            group: "CMV".into(),
            active: false,
        };
        let form = Form::new(account.form_fields());
        assert_eq!(form.value(KIND_IDX), "Custo");
        assert_eq!(Account::from_form(&form), account);
    }

    #[test]
    fn test_code_is_required() {
        let account = Account {
            name: "Vendas".into(),
            ..Account::default()
        };
        assert_eq!(account.validate(), Err(ValidationError::Required("Código")));
    }
}
