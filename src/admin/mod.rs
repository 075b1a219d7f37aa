//! Create/edit modals for the admin entities (accounts, companies, users).
//!
//! A modal owns a draft [`Form`] built from an existing record (edit) or from
//! the entity defaults (create). Saving validates the draft and only hands a
//! record to the caller's `on_save` collaborator when every check passes.

pub mod account;
pub mod company;
pub mod form;
pub mod user;

use crossterm::event::KeyCode;

use crate::notify::Notifier;
use crate::validation::ValidationError;
use form::{Form, FormField, FormKey};

/// An admin record that can be edited through a modal form.
pub trait ModalEntity: Clone + Default {
    /// Singular display name, e.g. "Conta".
    const NAME: &'static str;

    fn form_fields(&self) -> Vec<FormField>;

    /// Build a record from the draft. Text values are trimmed.
    fn from_form(form: &Form) -> Self;

    /// Required-field checks first, then entity-specific format checks.
    fn validate(&self) -> Result<(), ValidationError>;

    /// Short label for list rows and notifications.
    fn title(&self) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    Rejected(ValidationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKey {
    Continue,
    Save,
    Close,
}

pub struct EntityModal<E: ModalEntity> {
    draft: Form,
    open: bool,
    editing: bool,
    _entity: std::marker::PhantomData<E>,
}

impl<E: ModalEntity> Default for EntityModal<E> {
    fn default() -> Self {
        Self {
            draft: Form::new(E::default().form_fields()),
            open: false,
            editing: false,
            _entity: std::marker::PhantomData,
        }
    }
}

impl<E: ModalEntity> EntityModal<E> {
    /// Open in edit mode for `existing`, or in create mode with defaults.
    pub fn open(&mut self, existing: Option<E>) {
        self.editing = existing.is_some();
        self.draft = Form::new(existing.unwrap_or_default().form_fields());
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn title(&self) -> String {
        if self.is_editing() {
            format!("Editar {}", E::NAME)
        } else {
            format!("Cadastrar {}", E::NAME)
        }
    }

    pub fn form(&self) -> &Form {
        &self.draft
    }

    #[cfg(test)]
    pub fn form_mut(&mut self) -> &mut Form {
        &mut self.draft
    }

    pub fn handle_key(&mut self, code: KeyCode) -> ModalKey {
        match self.draft.handle_key(code) {
            FormKey::Submit => ModalKey::Save,
            FormKey::Cancel => ModalKey::Close,
            FormKey::Edited | FormKey::Ignored => ModalKey::Continue,
        }
    }

    /// Validate the draft and pass it to `on_save`. On failure `on_save` is
    /// not called and the modal stays open with the draft intact.
    pub fn handle_save(
        &mut self,
        notifier: &mut Notifier,
        on_save: impl FnOnce(E),
    ) -> SaveOutcome {
        let entity = E::from_form(&self.draft);
        if let Err(e) = entity.validate() {
            tracing::warn!(entity = E::NAME, error = %e, "save rejected");
            notifier.error(e.to_string());
            return SaveOutcome::Rejected(e);
        }

        let title = entity.title();
        tracing::info!(entity = E::NAME, title = %title, editing = self.editing, "saved");
        on_save(entity);
        notifier.success(format!("{} salvo: {title}", E::NAME));
        self.close();
        SaveOutcome::Saved
    }

    /// Discard the draft and close without saving.
    pub fn close(&mut self) {
        self.draft = Form::new(E::default().form_fields());
        self.editing = false;
        self.open = false;
    }
}
