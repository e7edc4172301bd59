//! # Generic Resource Controller
//!
//! [`ResourceController`] drives one list/create/edit/delete screen: it loads the
//! collection, holds the draft, and reports every outcome to the operator through
//! a [`Notifier`]. Methods that talk to the server take `&mut self`, so a second
//! submit or delete cannot start while one is in flight.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::{docente::Docente, Confirmation, Resource};
use crate::loggers::Notifier;
use crate::retrieve::{ApiClient, TransportError};

/// The controller shipped for teachers.
pub type DocenteController = ResourceController<Docente>;

/// Errors returned by controller operations.
///
/// Every variant has already been reported to the operator when it is returned.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The draft failed client-side checks; nothing was sent.
    #[error("{0}")]
    Validation(String),

    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// No loaded entity carries this identifier.
    #[error("No record with id {0} in the loaded collection")]
    NotFound(String),
}

/// What a successful [`ResourceController::submit`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    Updated,
}

/// What [`ResourceController::delete`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The operator declined the confirmation; no request was sent.
    Declined,
}

pub struct ResourceController<R: Resource> {
    client: ApiClient,
    notifier: Arc<dyn Notifier>,
    confirmation: Arc<dyn Confirmation>,
    collection: Vec<R>,
    draft: R,
    editing: bool,
    form_visible: bool,
    filter: String,
}

impl<R: Resource> ResourceController<R> {
    /// Creates a controller with an empty collection and a closed, empty form.
    pub fn new(
        client: ApiClient,
        notifier: Arc<dyn Notifier>,
        confirmation: Arc<dyn Confirmation>,
    ) -> Self {
        Self {
            client,
            notifier,
            confirmation,
            collection: Vec::new(),
            draft: R::default(),
            editing: false,
            form_visible: false,
            filter: String::new(),
        }
    }

    pub fn collection(&self) -> &[R] {
        &self.collection
    }

    pub fn draft(&self) -> &R {
        &self.draft
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn is_form_visible(&self) -> bool {
        self.form_visible
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Looks up a loaded entity by identifier.
    pub fn find(&self, id: &R::Id) -> Option<&R> {
        self.collection.iter().find(|item| item.id() == Some(id))
    }

    /// Replaces the collection with the server's current list.
    ///
    /// On failure the previous collection is kept and the operator is notified. A 2xx
    /// answer without a JSON array (empty body, HTML page) counts as a failure.
    #[instrument(skip(self), fields(path = R::COLLECTION_PATH))]
    pub async fn load(&mut self) -> Result<(), ControllerError> {
        let fetched = self
            .client
            .get::<Vec<R>>(R::COLLECTION_PATH)
            .await
            .and_then(|response| {
                response.data.ok_or_else(|| {
                    TransportError::Decode("expected a JSON array, got no JSON body".to_string())
                })
            });
        match fetched {
            Ok(items) => {
                self.collection = items;
                debug!(count = self.collection.len(), "Collection loaded");
                Ok(())
            }
            Err(e) => {
                self.notifier
                    .failure(&format!("{}: {}", R::MESSAGES.load_failed, e.message()));
                Err(e.into())
            }
        }
    }

    /// Sends the draft: `PUT {path}/{id}` when editing, `POST {path}` otherwise.
    ///
    /// On success the form is reset and the collection reloaded. On failure the
    /// draft and both flags are left exactly as they were.
    #[instrument(skip(self), fields(path = R::COLLECTION_PATH, editing = self.editing))]
    pub async fn submit(&mut self) -> Result<SubmitOutcome, ControllerError> {
        // 1. Client-side checks
        if let Err(reason) = self.draft.validate() {
            self.notifier
                .failure(&format!("{}: {}", R::MESSAGES.save_failed, reason));
            return Err(ControllerError::Validation(reason));
        }

        // 2. Pick the verb
        let sent = if self.editing {
            let Some(id) = self.draft.id().cloned() else {
                let reason = "el registro en edición no tiene identificador".to_string();
                self.notifier
                    .failure(&format!("{}: {}", R::MESSAGES.save_failed, reason));
                return Err(ControllerError::Validation(reason));
            };
            self.client
                .put::<Value, R>(&R::item_path(&id), &self.draft)
                .await
                .map(|_| SubmitOutcome::Updated)
        } else {
            self.client
                .post::<Value, R>(R::COLLECTION_PATH, &self.draft)
                .await
                .map(|_| SubmitOutcome::Created)
        };

        // 3. Report, then reset and reload on success
        match sent {
            Ok(outcome) => {
                let message = match outcome {
                    SubmitOutcome::Created => R::MESSAGES.created,
                    SubmitOutcome::Updated => R::MESSAGES.updated,
                };
                info!(?outcome, "Draft saved");
                self.notifier.success(message);
                self.reset();
                if self.load().await.is_err() {
                    warn!("Reload after save failed; collection may be stale");
                }
                Ok(outcome)
            }
            Err(e) => {
                self.notifier
                    .failure(&format!("{}: {}", R::MESSAGES.save_failed, e.message()));
                Err(e.into())
            }
        }
    }

    /// Copies `entity` into the draft and opens the form in edit mode.
    pub fn begin_edit(&mut self, entity: &R) {
        debug!(id = ?entity.id(), "Begin edit");
        self.draft = entity.clone();
        self.editing = true;
        self.form_visible = true;
    }

    /// [`begin_edit`](Self::begin_edit) on a loaded entity.
    pub fn begin_edit_by_id(&mut self, id: &R::Id) -> Result<(), ControllerError> {
        let entity = self
            .find(id)
            .cloned()
            .ok_or_else(|| ControllerError::NotFound(id.to_string()))?;
        self.begin_edit(&entity);
        Ok(())
    }

    /// Deletes the entity `id` after the operator confirms.
    ///
    /// Exactly one `DELETE {path}/{id}` is sent when confirmed, none otherwise.
    #[instrument(skip(self, id), fields(path = R::COLLECTION_PATH, %id))]
    pub async fn delete(&mut self, id: &R::Id) -> Result<DeleteOutcome, ControllerError> {
        if !self.confirmation.confirm(R::MESSAGES.confirm_delete) {
            debug!("Delete declined");
            return Ok(DeleteOutcome::Declined);
        }

        match self.client.delete::<Value>(&R::item_path(id)).await {
            Ok(_) => {
                info!("Record deleted");
                self.notifier.success(R::MESSAGES.deleted);
                if self.load().await.is_err() {
                    warn!("Reload after delete failed; collection may be stale");
                }
                Ok(DeleteOutcome::Deleted)
            }
            Err(e) => {
                self.notifier
                    .failure(&format!("{}: {}", R::MESSAGES.delete_failed, e.message()));
                Err(e.into())
            }
        }
    }

    /// Clears the draft, leaves edit mode and hides the form.
    pub fn reset(&mut self) {
        self.draft = R::default();
        self.editing = false;
        self.form_visible = false;
    }

    /// Opens the form for a new record, or closes it with a [`reset`](Self::reset).
    pub fn toggle_form(&mut self) {
        if self.form_visible {
            self.reset();
        } else {
            self.form_visible = true;
        }
    }

    /// Writes one draft field through the resource's input rules.
    pub fn update_field(&mut self, field: R::Field, value: &str) {
        self.draft.set_field(field, value);
    }

    /// [`update_field`](Self::update_field) addressed by field name.
    pub fn update_field_by_name(&mut self, name: &str, value: &str) -> Result<(), ControllerError> {
        let field = name
            .parse::<R::Field>()
            .map_err(|_| ControllerError::UnknownField(name.to_string()))?;
        self.update_field(field, value);
        Ok(())
    }

    pub fn set_filter(&mut self, term: impl Into<String>) {
        self.filter = term.into();
    }

    pub fn clear_filter(&mut self) {
        self.filter.clear();
    }

    /// The collection narrowed by the current filter, in server order.
    pub fn filtered(&self) -> Vec<&R> {
        self.collection
            .iter()
            .filter(|item| item.matches(&self.filter))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configs::ClientConfig;
    use crate::loggers::NoticeLevel;
    use crate::resources::{DocenteField, DocenteId, FixedAnswer};
    use crate::session::{NoRedirect, StaticToken};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(NoticeLevel, String)>>);

    impl Notifier for Recorder {
        fn notify(&self, level: NoticeLevel, message: &str) {
            self.0.lock().unwrap().push((level, message.to_string()));
        }
    }

    fn controller(notifier: Arc<Recorder>) -> DocenteController {
        let client = ApiClient::new(
            // Nothing listens here; these tests never reach the network
            &ClientConfig::with_base_url("http://127.0.0.1:9/api"),
            Arc::new(StaticToken::anonymous()),
            Arc::new(NoRedirect),
        )
        .unwrap();
        ResourceController::new(client, notifier, Arc::new(FixedAnswer(false)))
    }

    fn docente(id: i64, identificacion: &str, nombre: &str, email: &str) -> Docente {
        Docente {
            id: Some(DocenteId::Number(id)),
            identificacion: identificacion.into(),
            nombre: nombre.into(),
            email: email.into(),
            especialidad: "Math".into(),
        }
    }

    #[test]
    fn test_form_lifecycle() {
        let mut c = controller(Arc::default());
        assert!(!c.is_form_visible());

        c.toggle_form();
        assert!(c.is_form_visible());
        assert!(!c.is_editing());

        c.update_field(DocenteField::Nombre, "Ana");
        c.toggle_form();
        assert!(!c.is_form_visible());
        assert_eq!(c.draft(), &Docente::default());

        let ana = docente(1, "123", "Ana", "a@x.com");
        c.begin_edit(&ana);
        assert!(c.is_editing());
        assert!(c.is_form_visible());
        assert_eq!(c.draft(), &ana);

        c.reset();
        assert!(!c.is_editing());
        assert!(!c.is_form_visible());
        assert_eq!(c.draft(), &Docente::default());
    }

    #[test]
    fn test_update_field_by_name() {
        let mut c = controller(Arc::default());
        c.update_field_by_name("identificacion", "12a3456789012").unwrap();
        assert_eq!(c.draft().identificacion, "1234567890");
        assert!(matches!(
            c.update_field_by_name("telefono", "555"),
            Err(ControllerError::UnknownField(name)) if name == "telefono"
        ));
    }

    #[test]
    fn test_filtered_view() {
        let mut c = controller(Arc::default());
        c.collection = vec![
            docente(1, "123", "Ana", "a@x.com"),
            docente(2, "456", "Luis", "l@y.com"),
        ];

        c.set_filter("an");
        let names: Vec<_> = c.filtered().iter().map(|d| d.nombre.as_str()).collect();
        assert_eq!(names, ["Ana"]);

        c.set_filter("45");
        assert_eq!(c.filtered()[0].nombre, "Luis");

        c.set_filter("Y.COM");
        assert_eq!(c.filtered().len(), 1);

        c.clear_filter();
        assert_eq!(c.filtered().len(), 2);

        assert!(c.begin_edit_by_id(&DocenteId::Number(2)).is_ok());
        assert_eq!(c.draft().nombre, "Luis");
        assert!(matches!(
            c.begin_edit_by_id(&DocenteId::Number(9)),
            Err(ControllerError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_draft_is_not_sent() {
        let notices = Arc::new(Recorder::default());
        let mut c = controller(notices.clone());
        c.toggle_form();
        c.update_field(DocenteField::Nombre, "Ana");

        let result = c.submit().await;
        assert!(matches!(result, Err(ControllerError::Validation(_))));
        assert!(c.is_form_visible());
        assert_eq!(c.draft().nombre, "Ana");

        let notices = notices.0.lock().unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].0, NoticeLevel::Failure);
        assert!(notices[0].1.starts_with("Error al guardar el docente: "));
    }

    #[tokio::test]
    async fn test_declined_delete_sends_nothing() {
        let notices = Arc::new(Recorder::default());
        let mut c = controller(notices.clone());
        let outcome = c.delete(&DocenteId::Number(1)).await.unwrap();
        assert_eq!(outcome, DeleteOutcome::Declined);
        assert!(notices.0.lock().unwrap().is_empty());
    }
}
