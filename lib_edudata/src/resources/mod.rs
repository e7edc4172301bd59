//! # Resource Controllers
//!
//! A resource controller owns the in-memory collection of one entity type, the
//! single draft being created or edited, and the search filter. Every mutation is
//! followed by a full reload of the collection; nothing is patched locally.
//!
//! The controller is written once, generically over [`Resource`]. Each entity
//! supplies its endpoint, its editable fields, its filter predicate, its
//! client-side validation and the messages shown to the operator.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

/// The generic controller.
pub mod controller;
/// The teacher (`docente`) resource.
pub mod docente;

pub use controller::*;
pub use docente::*;

/// Operator-facing texts of one resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceMessages {
    pub created: &'static str,
    pub updated: &'static str,
    pub deleted: &'static str,
    pub save_failed: &'static str,
    pub delete_failed: &'static str,
    pub load_failed: &'static str,
    /// Prompt of the yes/no gate in front of every delete.
    pub confirm_delete: &'static str,
}

/// An entity managed through a REST collection endpoint.
///
/// `Default` is the empty draft: all fields blank, no identifier.
pub trait Resource:
    Clone + Default + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync
{
    /// Server-assigned identifier.
    type Id: Clone + PartialEq + fmt::Debug + fmt::Display + Send + Sync;
    /// The editable fields of the draft.
    type Field: Copy + fmt::Debug + std::str::FromStr;

    /// Collection endpoint relative to the API base, e.g. `/docentes`.
    const COLLECTION_PATH: &'static str;
    const MESSAGES: ResourceMessages;

    fn id(&self) -> Option<&Self::Id>;

    /// Writes `value` into `field`, applying the field's input rules.
    fn set_field(&mut self, field: Self::Field, value: &str);

    /// Filter predicate; an empty term matches everything.
    fn matches(&self, term: &str) -> bool;

    /// Client-side checks run before a submit leaves the process.
    fn validate(&self) -> Result<(), String>;

    /// Item endpoint for `id`, e.g. `/docentes/7`.
    fn item_path(id: &Self::Id) -> String {
        format!("{}/{}", Self::COLLECTION_PATH, id)
    }
}

/// The yes/no gate in front of destructive operations.
pub trait Confirmation: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Answers every prompt with a fixed value (`--yes` on the console, tests).
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl Confirmation for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
