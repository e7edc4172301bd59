//! The teacher record as exchanged with `/docentes`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::{Resource, ResourceMessages};

/// Maximum length of the national identification code.
pub const IDENTIFICACION_MAX_LEN: usize = 10;

/// Server-assigned identifier; the backend may send a number or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocenteId {
    Number(i64),
    Text(String),
}

impl fmt::Display for DocenteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocenteId::Number(n) => write!(f, "{}", n),
            DocenteId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for DocenteId {
    fn from(n: i64) -> Self {
        DocenteId::Number(n)
    }
}

impl FromStr for DocenteId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Ok(s.parse::<i64>()
            .map(DocenteId::Number)
            .unwrap_or_else(|_| DocenteId::Text(s.to_string())))
    }
}

/// One teacher.
///
/// Unknown fields in server responses are dropped on deserialization and never
/// sent back. `null` text fields read as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Docente {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<DocenteId>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub identificacion: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub nombre: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub especialidad: String,
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Editable fields of a [`Docente`] draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocenteField {
    Identificacion,
    Nombre,
    Email,
    Especialidad,
}

impl DocenteField {
    pub const ALL: [DocenteField; 4] = [
        DocenteField::Identificacion,
        DocenteField::Nombre,
        DocenteField::Email,
        DocenteField::Especialidad,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DocenteField::Identificacion => "identificacion",
            DocenteField::Nombre => "nombre",
            DocenteField::Email => "email",
            DocenteField::Especialidad => "especialidad",
        }
    }
}

impl fmt::Display for DocenteField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocenteField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        DocenteField::ALL
            .into_iter()
            .find(|field| field.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| name.to_string())
    }
}

/// Input rule of the identification field: keep ASCII digits only, then cut to
/// [`IDENTIFICACION_MAX_LEN`] characters.
///
/// Applied on every write to the field, so a draft never holds anything else.
pub fn sanitize_identificacion(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii_digit)
        .take(IDENTIFICACION_MAX_LEN)
        .collect()
}

impl Docente {
    pub fn field(&self, field: DocenteField) -> &str {
        match field {
            DocenteField::Identificacion => &self.identificacion,
            DocenteField::Nombre => &self.nombre,
            DocenteField::Email => &self.email,
            DocenteField::Especialidad => &self.especialidad,
        }
    }
}

impl Resource for Docente {
    type Id = DocenteId;
    type Field = DocenteField;

    const COLLECTION_PATH: &'static str = "/docentes";
    const MESSAGES: ResourceMessages = ResourceMessages {
        created: "Docente registrado correctamente",
        updated: "Docente actualizado correctamente",
        deleted: "Docente eliminado correctamente",
        save_failed: "Error al guardar el docente",
        delete_failed: "Error al eliminar el docente",
        load_failed: "Error al cargar docentes",
        confirm_delete: "¿Está seguro de eliminar este docente?",
    };

    fn id(&self) -> Option<&DocenteId> {
        self.id.as_ref()
    }

    fn set_field(&mut self, field: DocenteField, value: &str) {
        match field {
            DocenteField::Identificacion => self.identificacion = sanitize_identificacion(value),
            DocenteField::Nombre => self.nombre = value.to_string(),
            DocenteField::Email => self.email = value.to_string(),
            DocenteField::Especialidad => self.especialidad = value.to_string(),
        }
    }

    fn matches(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        let needle = term.to_lowercase();
        self.nombre.to_lowercase().contains(&needle)
            || self.identificacion.contains(term)
            || self.email.to_lowercase().contains(&needle)
    }

    fn validate(&self) -> Result<(), String> {
        if self.identificacion.is_empty() {
            return Err("La identificación es obligatoria".to_string());
        }
        if self.identificacion.len() > IDENTIFICACION_MAX_LEN
            || !self.identificacion.chars().all(|c| c.is_ascii_digit())
        {
            return Err("Solo se permiten números, máximo 10 dígitos".to_string());
        }
        if self.nombre.trim().is_empty() {
            return Err("El nombre es obligatorio".to_string());
        }
        if self.email.trim().is_empty() {
            return Err("El correo electrónico es obligatorio".to_string());
        }
        if !self.email.contains('@') {
            return Err("El correo electrónico no es válido".to_string());
        }
        if self.especialidad.trim().is_empty() {
            return Err("La especialidad es obligatoria".to_string());
        }
        Ok(())
    }
}
