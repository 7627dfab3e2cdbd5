use super::marker::{MarkerColor, Position};
use petmap_auth::PhotoAttachment;
use serde::Serialize;

/// Draft field that failed the pre-flight check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Description,
    Coordinates,
}

impl DraftField {
    pub fn as_str(&self) -> &str {
        match self {
            DraftField::Description => "description",
            DraftField::Coordinates => "location",
        }
    }
}

/// Unsaved marker opened by a map click
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerDraft {
    pub position: Position,
    pub description: String,
    pub name: Option<String>,
    pub photo: Option<PhotoAttachment>,
    pub color: MarkerColor,
}

/// How a draft is sent to the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionEncoding {
    /// Plain JSON body
    Json,
    /// `animal` JSON part plus the binary photo part
    Multipart,
}

/// Structured fields of a marker submission, as the service names them
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AnimalPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome: Option<String>,
    pub descricao: String,
    pub latitude: f64,
    pub longitude: f64,
    pub color: MarkerColor,
}

impl MarkerDraft {
    /// Fresh draft at a clicked position with every other field at its default
    pub fn at(position: Position) -> Self {
        Self {
            position,
            description: String::new(),
            name: None,
            photo: None,
            color: MarkerColor::default(),
        }
    }

    /// Pre-flight check run before anything is sent
    pub fn validate(&self) -> Result<(), DraftField> {
        if !self.position.is_valid() {
            return Err(DraftField::Coordinates);
        }
        if self.description.trim().is_empty() {
            return Err(DraftField::Description);
        }
        Ok(())
    }

    pub fn encoding(&self) -> SubmissionEncoding {
        if self.photo.is_some() {
            SubmissionEncoding::Multipart
        } else {
            SubmissionEncoding::Json
        }
    }

    pub fn payload(&self) -> AnimalPayload {
        AnimalPayload {
            nome: self
                .name
                .as_deref()
                .map(str::trim)
                .filter(|n| !n.is_empty())
                .map(str::to_string),
            descricao: self.description.trim().to_string(),
            latitude: self.position.lat,
            longitude: self.position.lng,
            color: self.color,
        }
    }
}
