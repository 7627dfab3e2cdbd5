//! Gateway for the pet marker endpoints.
//!
//! Listing always fetches the full set; there is no incremental sync and no
//! local merge of created markers. Callers reload after a successful create.

use crate::models::{AnimalRecord, DraftField, MarkerDraft, PetMarker, SubmissionEncoding};
use petmap_auth::models::json_part;
use petmap_auth::{RequestBody, Session, Transport, TransportError};
use reqwest::multipart::Form;
use serde_json::Value;

pub const MARKERS_PATH: &str = "/api/animais";
pub const AVAILABLE_MARKERS_PATH: &str = "/api/animais/disponiveis";

/// Multipart part names expected by the service
const ANIMAL_PART: &str = "animal";
const PHOTO_PART: &str = "foto";

/// Error type for marker operations
#[derive(Debug, Clone, PartialEq)]
pub enum MarkerError {
    /// Draft rejected locally, nothing was sent
    ValidationFailed(DraftField),
    FetchFailed(String),
    SubmitFailed(String),
    /// The service rejected the session token
    Unauthorized,
    /// Save requested with no draft open, or while one is being saved
    NoOpenDraft,
}

impl std::fmt::Display for MarkerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkerError::ValidationFailed(field) => write!(f, "Invalid {}", field.as_str()),
            MarkerError::FetchFailed(msg) => write!(f, "Could not load markers: {}", msg),
            MarkerError::SubmitFailed(msg) => write!(f, "Could not save marker: {}", msg),
            MarkerError::Unauthorized => write!(f, "Not authorized"),
            MarkerError::NoOpenDraft => write!(f, "No marker draft to save"),
        }
    }
}

impl std::error::Error for MarkerError {}

/// Service for listing and creating markers
#[derive(Clone)]
pub struct MarkerService {
    transport: Transport,
}

impl MarkerService {
    pub fn new(transport: Transport) -> Self {
        Self { transport }
    }

    pub fn session(&self) -> &Session {
        self.transport.session()
    }

    /// Fetch every available marker.
    ///
    /// Records without a usable id or coordinates are skipped with a warning.
    pub async fn list_available(&self) -> Result<Vec<PetMarker>, MarkerError> {
        let response = self
            .transport
            .get(AVAILABLE_MARKERS_PATH)
            .await
            .map_err(|e| classify(e, MarkerError::FetchFailed))?;

        let Value::Array(items) = response else {
            return Err(MarkerError::FetchFailed(
                "Unexpected response: expected a list of markers".to_string(),
            ));
        };

        let total = items.len();
        let base_url = self.transport.base_url();
        let markers: Vec<PetMarker> = items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<AnimalRecord>(item) {
                Ok(record) => record.into_marker(base_url),
                Err(e) => {
                    log::debug!("Unreadable marker record: {}", e);
                    None
                }
            })
            .collect();

        if markers.len() < total {
            log::warn!("Skipped {} malformed marker(s)", total - markers.len());
        }
        log::info!("Loaded {} markers", markers.len());
        Ok(markers)
    }

    /// Submit a draft.
    ///
    /// The draft is validated first; an invalid draft never reaches the
    /// network. With a photo the structured fields travel as one JSON part
    /// named `animal` next to the binary `foto` part, otherwise as a plain
    /// JSON body.
    ///
    /// Any 2xx response means the marker was stored. The echoed marker is
    /// returned when the response carries a usable one, `None` otherwise.
    pub async fn create_marker(
        &self,
        draft: &MarkerDraft,
    ) -> Result<Option<PetMarker>, MarkerError> {
        draft.validate().map_err(MarkerError::ValidationFailed)?;

        let body = encode_draft(draft)?;
        let response = self
            .transport
            .post(MARKERS_PATH, body)
            .await
            .map_err(|e| classify(e, MarkerError::SubmitFailed))?;

        let marker = created_marker(response, draft, self.transport.base_url());
        match &marker {
            Some(marker) => log::info!("Created marker {}", marker.id),
            None => log::info!("Created marker; service did not echo it"),
        }
        Ok(marker)
    }
}

fn classify(err: TransportError, otherwise: fn(String) -> MarkerError) -> MarkerError {
    if err.is_unauthorized() {
        MarkerError::Unauthorized
    } else {
        otherwise(err.message)
    }
}

fn encode_draft(draft: &MarkerDraft) -> Result<RequestBody, MarkerError> {
    let payload = draft.payload();

    match draft.encoding() {
        SubmissionEncoding::Json => serde_json::to_value(&payload)
            .map(RequestBody::Json)
            .map_err(|e| MarkerError::SubmitFailed(format!("Failed to encode marker: {}", e))),
        SubmissionEncoding::Multipart => {
            let mut form = Form::new().part(
                ANIMAL_PART,
                json_part(&payload).map_err(MarkerError::SubmitFailed)?,
            );
            if let Some(photo) = &draft.photo {
                let part = photo
                    .to_part()
                    .map_err(|e| MarkerError::SubmitFailed(format!("Invalid photo: {}", e)))?;
                form = form.part(PHOTO_PART, part);
            }
            Ok(RequestBody::Multipart(form))
        }
    }
}

/// Read the created marker from the response, filling fields the service
/// left out from the submitted draft
fn created_marker(response: Value, draft: &MarkerDraft, base_url: &str) -> Option<PetMarker> {
    let Value::Object(mut fields) = response else {
        return None;
    };

    if let Ok(Value::Object(submitted)) = serde_json::to_value(draft.payload()) {
        for (key, value) in submitted {
            match fields.get(&key) {
                Some(existing) if !existing.is_null() => {}
                _ => {
                    fields.insert(key, value);
                }
            }
        }
    }

    serde_json::from_value::<AnimalRecord>(Value::Object(fields))
        .ok()
        .and_then(|record| record.into_marker(base_url))
}
