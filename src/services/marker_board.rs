//! Map screen state: confirmed markers, the "my pets" filter, the selected
//! marker and the new-marker draft flow.
//!
//! Draft flow:
//!
//! ```text
//! Idle --click--> DraftOpen --save--> Submitting --ok--> Idle (list reloaded)
//!                  ^    |                  |
//!                  |    +--cancel--> Idle  +--error--> DraftOpen (fields kept)
//!                  +--click (fields reset)
//! ```

use crate::models::{MapPin, MarkerDraft, MarkerId, PetMarker, PinIcon, Position};
use crate::services::marker_service::{MarkerError, MarkerService};

#[derive(Debug, Clone, PartialEq)]
pub enum DraftState {
    Idle,
    Open(MarkerDraft),
    Submitting(MarkerDraft),
}

/// The new-marker form and its lifecycle
#[derive(Debug, Clone, PartialEq)]
pub struct DraftFlow {
    state: DraftState,
    error: Option<String>,
}

impl Default for DraftFlow {
    fn default() -> Self {
        Self {
            state: DraftState::Idle,
            error: None,
        }
    }
}

impl DraftFlow {
    pub fn state(&self) -> &DraftState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, DraftState::Idle)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self.state, DraftState::Submitting(_))
    }

    /// The draft being edited or submitted
    pub fn draft(&self) -> Option<&MarkerDraft> {
        match &self.state {
            DraftState::Open(draft) | DraftState::Submitting(draft) => Some(draft),
            DraftState::Idle => None,
        }
    }

    /// Editable draft; `None` while idle or while the form is disabled
    pub fn draft_mut(&mut self) -> Option<&mut MarkerDraft> {
        match &mut self.state {
            DraftState::Open(draft) => Some(draft),
            _ => None,
        }
    }

    /// Message from the last failed submission
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Open a fresh draft at `position`, discarding any open one.
    ///
    /// Ignored while a submission is in flight.
    pub fn open_at(&mut self, position: Position) -> bool {
        if self.is_submitting() {
            log::debug!("Ignoring map click while a marker is being saved");
            return false;
        }
        self.state = DraftState::Open(MarkerDraft::at(position));
        self.error = None;
        true
    }

    pub fn cancel(&mut self) -> bool {
        if !matches!(self.state, DraftState::Open(_)) {
            return false;
        }
        self.state = DraftState::Idle;
        self.error = None;
        true
    }

    /// Lock the form and hand out the draft to submit
    pub fn begin_submit(&mut self) -> Option<MarkerDraft> {
        let DraftState::Open(draft) = &self.state else {
            return None;
        };
        let draft = draft.clone();
        self.state = DraftState::Submitting(draft.clone());
        self.error = None;
        Some(draft)
    }

    /// Success discards the draft, failure reopens it with its fields intact
    pub fn finish_submit(&mut self, result: Result<(), String>) {
        if !self.is_submitting() {
            return;
        }
        let DraftState::Submitting(draft) = std::mem::replace(&mut self.state, DraftState::Idle)
        else {
            return;
        };
        match result {
            Ok(()) => {
                self.error = None;
            }
            Err(message) => {
                self.state = DraftState::Open(draft);
                self.error = Some(message);
            }
        }
    }
}

/// State behind the map screen
#[derive(Debug, Clone, Default)]
pub struct MarkerBoard {
    markers: Vec<PetMarker>,
    show_mine_only: bool,
    selected: Option<MarkerId>,
    draft: DraftFlow,
    load_error: Option<String>,
}

impl MarkerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// All confirmed markers, unfiltered
    pub fn markers(&self) -> &[PetMarker] {
        &self.markers
    }

    /// Markers passing the current filter
    pub fn visible_markers(&self) -> Vec<&PetMarker> {
        self.markers
            .iter()
            .filter(|m| !self.show_mine_only || m.is_mine)
            .collect()
    }

    pub fn show_mine_only(&self) -> bool {
        self.show_mine_only
    }

    /// Flip the "only my pets" filter; the selection is dropped
    pub fn toggle_mine_filter(&mut self) {
        self.show_mine_only = !self.show_mine_only;
        self.selected = None;
    }

    /// Select a visible marker for the info window
    pub fn select(&mut self, id: &MarkerId) -> bool {
        let visible = self.visible_markers().iter().any(|m| &m.id == id);
        self.selected = visible.then(|| id.clone());
        visible
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The selected marker, as long as it passes the current filter
    pub fn selected(&self) -> Option<&PetMarker> {
        let id = self.selected.as_ref()?;
        self.visible_markers().into_iter().find(|m| &m.id == id)
    }

    pub fn draft(&self) -> &DraftFlow {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut DraftFlow {
        &mut self.draft
    }

    /// Message from the last failed reload
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    /// A click on the map closes the info window and opens a draft there
    pub fn on_map_click(&mut self, position: Position) -> bool {
        self.selected = None;
        self.draft.open_at(position)
    }

    /// Replace the confirmed markers. The draft is never touched.
    ///
    /// The selection is dropped when its marker vanished or no longer
    /// passes the filter.
    pub fn apply_reload(&mut self, markers: Vec<PetMarker>) {
        self.markers = markers;
        self.load_error = None;
        if self.selected().is_none() {
            self.selected = None;
        }
    }

    /// Pins for the map widget: visible markers, then the draft pin if any
    pub fn pins(&self) -> Vec<MapPin> {
        let mut pins: Vec<MapPin> = self
            .visible_markers()
            .into_iter()
            .map(|m| MapPin {
                id: Some(m.id.clone()),
                position: m.position,
                icon: PinIcon::confirmed(m.color),
            })
            .collect();

        if let Some(draft) = self.draft.draft() {
            pins.push(MapPin {
                id: None,
                position: draft.position,
                icon: PinIcon::draft(draft.color),
            });
        }
        pins
    }

    /// Fetch the full marker list and apply it.
    ///
    /// Returns `Ok(false)` when the session changed while the request was in
    /// flight; the stale list is dropped.
    pub async fn reload(&mut self, service: &MarkerService) -> Result<bool, MarkerError> {
        let ticket = service.session().ticket();

        let markers = match service.list_available().await {
            Ok(markers) => markers,
            Err(e) => {
                self.load_error = Some(e.to_string());
                return Err(e);
            }
        };

        if !service.session().is_current(ticket) {
            log::debug!("Discarding marker list from an ended session");
            return Ok(false);
        }

        self.apply_reload(markers);
        Ok(true)
    }

    /// Submit the open draft, then reload the whole list.
    ///
    /// Any 2xx counts as saved, echoed marker or not. A failed reload after
    /// a successful submit does not fail the submit; it is reported through
    /// [`MarkerBoard::load_error`].
    pub async fn submit_draft(
        &mut self,
        service: &MarkerService,
    ) -> Result<Option<PetMarker>, MarkerError> {
        let Some(draft) = self.draft.begin_submit() else {
            return Err(MarkerError::NoOpenDraft);
        };

        match service.create_marker(&draft).await {
            Ok(marker) => {
                self.draft.finish_submit(Ok(()));
                if let Err(e) = self.reload(service).await {
                    log::warn!("Marker saved but reload failed: {}", e);
                }
                Ok(marker)
            }
            Err(e) => {
                self.draft.finish_submit(Err(e.to_string()));
                Err(e)
            }
        }
    }
}
