pub mod draft;
pub mod marker;
pub mod pin;

pub use draft::{AnimalPayload, DraftField, MarkerDraft, SubmissionEncoding};
pub use marker::{AnimalRecord, MarkerColor, MarkerId, PetMarker, Position};
pub use pin::{MapPin, PinIcon};
