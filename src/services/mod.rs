pub mod marker_board;
pub mod marker_service;

pub use marker_board::{DraftFlow, DraftState, MarkerBoard};
pub use marker_service::{MarkerError, MarkerService};
