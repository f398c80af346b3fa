//! Reservation entity and its status state machine.

pub mod model;
pub mod status;

pub use model::{Reservation, ReservationFilter};
pub use status::ReservationStatus;
