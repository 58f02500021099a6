mod allocation;
mod error;
mod http_mapping;
mod schema;
mod types;

pub use allocation::{overlaps, BusySlot, ReservationCandidate};
pub use error::ReservationError;
pub use http_mapping::reservation_error_to_status_code;
pub use schema::{is_checked, parse_cancel_form, FormData, RequestSchema, SchemaSelection};
pub use types::{CancelRequest, Reservation, ReservationRequest, SyncState};
