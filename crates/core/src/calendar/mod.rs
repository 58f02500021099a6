mod error;
mod traits;
mod types;

pub use error::{CalendarError, Result};
pub use traits::CalendarService;
pub use types::{BusyInterval, CalendarEventRequest};
