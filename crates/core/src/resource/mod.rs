mod checks;
mod config;
mod document;
mod error;
mod map;
mod slots;
mod time;
mod types;

pub use checks::{is_hex_color, is_valid_email, is_valid_timezone};
pub use config::{ResourceConfig, ResourceConfigSpec, MAX_CALENDARS_SHOWN, RESERVED_FIELD_NAMES};
pub use document::{identity_from_stem, resource_from_document};
pub use error::{ConfigError, Result};
pub use map::ResourceMap;
pub use slots::{format_time_slots, time_slots};
pub use time::{format_clock_time, parse_clock_time, AM_PM_TIME_FORMAT};
pub use types::{CalendarInfo, CustomFormField, HtmlInputType, ImageFile};
