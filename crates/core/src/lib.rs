//! Core domain of reserveit.
//!
//! Everything here is pure: resource definitions and their validation, the
//! time-slot grid, request schemas, calendar allocation, route planning and
//! the page context shared by the live app and the static site. Storage and
//! calendar backends are traits implemented by the binary.

pub mod app_config;
pub mod calendar;
pub mod page;
pub mod reservation;
pub mod resource;
pub mod routing;
pub mod storage;
