//! Request schemas: parsing and validating submitted reservation forms.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::{CancelRequest, ReservationError, ReservationRequest};
use crate::resource::{is_valid_email, parse_clock_time, ConfigError, ResourceConfig, ResourceMap};

/// A submitted urlencoded form.
pub type FormData = BTreeMap<String, String>;

/// How a resource validates incoming reservation forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestSchema {
    /// The base reservation rules.
    Base,
    /// Base rules plus a form field that must equal a shared secret.
    SharedSecret { field: String, secret: String },
}

impl RequestSchema {
    /// Validates a reservation form against `resource` as of `now`.
    ///
    /// Every failed rule is reported, not only the first.
    pub fn validate(
        &self,
        resource: &ResourceConfig,
        form: &FormData,
        now: NaiveDateTime,
    ) -> Result<ReservationRequest, ReservationError> {
        let mut messages = Vec::new();
        let request = validate_base(resource, form, now, &mut messages);

        let request = match self {
            RequestSchema::Base => request,
            RequestSchema::SharedSecret { field, secret } => {
                if form.get(field).map(|v| v.trim()) != Some(secret.as_str()) {
                    messages.push("Invalid input".to_string());
                }
                request.map(|mut request| {
                    request.custom_fields.remove(field);
                    request
                })
            }
        };

        match request {
            Some(request) if messages.is_empty() => Ok(request),
            _ => Err(ReservationError::Validation { messages }),
        }
    }

    /// The form field this schema reads beyond the base fields, if any.
    pub fn secret_field(&self) -> Option<&str> {
        match self {
            RequestSchema::Base => None,
            RequestSchema::SharedSecret { field, .. } => Some(field),
        }
    }
}

/// Either one schema for every resource, or one per resource identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSelection {
    Shared(RequestSchema),
    PerResource(BTreeMap<String, RequestSchema>),
}

impl Default for SchemaSelection {
    fn default() -> Self {
        SchemaSelection::Shared(RequestSchema::Base)
    }
}

impl SchemaSelection {
    /// Resolves the schema of every resource.
    ///
    /// A per-resource selection must name exactly the loaded resources, and a
    /// shared-secret schema's field must be declared by the resource.
    pub fn resolve(
        &self,
        resources: &ResourceMap,
    ) -> Result<BTreeMap<String, RequestSchema>, ConfigError> {
        let resolved: BTreeMap<String, RequestSchema> = match self {
            SchemaSelection::Shared(schema) => resources
                .identities()
                .map(|identity| (identity.to_string(), schema.clone()))
                .collect(),
            SchemaSelection::PerResource(map) => {
                let expected: BTreeSet<&str> = resources.identities().collect();
                let given: BTreeSet<&str> = map.keys().map(String::as_str).collect();
                let missing: Vec<String> = expected
                    .difference(&given)
                    .map(|key| key.to_string())
                    .collect();
                let extra: Vec<String> = given
                    .difference(&expected)
                    .map(|key| key.to_string())
                    .collect();
                if !missing.is_empty() || !extra.is_empty() {
                    return Err(ConfigError::SchemaKeysMismatch { missing, extra });
                }
                map.clone()
            }
        };

        for resource in resources {
            let Some(field) = resolved
                .get(&resource.file_prefix)
                .and_then(RequestSchema::secret_field)
            else {
                continue;
            };
            if resource.custom_field(field).is_none() {
                return Err(ConfigError::SchemaFieldMissing {
                    resource: resource.file_prefix.clone(),
                    field: field.to_string(),
                });
            }
        }

        Ok(resolved)
    }
}

/// Parses a cancellation form (`reservation_id`, `email`).
pub fn parse_cancel_form(form: &FormData) -> Result<CancelRequest, ReservationError> {
    let mut messages = Vec::new();

    let reservation_id = match field(form, "reservation_id").map(Uuid::parse_str) {
        Some(Ok(id)) => Some(id),
        Some(Err(_)) => {
            messages.push("Reservation code is not valid".to_string());
            None
        }
        None => {
            messages.push("Reservation code is required".to_string());
            None
        }
    };
    let email = field(form, "email");
    if email.is_none() {
        messages.push("Email is required".to_string());
    }

    match (reservation_id, email) {
        (Some(reservation_id), Some(email)) if messages.is_empty() => Ok(CancelRequest {
            reservation_id,
            email: email.to_string(),
        }),
        _ => Err(ReservationError::Validation { messages }),
    }
}

/// Returns true for checkbox values browsers and clients send when checked.
pub fn is_checked(form: &FormData, key: &str) -> bool {
    matches!(
        form.get(key).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("on" | "true" | "1" | "yes")
    )
}

fn field<'a>(form: &'a FormData, key: &str) -> Option<&'a str> {
    form.get(key)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}

fn validate_base(
    resource: &ResourceConfig,
    form: &FormData,
    now: NaiveDateTime,
    messages: &mut Vec<String>,
) -> Option<ReservationRequest> {
    let name = field(form, "name");
    if name.is_none() {
        messages.push("Name is required".to_string());
    }

    let email = field(form, "email");
    match email {
        Some(email) if is_valid_email(email) => {}
        Some(_) => messages.push("Email address is not valid".to_string()),
        None => messages.push("Email is required".to_string()),
    }

    let date = match field(form, "date") {
        Some(raw) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                messages.push("Date must be in YYYY-MM-DD format".to_string());
                None
            }
        },
        None => {
            messages.push("Date is required".to_string());
            None
        }
    };

    let slots = resource.time_slots();
    let mut slot_time = |key: &str, label: &str| match field(form, key) {
        Some(raw) => match parse_clock_time(raw) {
            Ok(time) if slots.contains(&time) => Some(time),
            _ => {
                messages.push(format!("{label} must be one of the available time slots"));
                None
            }
        },
        None => {
            messages.push(format!("{label} is required"));
            None
        }
    };
    let start_time = slot_time("start_time", "Start time");
    let end_time = slot_time("end_time", "End time");

    let end_next_day = is_checked(form, "end_next_day");
    if end_next_day && !resource.allow_end_next_day {
        messages.push("Reservations for this resource cannot end the next day".to_string());
    }
    let shareable = is_checked(form, "shareable");
    if shareable && !resource.allow_shareable {
        messages.push("This resource cannot be marked as shareable".to_string());
    }

    let mut custom_fields = BTreeMap::new();
    for custom in &resource.custom_form_fields {
        let value = if custom.kind.is_checkbox() {
            is_checked(form, &custom.name).then(|| "on".to_string())
        } else {
            field(form, &custom.name).map(str::to_string)
        };
        match value {
            Some(value) => {
                custom_fields.insert(custom.name.clone(), value);
            }
            None if custom.required => messages.push(format!("{} is required", custom.label)),
            None => {}
        }
    }

    let (date, start_time, end_time) = (date?, start_time?, end_time?);
    let start = date.and_time(start_time);
    let end_date = if end_next_day {
        date.succ_opt()?
    } else {
        date
    };
    let end = end_date.and_time(end_time);

    if start < now {
        messages.push("Reservations cannot start in the past".to_string());
    }
    if let (Some(days), Some(latest)) = (
        resource.maximum_days_ahead,
        resource.latest_bookable_date(now.date()),
    ) {
        if date > latest {
            messages.push(format!(
                "Reservations can be made at most {days} days ahead"
            ));
        }
    }

    if end <= start {
        messages.push("End time must be after start time".to_string());
    } else {
        let minutes = (end - start).num_minutes();
        if minutes > i64::from(resource.maximum_minutes) {
            messages.push(format!(
                "Reservations cannot be longer than {} minutes",
                resource.maximum_minutes
            ));
        }
        if minutes % i64::from(resource.minutes_increment) != 0 {
            messages.push(format!(
                "Reservation length must be a multiple of {} minutes",
                resource.minutes_increment
            ));
        }
    }

    Some(ReservationRequest {
        name: name?.to_string(),
        email: email?.to_string(),
        start,
        end,
        shareable,
        remind_me: is_checked(form, "remind_me"),
        custom_fields,
    })
}
