use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;

use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::checks::{is_hex_color, is_identifier, is_route_prefix};
use super::error::{ConfigError, Result};
use super::slots::{format_time_slots, time_slots};
use super::time::{parse_clock_time, serialize_clock_time};
use super::types::{CalendarInfo, CustomFormField, ImageFile};

/// Above this many calendars the combined calendar view is never shown.
pub const MAX_CALENDARS_SHOWN: usize = 4;

/// Form keys used by the base reservation form.
pub const RESERVED_FIELD_NAMES: [&str; 8] = [
    "name",
    "email",
    "date",
    "start_time",
    "end_time",
    "end_next_day",
    "shareable",
    "remind_me",
];

/// Unvalidated resource document, as written by the operator.
///
/// Integers are signed so that zero and negative values can be reported
/// instead of failing as a type mismatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceConfigSpec {
    pub file_prefix: String,
    #[serde(default)]
    pub route_prefix: Option<String>,
    pub resource_name: String,
    #[serde(default)]
    pub calendars: BTreeMap<String, CalendarInfo>,
    #[serde(default = "default_day_start")]
    pub day_start_time: String,
    #[serde(default = "default_day_end")]
    pub day_end_time: String,
    #[serde(default = "default_minutes_increment")]
    pub minutes_increment: i64,
    #[serde(default = "default_maximum_minutes")]
    pub maximum_minutes: i64,
    #[serde(default = "default_maximum_days_ahead")]
    pub maximum_days_ahead: Option<i64>,
    #[serde(default = "default_minutes_before_reminder")]
    pub minutes_before_reminder: i64,
    #[serde(default)]
    pub allow_end_next_day: bool,
    #[serde(default)]
    pub allow_shareable: bool,
    #[serde(default)]
    pub emoji: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub custom_form_fields: Vec<CustomFormField>,
    #[serde(default = "default_calendar_shown")]
    pub calendar_shown: bool,
    #[serde(default)]
    pub image: Option<ImageFile>,
}

fn default_day_start() -> String {
    "12:00 AM".to_string()
}

fn default_day_end() -> String {
    "11:59 PM".to_string()
}

fn default_minutes_increment() -> i64 {
    30
}

fn default_maximum_minutes() -> i64 {
    120
}

fn default_maximum_days_ahead() -> Option<i64> {
    Some(14)
}

fn default_minutes_before_reminder() -> i64 {
    60
}

fn default_calendar_shown() -> bool {
    true
}

impl ResourceConfigSpec {
    /// Creates a document with every optional key at its default.
    pub fn new(file_prefix: impl Into<String>, resource_name: impl Into<String>) -> Self {
        Self {
            file_prefix: file_prefix.into(),
            route_prefix: None,
            resource_name: resource_name.into(),
            calendars: BTreeMap::new(),
            day_start_time: default_day_start(),
            day_end_time: default_day_end(),
            minutes_increment: default_minutes_increment(),
            maximum_minutes: default_maximum_minutes(),
            maximum_days_ahead: default_maximum_days_ahead(),
            minutes_before_reminder: default_minutes_before_reminder(),
            allow_end_next_day: false,
            allow_shareable: false,
            emoji: String::new(),
            description: String::new(),
            custom_form_fields: Vec::new(),
            calendar_shown: default_calendar_shown(),
            image: None,
        }
    }

    pub fn with_calendar(mut self, short_name: impl Into<String>, info: CalendarInfo) -> Self {
        self.calendars.insert(short_name.into(), info);
        self
    }

    pub fn with_day(mut self, start: impl Into<String>, end: impl Into<String>) -> Self {
        self.day_start_time = start.into();
        self.day_end_time = end.into();
        self
    }

    pub fn with_custom_field(mut self, field: CustomFormField) -> Self {
        self.custom_form_fields.push(field);
        self
    }
}

/// A validated, immutable resource definition.
///
/// Only obtainable through [`TryFrom<ResourceConfigSpec>`], so every instance
/// satisfies the resource invariants.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "ResourceConfigSpec")]
pub struct ResourceConfig {
    pub file_prefix: String,
    pub route_prefix: String,
    pub resource_name: String,
    pub calendars: BTreeMap<String, CalendarInfo>,
    #[serde(serialize_with = "serialize_clock_time")]
    pub day_start_time: NaiveTime,
    #[serde(serialize_with = "serialize_clock_time")]
    pub day_end_time: NaiveTime,
    pub minutes_increment: u32,
    pub maximum_minutes: u32,
    pub maximum_days_ahead: Option<u32>,
    pub minutes_before_reminder: u32,
    pub allow_end_next_day: bool,
    pub allow_shareable: bool,
    pub emoji: String,
    pub description: String,
    pub custom_form_fields: Vec<CustomFormField>,
    pub calendar_shown: bool,
    pub image: Option<ImageFile>,
    #[serde(skip)]
    calendar_labels: OnceLock<BTreeMap<String, String>>,
}

impl TryFrom<ResourceConfigSpec> for ResourceConfig {
    type Error = ConfigError;

    fn try_from(spec: ResourceConfigSpec) -> Result<Self> {
        if spec.file_prefix.is_empty() {
            return Err(ConfigError::EmptyFilePrefix);
        }
        if !is_identifier(&spec.file_prefix) {
            return Err(ConfigError::InvalidFilePrefix(spec.file_prefix));
        }
        if spec.resource_name.trim().is_empty() {
            return Err(ConfigError::EmptyResourceName);
        }

        let route_prefix = spec
            .route_prefix
            .unwrap_or_else(|| format!("/{}", spec.file_prefix));
        if !is_route_prefix(&route_prefix) {
            return Err(ConfigError::InvalidRoutePrefix(route_prefix));
        }

        validate_calendars(&spec.calendars)?;

        let day_start_time = parse_clock_time(&spec.day_start_time)?;
        let day_end_time = parse_clock_time(&spec.day_end_time)?;
        if day_start_time >= day_end_time {
            return Err(ConfigError::InvalidDayWindow);
        }

        let minutes_increment = positive("minutes_increment", spec.minutes_increment)?;
        let maximum_minutes = positive("maximum_minutes", spec.maximum_minutes)?;
        if maximum_minutes % minutes_increment != 0 {
            return Err(ConfigError::MaximumNotMultiple {
                maximum: maximum_minutes,
                increment: minutes_increment,
            });
        }
        let maximum_days_ahead = spec
            .maximum_days_ahead
            .map(|days| positive("maximum_days_ahead", days))
            .transpose()?;
        let minutes_before_reminder =
            positive("minutes_before_reminder", spec.minutes_before_reminder)?;

        validate_custom_fields(&spec.custom_form_fields)?;

        Ok(Self {
            file_prefix: spec.file_prefix,
            route_prefix,
            resource_name: spec.resource_name,
            calendars: spec.calendars,
            day_start_time,
            day_end_time,
            minutes_increment,
            maximum_minutes,
            maximum_days_ahead,
            minutes_before_reminder,
            allow_end_next_day: spec.allow_end_next_day,
            allow_shareable: spec.allow_shareable,
            emoji: spec.emoji,
            description: spec.description,
            custom_form_fields: spec.custom_form_fields,
            calendar_shown: spec.calendar_shown,
            image: spec.image,
            calendar_labels: OnceLock::new(),
        })
    }
}

impl ResourceConfig {
    /// Reverse mapping of calendar id to calendar short-name.
    pub fn calendar_ids(&self) -> &BTreeMap<String, String> {
        self.calendar_labels.get_or_init(|| {
            self.calendars
                .iter()
                .map(|(label, info)| (info.id.clone(), label.clone()))
                .collect()
        })
    }

    /// Short-name of the calendar with the given id.
    pub fn calendar_label(&self, calendar_id: &str) -> Option<&str> {
        self.calendar_ids().get(calendar_id).map(String::as_str)
    }

    /// Whether the combined calendar view is rendered on the form page.
    pub fn calendar_shown_final(&self) -> bool {
        self.calendar_shown && self.calendars.len() <= MAX_CALENDARS_SHOWN
    }

    /// Last date a reservation may start on, counted from `today`.
    ///
    /// `None` when there is no limit or the limit lies past the last
    /// representable date.
    pub fn latest_bookable_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        self.maximum_days_ahead
            .and_then(|days| today.checked_add_days(Days::new(u64::from(days))))
    }

    /// Selectable reservation start times for a day.
    pub fn time_slots(&self) -> Vec<NaiveTime> {
        time_slots(
            self.day_start_time,
            self.day_end_time,
            self.minutes_increment,
        )
    }

    /// Selectable start times formatted as `hh:mm AM/PM`.
    pub fn formatted_time_slots(&self) -> Vec<String> {
        format_time_slots(&self.time_slots())
    }

    /// The custom field with the given name.
    pub fn custom_field(&self, name: &str) -> Option<&CustomFormField> {
        self.custom_form_fields
            .iter()
            .find(|field| field.name == name)
    }

    /// Short display title: name followed by emoji, when one is set.
    pub fn display_title(&self) -> String {
        if self.emoji.is_empty() {
            self.resource_name.clone()
        } else {
            format!("{} {}", self.resource_name, self.emoji)
        }
    }
}

fn positive(field: &'static str, value: i64) -> Result<u32> {
    match u32::try_from(value) {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::NotPositive { field, value }),
    }
}

fn validate_calendars(calendars: &BTreeMap<String, CalendarInfo>) -> Result<()> {
    if calendars.is_empty() {
        return Err(ConfigError::NoCalendars);
    }

    let mut seen = HashSet::new();
    for (name, info) in calendars {
        if info.id.trim().is_empty() {
            return Err(ConfigError::EmptyCalendarId { name: name.clone() });
        }
        if let Some(color) = &info.color {
            if !is_hex_color(color) {
                return Err(ConfigError::InvalidColor {
                    name: name.clone(),
                    color: color.clone(),
                });
            }
        }
        if !seen.insert(info.id.as_str()) {
            return Err(ConfigError::DuplicateCalendarId(info.id.clone()));
        }
    }
    Ok(())
}

fn validate_custom_fields(fields: &[CustomFormField]) -> Result<()> {
    let mut seen = HashSet::new();
    for field in fields {
        if field.name.trim().is_empty() {
            return Err(ConfigError::EmptyFieldName);
        }
        if RESERVED_FIELD_NAMES.contains(&field.name.as_str()) {
            return Err(ConfigError::ReservedFieldName(field.name.clone()));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(ConfigError::DuplicateFieldName(field.name.clone()));
        }
    }
    Ok(())
}
