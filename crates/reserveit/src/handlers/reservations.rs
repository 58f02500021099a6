use askama::Template;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
    Form,
};
use chrono::{Local, NaiveDateTime};

use reserveit_core::calendar::{BusyInterval, CalendarError, CalendarService};
use reserveit_core::reservation::{
    parse_cancel_form, FormData, Reservation, ReservationCandidate, ReservationError,
};
use reserveit_core::resource::ResourceConfig;

use super::{AppError, HtmlTemplate, MessageTemplate};
use crate::state::ResourceState;

/// Confirmation fragment returned after a successful reservation.
#[derive(Template)]
#[template(path = "confirmation.html")]
struct ConfirmationTemplate {
    name: String,
    resource_name: String,
    calendar: String,
    date: String,
    start: String,
    end: String,
    code: String,
    sync_pending: bool,
}

impl ConfirmationTemplate {
    fn new(resource: &ResourceConfig, reservation: &Reservation, synced: bool) -> Self {
        Self {
            name: reservation.name.clone(),
            resource_name: resource.resource_name.clone(),
            calendar: reservation.calendar.clone(),
            date: reservation.start.format("%A, %B %-d, %Y").to_string(),
            start: reservation.start.format("%I:%M %p").to_string(),
            end: reservation.end.format("%I:%M %p").to_string(),
            code: reservation.id.to_string(),
            sync_pending: !synced,
        }
    }
}

/// Busy intervals of every calendar of `resource` overlapping `[start, end)`.
async fn busy_intervals(
    calendar: &dyn CalendarService,
    resource: &ResourceConfig,
    start: NaiveDateTime,
    end: NaiveDateTime,
) -> Result<Vec<BusyInterval>, CalendarError> {
    let mut busy = Vec::new();
    for info in resource.calendars.values() {
        busy.extend(calendar.busy_intervals(&info.id, start, end).await?);
    }
    Ok(busy)
}

/// Submit a reservation (POST `<prefix>/reserve`).
///
/// The availability check and insert are atomic in the resource's store.
/// The calendar event is written after the local commit.
pub async fn reserve(
    State(state): State<ResourceState>,
    Form(form): Form<FormData>,
) -> Result<Response, AppError> {
    let bundle = &state.bundle;
    let resource = &bundle.resource;

    let request = bundle
        .schema
        .validate(resource, &form, Local::now().naive_local())?;
    let busy = busy_intervals(state.calendar.as_ref(), resource, request.start, request.end).await?;
    let candidate = ReservationCandidate::new(resource, request, &busy);

    let Some(reservation) = bundle.store.insert_if_available(&candidate).await? else {
        tracing::info!(
            resource = %bundle.identity(),
            start = %candidate.start(),
            end = %candidate.end(),
            "No calendar free for requested time"
        );
        return Err(ReservationError::Conflict {
            resource: resource.resource_name.clone(),
            start: candidate.start(),
            end: candidate.end(),
        }
        .into());
    };

    tracing::info!(
        resource = %bundle.identity(),
        reservation_id = %reservation.id,
        calendar = %reservation.calendar,
        "Created reservation"
    );

    let synced = bundle
        .sync_reservation(state.calendar.as_ref(), &state.app.timezone, &reservation)
        .await;

    Ok(HtmlTemplate(ConfirmationTemplate::new(resource, &reservation, synced)).into_response())
}

/// Cancel a reservation (POST `<prefix>/cancel`).
///
/// Requires the reservation code and the email it was booked with. The
/// calendar event is removed before the local record.
pub async fn cancel(
    State(state): State<ResourceState>,
    Form(form): Form<FormData>,
) -> Result<Response, AppError> {
    let bundle = &state.bundle;
    let request = parse_cancel_form(&form)?;

    let reservation = bundle
        .store
        .get_reservation(request.reservation_id)
        .await?
        .filter(|reservation| reservation.booked_by(&request.email))
        .ok_or(ReservationError::NotFound)?;

    if let Some(event_id) = &reservation.event_id {
        if let Some(info) = bundle.resource.calendars.get(&reservation.calendar) {
            match state.calendar.delete_event(&info.id, event_id).await {
                Ok(()) => {}
                Err(CalendarError::EventNotFound { .. }) => {
                    tracing::warn!(
                        resource = %bundle.identity(),
                        reservation_id = %reservation.id,
                        event_id = %event_id,
                        "Calendar event already gone"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    bundle.store.delete_reservation(reservation.id).await?;
    tracing::info!(
        resource = %bundle.identity(),
        reservation_id = %reservation.id,
        "Cancelled reservation"
    );

    let when = format!(
        "{} from {} to {}",
        reservation.start.format("%A, %B %-d, %Y"),
        reservation.start.format("%I:%M %p"),
        reservation.end.format("%I:%M %p")
    );
    Ok(HtmlTemplate(MessageTemplate::success(
        "Reservation cancelled",
        vec![format!("{} on {when} is cancelled.", bundle.resource.resource_name)],
    ))
    .into_response())
}
