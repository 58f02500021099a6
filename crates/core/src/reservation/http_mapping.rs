//! Pure mapping of reservation errors to HTTP status codes.

use super::ReservationError;

/// Maps a [`ReservationError`] to an HTTP status code.
///
/// - `Validation` -> 422 (Unprocessable Entity)
/// - `Conflict` -> 409 (Conflict)
/// - `NotFound` -> 404 (Not Found)
pub fn reservation_error_to_status_code(error: &ReservationError) -> u16 {
    match error {
        ReservationError::Validation { .. } => 422,
        ReservationError::Conflict { .. } => 409,
        ReservationError::NotFound => 404,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_validation_maps_to_422() {
        let error = ReservationError::validation("Name is required");
        assert_eq!(reservation_error_to_status_code(&error), 422);
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let at = NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let error = ReservationError::Conflict {
            resource: "courts".to_string(),
            start: at,
            end: at,
        };
        assert_eq!(reservation_error_to_status_code(&error), 409);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(
            reservation_error_to_status_code(&ReservationError::NotFound),
            404
        );
    }
}
