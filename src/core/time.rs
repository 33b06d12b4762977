//! Shared timestamp helpers for submission stamps and the daily merge gate.

use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime};
use ulid::Ulid;

/// Returns the current UTC time as `YYYY-MM-DD HH:MM:SS`.
///
/// This is the stamp format stored in `submitted_on` columns and in the
/// aggregator's last-merged flag.
pub fn now_stamp() -> String {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::now_utc().format(&format).unwrap_or_default()
}

/// Today's UTC calendar date.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Parses the date portion of a `YYYY-MM-DD HH:MM:SS` stamp. `None` for
/// stamps that do not round-trip through [`now_stamp`]'s format.
pub fn date_of_stamp(stamp: &str) -> Option<Date> {
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    PrimitiveDateTime::parse(stamp.trim(), &format)
        .ok()
        .map(|dt| dt.date())
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_now_stamp_round_trips() {
        let stamp = now_stamp();
        assert!(date_of_stamp(&stamp).is_some(), "bad stamp: {stamp}");
    }

    #[test]
    fn test_now_stamp_matches_today() {
        assert_eq!(date_of_stamp(&now_stamp()), Some(today()));
    }

    #[test]
    fn test_date_of_stamp_rejects_garbage() {
        assert_eq!(date_of_stamp("not a stamp"), None);
        assert_eq!(date_of_stamp("2026-13-40 99:99:99"), None);
        assert_eq!(date_of_stamp(""), None);
    }

    #[test]
    fn test_date_of_stamp_parses_known_value() {
        let date = date_of_stamp("2026-08-05 14:02:33").expect("valid stamp");
        assert_eq!(date.to_string(), "2026-08-05");
    }

    #[test]
    fn test_new_event_id_is_unique() {
        let id1 = new_event_id();
        let id2 = new_event_id();
        assert_ne!(id1, id2);
    }
}
