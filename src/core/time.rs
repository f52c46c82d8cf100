use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};

/// Source of "now" for everything that compares against attempt deadlines.
///
/// All timestamps are UTC wall-clock values without an offset, matching the
/// `TIMESTAMP` columns they are persisted into.
pub(crate) trait Clock: Send + Sync {
    fn now(&self) -> PrimitiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub(crate) struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> PrimitiveDateTime {
        primitive_now_utc()
    }
}

pub(crate) fn primitive_now_utc() -> PrimitiveDateTime {
    let now = OffsetDateTime::now_utc();
    PrimitiveDateTime::new(now.date(), now.time())
}

pub(crate) fn format_primitive(value: PrimitiveDateTime) -> String {
    value.assume_utc().format(&Rfc3339).unwrap_or_else(|_| value.assume_utc().to_string())
}

/// Whole seconds from `now` until `deadline`; negative once the deadline has passed.
pub(crate) fn seconds_until(now: PrimitiveDateTime, deadline: PrimitiveDateTime) -> i64 {
    (deadline.assume_utc() - now.assume_utc()).whole_seconds()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{Date, Duration, Time};

    #[test]
    fn format_primitive_outputs_utc_z() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let time = Time::from_hms(10, 20, 30).unwrap();
        let value = PrimitiveDateTime::new(date, time);
        assert_eq!(format_primitive(value), "2025-01-02T10:20:30Z");
    }

    #[test]
    fn seconds_until_truncates_partial_seconds() {
        let date = Date::from_calendar_date(2025, time::Month::January, 2).unwrap();
        let now = PrimitiveDateTime::new(date, Time::from_hms(10, 0, 0).unwrap());

        assert_eq!(seconds_until(now, now + Duration::milliseconds(2500)), 2);
        assert_eq!(seconds_until(now, now + Duration::milliseconds(500)), 0);
        assert_eq!(seconds_until(now, now - Duration::seconds(3)), -3);
    }
}
