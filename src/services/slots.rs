use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use crate::models::service_duration::DEFAULT_DURATION_MINUTES;
use crate::models::{ServiceDuration, WorkingHour};

/// Expand the weekday schedule into concrete bookable start times for every
/// day in the inclusive window. Closed days emit nothing; open days step
/// from start_time by the service's duration + buffer (default duration plus
/// the day's own buffer when no service record applies), stop before the
/// appointment would run past end_time, and never exceed max_appointments.
///
/// Generated slots are theoretically open only; whether a slot is actually
/// free is decided against existing bookings at booking time.
pub fn generate_slots(
    schedule: &[WorkingHour],
    service: Option<&ServiceDuration>,
    start: NaiveDate,
    end: NaiveDate,
) -> anyhow::Result<Vec<(NaiveDate, NaiveTime)>> {
    let mut slots = vec![];

    let mut day = start;
    while day <= end {
        let day_of_week = day.weekday().num_days_from_sunday() as u8;
        let hours = schedule
            .iter()
            .find(|wh| wh.day_of_week == day_of_week)
            .cloned()
            .unwrap_or_else(|| WorkingHour::default_for_day(day_of_week));

        if hours.is_working_day {
            let duration = service
                .map(|sd| sd.duration_minutes)
                .unwrap_or(DEFAULT_DURATION_MINUTES);
            let buffer = service
                .map(|sd| sd.buffer_minutes)
                .unwrap_or(hours.buffer_minutes);
            let step = Duration::minutes((duration + buffer).max(1) as i64);

            let open = hours.start()?;
            let close = hours.end()?;

            let mut cursor = open;
            let mut count = 0;
            while count < hours.max_appointments {
                // overflowing_add_signed wraps at midnight; a nonzero wrap
                // means the appointment ran off the end of the day.
                let (finish, wrap) =
                    cursor.overflowing_add_signed(Duration::minutes(duration as i64));
                if wrap != 0 || finish > close {
                    break;
                }
                slots.push((day, cursor));
                count += 1;

                let (next, wrap) = cursor.overflowing_add_signed(step);
                if wrap != 0 || next <= cursor {
                    break;
                }
                cursor = next;
            }
        }

        day += Duration::days(1);
    }

    Ok(slots)
}
