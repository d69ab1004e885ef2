use crate::aggregate::summarize;
use crate::constants::MAX_SERIES_BUCKETS;
use crate::error::{Result, TallyError};
use crate::store::PricedEvent;
use crate::types::Summary;
use chrono::{DateTime, Duration, Local, Timelike, Utc};

/// One half-open interval `[start, end)` of a time series and the
/// summary of events inside it. Zero-event buckets carry an empty
/// summary so the sequence stays uniformly spaced.
#[derive(Debug, Clone)]
pub struct TimeBucket {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: Summary,
}

/// Floor timestamp to the hour (e.g., 14:37:22 → 14:00:00)
pub fn floor_to_hour(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .with_minute(0)
        .unwrap()
        .with_second(0)
        .unwrap()
        .with_nanosecond(0)
        .unwrap()
}

/// Floor timestamp to the start of its local calendar day, in UTC.
pub fn floor_to_local_day(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    timestamp
        .with_timezone(&Local)
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_local_timezone(Local)
        .unwrap()
        .with_timezone(&Utc)
}

/// Bucket events into fixed-width windows across `[start, end)`.
///
/// Buckets are emitted in index order, contiguous and gap-free; events
/// outside the range are excluded. Rejects the request before any work
/// when the range is inverted, the width non-positive, or the bucket
/// count exceeds `MAX_SERIES_BUCKETS`.
pub fn build_series<'a, I>(
    events: I,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    width: Duration,
) -> Result<Vec<TimeBucket>>
where
    I: IntoIterator<Item = &'a PricedEvent>,
{
    if end <= start {
        return Err(TallyError::InvalidRange {
            message: format!("range end {} is not after start {}", end, start),
        });
    }
    let width_ms = width.num_milliseconds();
    if width_ms <= 0 {
        return Err(TallyError::InvalidRange {
            message: "bucket width must be positive".to_string(),
        });
    }
    let span_ms = (end - start).num_milliseconds();
    let bucket_count = span_ms.div_ceil(width_ms) as usize;
    if bucket_count > MAX_SERIES_BUCKETS {
        return Err(TallyError::InvalidRange {
            message: format!(
                "{} buckets requested, maximum is {}",
                bucket_count, MAX_SERIES_BUCKETS
            ),
        });
    }

    let mut assigned: Vec<Vec<&PricedEvent>> = vec![Vec::new(); bucket_count];
    for priced in events {
        let timestamp = priced.event.timestamp;
        if timestamp < start || timestamp >= end {
            continue;
        }
        let index = ((timestamp - start).num_milliseconds() / width_ms) as usize;
        assigned[index].push(priced);
    }

    Ok(assigned
        .into_iter()
        .enumerate()
        .map(|(index, bucket)| {
            let bucket_start = start + width * index as i32;
            TimeBucket {
                start: bucket_start,
                end: bucket_start + width,
                summary: summarize(bucket),
            }
        })
        .collect())
}

/// Hour-aligned buckets covering the last `hours` hours, the current
/// partial hour included. The live view's "past 12 hours" is this with
/// `hours = 12`.
pub fn hourly_series<'a, I>(
    events: I,
    now: DateTime<Utc>,
    hours: i64,
) -> Result<Vec<TimeBucket>>
where
    I: IntoIterator<Item = &'a PricedEvent>,
{
    let end = floor_to_hour(now) + Duration::hours(1);
    let start = end - Duration::hours(hours);
    build_series(events, start, end, Duration::hours(1))
}

/// Local-midnight-aligned day buckets covering the last `days` days,
/// today included.
pub fn daily_series<'a, I>(events: I, now: DateTime<Utc>, days: i64) -> Result<Vec<TimeBucket>>
where
    I: IntoIterator<Item = &'a PricedEvent>,
{
    let end = floor_to_local_day(now) + Duration::days(1);
    let start = end - Duration::days(days);
    build_series(events, start, end, Duration::days(1))
}
