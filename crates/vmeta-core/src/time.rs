//! Time value parsing and conversion.
//!
//! Every representation found in source documents (second floats, frame indices,
//! `H:M:S.ffffff` timestamps, SMPTE `HH:MM:SS:FF`) ends up as milliseconds rounded to a
//! fixed number of decimals, so that boundaries coming from different units compare equal.

use chrono::{NaiveTime, Timelike};
use serde_json::{Map, Value};

use crate::error::ParseError;

const MS_PER_SECOND: f64 = 1000.0;
const SECONDS_PER_DAY: u32 = 86_400;

/// Rounds `value` to `precision` decimal digits.
#[must_use]
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10_f64.powi(i32::try_from(precision).unwrap_or(i32::MAX).min(15));
    (value * factor).round() / factor
}

/// Converts seconds to milliseconds.
#[must_use]
pub fn seconds_to_ms(seconds: f64) -> f64 {
    seconds * MS_PER_SECOND
}

/// Converts a frame index to milliseconds at the given frame rate.
#[must_use]
pub fn frames_to_ms(frames: f64, fps: f64) -> f64 {
    frames / fps * MS_PER_SECOND
}

/// Parses a timestamp string into milliseconds (unrounded).
///
/// Accepts an optional leading `T`, then either `H:M:S[.fraction]` or SMPTE
/// `HH:MM:SS:FF`. SMPTE needs a frame rate.
pub fn parse_timestamp(value: &str, frame_rate: Option<f64>) -> Result<f64, ParseError> {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix('T').unwrap_or(trimmed);

    match body.matches(':').count() {
        2 => {
            let time = NaiveTime::parse_from_str(body, "%H:%M:%S%.f")
                .map_err(|e| ParseError::timestamp(value, e.to_string()))?;
            let whole = f64::from(time.num_seconds_from_midnight()) * MS_PER_SECOND;
            Ok(whole + f64::from(time.nanosecond()) / 1_000_000.0)
        }
        3 => parse_smpte(value, body, frame_rate),
        _ => Err(ParseError::timestamp(value, "expected H:M:S or HH:MM:SS:FF")),
    }
}

fn parse_smpte(original: &str, body: &str, frame_rate: Option<f64>) -> Result<f64, ParseError> {
    let fps = frame_rate
        .filter(|fps| *fps > 0.0)
        .ok_or_else(|| ParseError::timestamp(original, "SMPTE timecode requires a frame rate"))?;

    let mut parts = [0_u32; 4];
    for (slot, part) in parts.iter_mut().zip(body.split(':')) {
        *slot = part
            .parse()
            .map_err(|_| ParseError::timestamp(original, format!("invalid field `{part}`")))?;
    }
    let [hours, minutes, seconds, frames] = parts;

    if minutes >= 60 || seconds >= 60 {
        return Err(ParseError::timestamp(original, "field out of range"));
    }
    if hours >= SECONDS_PER_DAY / 3600 {
        return Err(ParseError::timestamp(original, "timestamps longer than a day are unsupported"));
    }
    if f64::from(frames) >= fps {
        return Err(ParseError::timestamp(original, "frame number exceeds frame rate"));
    }
    let total = hours * 3600 + minutes * 60 + seconds;

    Ok(f64::from(total) * MS_PER_SECOND + frames_to_ms(f64::from(frames), fps))
}

/// Formats milliseconds as `THH:MM:SS.ffffff`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_timestamp(ms: f64) -> String {
    let micros = (ms.max(0.0) * 1000.0).round() as u64;
    let seconds = micros / 1_000_000;
    format!(
        "T{:02}:{:02}:{:02}.{:06}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60,
        micros % 1_000_000
    )
}

/// Resolves the `[start, end]` bounds of a document entry in milliseconds (unrounded).
///
/// Probed in order: `start_ms`/`end_ms`, `TS: [start, end]`, `start_frame`/`end_frame`,
/// then `start`/`end` as seconds or timestamp strings.
pub(crate) fn entry_bounds(
    entry: &Map<String, Value>,
    frame_rate: Option<f64>,
) -> Result<(f64, f64), ParseError> {
    if let (Some(start), Some(end)) = (number(entry, "start_ms"), number(entry, "end_ms")) {
        return Ok((start, end));
    }

    if let Some(ts) = entry.get("TS") {
        let pair = ts
            .as_array()
            .filter(|pair| pair.len() == 2)
            .ok_or_else(|| ParseError::timestamp(ts.to_string(), "`TS` must hold [start, end]"))?;
        return Ok((
            time_value(&pair[0], frame_rate)?,
            time_value(&pair[1], frame_rate)?,
        ));
    }

    if let (Some(start), Some(end)) = (number(entry, "start_frame"), number(entry, "end_frame")) {
        let fps = frame_rate
            .filter(|fps| *fps > 0.0)
            .ok_or_else(|| ParseError::missing("fps"))?;
        return Ok((frames_to_ms(start, fps), frames_to_ms(end, fps)));
    }

    let start = entry.get("start").ok_or_else(|| ParseError::missing("start"))?;
    let end = entry.get("end").ok_or_else(|| ParseError::missing("end"))?;
    Ok((time_value(start, frame_rate)?, time_value(end, frame_rate)?))
}

/// Interprets a number as seconds and a string as a timestamp.
fn time_value(value: &Value, frame_rate: Option<f64>) -> Result<f64, ParseError> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(seconds_to_ms)
            .ok_or_else(|| ParseError::timestamp(n.to_string(), "not a finite number")),
        Value::String(s) => parse_timestamp(s, frame_rate),
        other => Err(ParseError::timestamp(other.to_string(), "expected seconds or timestamp")),
    }
}

fn number(entry: &Map<String, Value>, key: &str) -> Option<f64> {
    entry.get(key).and_then(Value::as_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert!((round_to(1234.5678, 2) - 1234.57).abs() < f64::EPSILON);
        assert!((round_to(0.333_333, 2) - 0.33).abs() < f64::EPSILON);
    }

    #[test]
    fn parses_iso_like_timestamps() {
        assert!((parse_timestamp("T00:00:01.5", None).unwrap() - 1500.0).abs() < 1e-9);
        assert!((parse_timestamp("T01:02:03", None).unwrap() - 3_723_000.0).abs() < 1e-9);
        assert!((parse_timestamp("00:00:02.000250", None).unwrap() - 2000.25).abs() < 1e-9);
    }

    #[test]
    fn fraction_keeps_leading_zeros() {
        // .005 seconds is 5 ms, not 500 ms
        assert!((parse_timestamp("T00:00:00.005", None).unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn parses_smpte_with_frame_rate() {
        let ms = parse_timestamp("00:00:01:12", Some(24.0)).unwrap();
        assert!((ms - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn smpte_without_frame_rate_fails() {
        let err = parse_timestamp("00:00:01:12", None).unwrap_err();
        assert!(matches!(err, ParseError::MalformedTimestamp { .. }));
    }

    #[test]
    fn smpte_hours_out_of_range_fail() {
        for value in ["4294967295:00:00:00", "24:00:00:00"] {
            let err = parse_timestamp(value, Some(25.0)).unwrap_err();
            assert!(matches!(err, ParseError::MalformedTimestamp { .. }), "{value}");
        }
        assert!(parse_timestamp("23:59:59:24", Some(25.0)).is_ok());
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("soon", None).is_err());
        assert!(parse_timestamp("T25:00:00", None).is_err());
        assert!(parse_timestamp("00:00:01:30", Some(25.0)).is_err());
    }

    #[test]
    fn formats_timestamp() {
        assert_eq!(format_timestamp(3_723_500.0), "T01:02:03.500000");
        assert_eq!(format_timestamp(0.0), "T00:00:00.000000");
    }

    #[test]
    fn bounds_prefer_milliseconds() {
        let entry = obj(json!({"start_ms": 1500.0, "end_ms": 2500.0, "start": "T00:00:09"}));
        assert_eq!(entry_bounds(&entry, None).unwrap(), (1500.0, 2500.0));
    }

    #[test]
    fn bounds_from_ts_pair() {
        let entry = obj(json!({"TS": ["T00:00:01", "T00:00:02.25"]}));
        assert_eq!(entry_bounds(&entry, None).unwrap(), (1000.0, 2250.0));
    }

    #[test]
    fn bounds_from_frames_need_frame_rate() {
        let entry = obj(json!({"start_frame": 30, "end_frame": 90}));
        assert_eq!(
            entry_bounds(&entry, None).unwrap_err(),
            ParseError::missing("fps")
        );
        assert_eq!(entry_bounds(&entry, Some(30.0)).unwrap(), (1000.0, 3000.0));
    }

    #[test]
    fn bounds_from_seconds() {
        let entry = obj(json!({"start": 1.25, "end": 3}));
        assert_eq!(entry_bounds(&entry, None).unwrap(), (1250.0, 3000.0));
    }

    #[test]
    fn bounds_missing_fields() {
        let entry = obj(json!({"start": 1.0}));
        assert_eq!(
            entry_bounds(&entry, None).unwrap_err(),
            ParseError::missing("end")
        );
    }
}
