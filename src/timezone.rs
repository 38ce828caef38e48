//! Timezone Resolver
//!
//! Maps the visitor's UTC offset to a timezone identifier the charting
//! engine accepts. Offsets are hours ahead of UTC and may be fractional
//! (5.5, 9.5, 12.75). An offset that is not in the table is an error; the
//! resolver never picks a neighbouring zone, since that would shift every
//! candle timestamp on the chart.

use chrono::Local;

use crate::error::{WidgetError, WidgetResult};

/// Offset (hours ahead of UTC) → engine timezone identifiers, first entry preferred.
///
/// Every row has at least one identifier.
const TIMEZONE_TABLE: &[(f64, &[&str])] = &[
    (-10.0, &["Pacific/Honolulu"]),
    (-8.0, &["America/Anchorage", "America/Juneau"]),
    (
        -7.0,
        &["America/Los_Angeles", "America/Phoenix", "America/Vancouver"],
    ),
    (-6.0, &["America/Mexico_City"]),
    (-5.0, &["America/Bogota", "America/Chicago", "America/Lima"]),
    (
        -4.0,
        &[
            "America/Caracas",
            "America/New_York",
            "America/Santiago",
            "America/Toronto",
        ],
    ),
    (
        -3.0,
        &["America/Argentina/Buenos_Aires", "America/Sao_Paulo"],
    ),
    (0.0, &["Atlantic/Reykjavik"]),
    (1.0, &["Africa/Casablanca", "Africa/Lagos", "Europe/London"]),
    (
        2.0,
        &[
            "Europe/Belgrade",
            "Europe/Berlin",
            "Europe/Bratislava",
            "Europe/Brussels",
            "Europe/Budapest",
            "Europe/Copenhagen",
            "Africa/Johannesburg",
            "Europe/Luxembourg",
            "Europe/Madrid",
            "Europe/Oslo",
            "Europe/Paris",
            "Europe/Rome",
            "Europe/Stockholm",
            "Europe/Warsaw",
            "Europe/Zurich",
        ],
    ),
    (
        3.0,
        &[
            "Asia/Bahrain",
            "Europe/Athens",
            "Europe/Bucharest",
            "Africa/Cairo",
            "Europe/Helsinki",
            "Europe/Istanbul",
            "Asia/Jerusalem",
            "Asia/Kuwait",
            "Europe/Moscow",
            "Asia/Nicosia",
            "Asia/Qatar",
            "Europe/Riga",
        ],
    ),
    (4.0, &["Asia/Dubai"]),
    (5.0, &["Asia/Karachi"]),
    (5.5, &["Asia/Kolkata"]),
    (6.0, &["Asia/Almaty"]),
    (6.5, &["Asia/Yangon"]),
    (7.0, &["Asia/Bangkok"]),
    (8.0, &["Asia/Chongqing"]),
    (9.0, &["Asia/Tokyo"]),
    (9.5, &["Australia/Adelaide"]),
    (10.0, &["Australia/Brisbane"]),
    (11.0, &["Pacific/Norfolk"]),
    (12.75, &["Pacific/Chatham"]),
];

/// Resolve an offset in hours ahead of UTC to the preferred identifier.
///
/// Keys match exactly; `5.49` does not resolve to the `5.5` row.
pub fn resolve(offset_hours: f64) -> WidgetResult<&'static str> {
    identifiers(offset_hours)
        .and_then(|ids| ids.first().copied())
        .ok_or(WidgetError::UnsupportedOffset(offset_hours))
}

/// All identifiers listed for an offset, in preference order
pub fn identifiers(offset_hours: f64) -> Option<&'static [&'static str]> {
    TIMEZONE_TABLE
        .iter()
        .find(|(key, _)| *key == offset_hours)
        .map(|(_, ids)| *ids)
}

/// Offsets present in the table, ascending
pub fn supported_offsets() -> impl Iterator<Item = f64> {
    TIMEZONE_TABLE.iter().map(|(key, _)| *key)
}

/// Convert the host's "minutes behind UTC" into hours ahead of UTC.
///
/// Browsers report UTC+2 as `-120`; this returns `2.0` for it.
pub fn offset_hours_from_host(minutes_behind_utc: i32) -> f64 {
    -f64::from(minutes_behind_utc) / 60.0
}

/// The local clock's current offset in hours ahead of UTC
pub fn local_offset_hours() -> f64 {
    let seconds_ahead = Local::now().offset().local_minus_utc();
    f64::from(seconds_ahead) / 3600.0
}

/// Resolve the local clock's timezone
pub fn resolve_local() -> WidgetResult<&'static str> {
    resolve(local_offset_hours())
}
