/// Number and label formatting shared by the chart renderers.
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Bucket size of an energy series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Hour,
    Day,
    Month,
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Month => "month",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Abbreviate a number with `K` / `M` suffixes.
///
/// Below 1000 the number is printed as-is; otherwise it is scaled to one
/// decimal and a trailing `.0` is dropped (`1500 -> "1.5K"`,
/// `2000000 -> "2M"`).
pub fn format_abbr(n: f64) -> String {
    let abs = n.abs();
    if abs >= 1_000_000.0 {
        format!("{}M", one_decimal(n / 1_000_000.0))
    } else if abs >= 1_000.0 {
        format!("{}K", one_decimal(n / 1_000.0))
    } else {
        plain_number(n)
    }
}

/// Print a number the way a JavaScript `String(n)` would for dashboard
/// values: integers without a fractional part, other values in shortest form.
pub fn plain_number(n: f64) -> String {
    if !n.is_finite() {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        // Avoid "-0".
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

fn one_decimal(v: f64) -> String {
    let s = format!("{v:.1}");
    match s.strip_suffix(".0") {
        Some(stripped) => stripped.to_string(),
        None => s,
    }
}

/// Round a raw gridline increment up to `{1, 2, 5, 10} x 10^k`.
///
/// Non-positive or non-finite input yields `1`.
pub fn nice_step(raw: f64) -> f64 {
    if !(raw.is_finite() && raw > 0.0) {
        return 1.0;
    }
    let pow10 = 10f64.powi(raw.log10().floor() as i32);
    let norm = raw / pow10;
    let step = if norm <= 1.0 {
        1.0
    } else if norm <= 2.0 {
        2.0
    } else if norm <= 5.0 {
        5.0
    } else {
        10.0
    };
    step * pow10
}

/// Truncate a label to `max_chars` characters, ending it with `…`.
///
/// Labels that fit are returned unchanged; longer labels keep
/// `max_chars - 3` characters.
pub fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        return label.to_string();
    }
    let keep = max_chars.saturating_sub(3);
    let mut out: String = label.chars().take(keep).collect();
    out.push('…');
    out
}

/// Keep at most `max_chars` characters of a string.
pub fn clip_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Compact x-axis label for a series bucket start.
///
/// Accepts RFC 3339 timestamps, naive ISO date-times, and plain dates.
/// Unparseable input yields an empty label.
pub fn format_period_label(iso: &str, period: Period) -> String {
    let Some(dt) = parse_timestamp(iso) else {
        return String::new();
    };
    match period {
        Period::Hour => format!("{:02}", dt.hour()),
        Period::Day => format!("{} {:02}", MONTHS[dt.month0() as usize], dt.day()),
        Period::Month => format!("{} {:02}", MONTHS[dt.month0() as usize], dt.year() % 100),
    }
}

fn parse_timestamp(iso: &str) -> Option<NaiveDateTime> {
    let iso = iso.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(iso) {
        return Some(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(iso, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(iso, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
