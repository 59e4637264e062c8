use std::fmt::Display;

use chrono::{DateTime, Datelike, Local, Offset, TimeZone, Timelike};

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Expands a strftime-style pattern against one instant. Directives the
/// table does not recognize are emitted as literal text.
pub fn strftime<Tz: TimeZone>(pattern: &str, t: &DateTime<Tz>) -> String
where
    Tz::Offset: Display,
{
    let mut out = String::with_capacity(pattern.len() * 2);
    let mut chars = pattern.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some(directive) => expand(directive, t, &mut out),
            // A trailing lone percent is literal text.
            None => out.push('%'),
        }
    }

    out
}

/// Formats with the current local time when the instant is absent. Display
/// paths always produce a rendered string, never an error.
pub fn strftime_or_now(pattern: &str, instant: Option<DateTime<Local>>) -> String {
    match instant {
        Some(t) => strftime(pattern, &t),
        None => strftime(pattern, &Local::now()),
    }
}

fn expand<Tz: TimeZone>(directive: char, t: &DateTime<Tz>, out: &mut String)
where
    Tz::Offset: Display,
{
    match directive {
        'a' => out.push_str(&weekday_name(t)[..3]),
        'A' => out.push_str(weekday_name(t)),
        'b' => out.push_str(&month_name(t)[..3]),
        'B' => out.push_str(month_name(t)),
        'c' => out.push_str(&strftime("%a %b %e %H:%M:%S %Y", t)),
        'C' => push_int(out, i64::from(t.year().div_euclid(100))),
        'd' => push_padded(out, i64::from(t.day()), 2),
        'e' => push_int(out, i64::from(t.day())),
        'F' => out.push_str(&strftime("%Y-%m-%d", t)),
        'G' => push_int(out, i64::from(t.iso_week().year())),
        'g' => push_padded(out, i64::from(t.iso_week().year().rem_euclid(100)), 2),
        'H' => push_padded(out, i64::from(t.hour()), 2),
        'I' => push_padded(out, i64::from(t.hour12().1), 2),
        'j' => push_padded(out, i64::from(t.ordinal()), 3),
        'k' => push_int(out, i64::from(t.hour())),
        'l' => push_int(out, i64::from(t.hour12().1)),
        'm' => push_padded(out, i64::from(t.month()), 2),
        'n' => push_int(out, i64::from(t.month())),
        'M' => push_padded(out, i64::from(t.minute()), 2),
        'p' => out.push_str(if t.hour12().0 { "PM" } else { "AM" }),
        'P' => out.push_str(if t.hour12().0 { "pm" } else { "am" }),
        's' => push_int(out, t.timestamp()),
        'S' => push_padded(out, i64::from(t.second()), 2),
        'u' => push_int(out, i64::from(t.weekday().number_from_monday())),
        'V' => push_padded(out, i64::from(t.iso_week().week()), 2),
        'w' => push_int(out, i64::from(t.weekday().num_days_from_sunday())),
        'x' => out.push_str(&strftime("%m/%d/%y", t)),
        'X' => out.push_str(&strftime("%H:%M:%S", t)),
        'y' => push_padded(out, i64::from(t.year().rem_euclid(100)), 2),
        'Y' => push_int(out, i64::from(t.year())),
        'z' => push_utc_offset(out, t),
        'Z' => out.push_str(&t.offset().to_string()),
        other => {
            out.push('%');
            out.push(other);
        }
    }
}

fn weekday_name<Tz: TimeZone>(t: &DateTime<Tz>) -> &'static str {
    DAY_NAMES[t.weekday().num_days_from_sunday() as usize]
}

fn month_name<Tz: TimeZone>(t: &DateTime<Tz>) -> &'static str {
    MONTH_NAMES[t.month0() as usize]
}

fn push_int(out: &mut String, value: i64) {
    out.push_str(&value.to_string());
}

fn push_padded(out: &mut String, value: i64, width: usize) {
    out.push_str(&format!("{value:0width$}"));
}

fn push_utc_offset<Tz: TimeZone>(out: &mut String, t: &DateTime<Tz>) {
    let offset_secs = t.offset().fix().local_minus_utc();
    let sign = if offset_secs < 0 { '-' } else { '+' };
    let abs = offset_secs.abs();
    out.push(sign);
    push_padded(out, i64::from(abs / 3600), 2);
    push_padded(out, i64::from((abs % 3600) / 60), 2);
}
