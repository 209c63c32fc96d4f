//! Free-text normalization: turns what the customer typed into canonical
//! catalog values, or rejects it. All functions here are pure; invalid input
//! is an ordinary `None`/`Err`, never a panic.

use chrono::{Datelike, Months, NaiveDate, Weekday};

use crate::catalog::{Service, ALLOWED_SLOTS, SERVICES};

/// Lowercases, strips Portuguese diacritics and collapses runs of
/// whitespace to a single space.
fn fold_text(input: &str) -> String {
    let lowered = input.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut pending_space = false;
    for ch in lowered.chars() {
        let ch = match ch {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            other => other,
        };
        if ch.is_whitespace() {
            pending_space = !out.is_empty();
        } else {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.push(ch);
        }
    }
    out
}

/// "corte + barba" / "corte & barba" / "corte e barba", spacing optional.
fn is_combo(folded: &str) -> bool {
    let Some(rest) = folded.strip_prefix("corte") else {
        return false;
    };
    let mut chars = rest.trim_start().chars();
    match chars.next() {
        Some('+') | Some('&') | Some('e') => {}
        _ => return false,
    }
    chars.as_str().trim_start() == "barba"
}

/// Maps free text onto one of the three catalog services,
/// case/diacritic-insensitively. Anything else is rejected.
pub fn normalize_service(input: &str) -> Option<&'static Service> {
    let folded = fold_text(input);
    let name = match folded.as_str() {
        "corte" => "Corte",
        "barba" => "Barba",
        _ if is_combo(&folded) => "Corte + Barba",
        _ => return None,
    };
    SERVICES.iter().find(|s| s.name == name)
}

fn is_digits(s: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_digit())
}

/// Accepts `D/M/Y` or `D-M-Y` with 1-2 digit day/month and a 2 or 4 digit
/// year and returns the canonical `DD/MM/YYYY` form. Two-digit years get a
/// "20" prefix. Purely syntactic: 31/02 passes here and fails the calendar
/// check below.
pub fn normalize_date(input: &str) -> Option<String> {
    let cleaned = input.trim().replace('-', "/");
    let mut parts = cleaned.split('/');
    let day = parts.next()?;
    let month = parts.next()?;
    let year = parts.next()?;
    if parts.next().is_some() {
        return None;
    }
    if !is_digits(day, 1, 2) || !is_digits(month, 1, 2) {
        return None;
    }
    if !is_digits(year, 2, 2) && !is_digits(year, 4, 4) {
        return None;
    }
    let year = if year.len() == 2 { format!("20{year}") } else { year.to_string() };
    Some(format!("{day:0>2}/{month:0>2}/{year}"))
}

/// Parses a canonical `DD/MM/YYYY` string into a real calendar date.
pub fn parse_canonical_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, "%d/%m/%Y").ok()
}

/// Why a syntactically valid date cannot be booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRejection {
    NotACalendarDate,
    Sunday,
    Past,
    TooFarAhead,
}

/// Calendar validity for a booking date, relative to `today`: must be a real
/// date, not a Sunday, not before today and at most one year ahead.
pub fn validate_booking_date(canonical: &str, today: NaiveDate) -> Result<NaiveDate, DateRejection> {
    let date = parse_canonical_date(canonical).ok_or(DateRejection::NotACalendarDate)?;
    if date.weekday() == Weekday::Sun {
        return Err(DateRejection::Sunday);
    }
    if date < today {
        return Err(DateRejection::Past);
    }
    let limit = today.checked_add_months(Months::new(12)).unwrap_or(NaiveDate::MAX);
    if date > limit {
        return Err(DateRejection::TooFarAhead);
    }
    Ok(date)
}

/// Accepts `H:MM` or `HH:MM`, zero-pads the hour and requires the result to
/// be one of the allowed start times.
pub fn normalize_time(input: &str) -> Option<&'static str> {
    let (hour, minute) = input.trim().split_once(':')?;
    if !is_digits(hour, 1, 2) || !is_digits(minute, 2, 2) {
        return None;
    }
    let padded = format!("{hour:0>2}:{minute}");
    ALLOWED_SLOTS.iter().copied().find(|slot| *slot == padded)
}
