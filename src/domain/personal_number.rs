//! Czech personal number (rodné číslo) rules.

use chrono::{Datelike, NaiveDate, Utc};
use thiserror::Error;

/// Numbers issued from this year on carry a four digit suffix.
const TEN_DIGIT_ISSUE_YEAR: u32 = 54;
/// From 2004 the month may carry an extra +20.
const ADDING_TWENTY_ISSUE_YEAR: u32 = 4;
const WOMAN_MONTH_ADDITION: u32 = 50;
const EXTRA_MONTH_ADDITION: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PersonalNumberError {
    #[error("personal number is empty")]
    Empty,
    #[error("personal number has unexpected format")]
    Malformed,
    #[error("personal number checksum does not match")]
    Checksum,
    #[error("personal number does not encode a valid birth date")]
    InvalidDate,
}

/// Strips whitespace and the `/` separator.
pub fn normalize(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '/')
        .collect()
}

pub fn validate(value: &str) -> Result<(), PersonalNumberError> {
    validate_at(value, Utc::now().year().rem_euclid(100) as u32)
}

/// Validates against the given two-digit current year.
pub fn validate_at(value: &str, current_year: u32) -> Result<(), PersonalNumberError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(PersonalNumberError::Empty);
    }

    let (date_part, suffix) = match value.split_once('/') {
        Some((date_part, suffix)) => (date_part, suffix),
        None if value.len() >= 6 && value.is_char_boundary(6) => value.split_at(6),
        None => return Err(PersonalNumberError::Malformed),
    };

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if date_part.len() != 6 || !all_digits(date_part) || !all_digits(suffix) {
        return Err(PersonalNumberError::Malformed);
    }

    let two_digits = |i: usize| date_part[i..i + 2].parse::<u32>().unwrap_or_default();
    let year = two_digits(0);
    let mut month = two_digits(2);
    let day = two_digits(4);

    let ten_digit = year >= TEN_DIGIT_ISSUE_YEAR || year <= current_year;
    if ten_digit {
        if suffix.len() != 4 {
            return Err(PersonalNumberError::Malformed);
        }
        let number: u64 = format!("{}{}", date_part, suffix)
            .parse()
            .map_err(|_| PersonalNumberError::Malformed)?;
        let control_digit = number % 10;
        let modulo_eleven_ok = number % 11 == 0;
        let modulo_ten_ok = (number / 10) % 11 == 10 && control_digit == 0;
        if !modulo_eleven_ok && !modulo_ten_ok {
            return Err(PersonalNumberError::Checksum);
        }
    } else if suffix.len() != 3 {
        return Err(PersonalNumberError::Malformed);
    }

    if month > WOMAN_MONTH_ADDITION {
        month -= WOMAN_MONTH_ADDITION;
    }
    if month > EXTRA_MONTH_ADDITION {
        if year >= ADDING_TWENTY_ISSUE_YEAR {
            month -= EXTRA_MONTH_ADDITION;
        } else {
            return Err(PersonalNumberError::InvalidDate);
        }
    }

    let full_year = if !ten_digit || year >= TEN_DIGIT_ISSUE_YEAR {
        1900 + year as i32
    } else {
        2000 + year as i32
    };
    NaiveDate::from_ymd_opt(full_year, month, day)
        .map(|_| ())
        .ok_or(PersonalNumberError::InvalidDate)
}
