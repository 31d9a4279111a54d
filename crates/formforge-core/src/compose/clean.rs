//! Runtime validation: coerce submitted raw values into typed values.
//!
//! Messages follow the wording end users of HTML form frameworks expect
//! ("This field is required.", "Enter a valid email address.", ...).

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use formforge_types::error::ValidationErrors;
use formforge_types::field::{Choice, FieldKind, Widget};
use formforge_types::submission::{CleanedData, FieldValue, RawValue, SubmittedData};
use regex::Regex;
use rust_decimal::Decimal;

use super::form::FormInput;

pub const REQUIRED: &str = "This field is required.";

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Loose address check: something@something.tld, no whitespace.
pub fn is_valid_email(address: &str) -> bool {
    EMAIL.is_match(address)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M:%S%.f", "%H:%M"];

/// Validate every input against the submitted data.
///
/// Messages are collected per field in input order.
pub fn clean_form(
    inputs: &[FormInput],
    data: &SubmittedData,
) -> Result<CleanedData, ValidationErrors> {
    let mut cleaned = CleanedData::new();
    let mut errors = ValidationErrors::new();

    for input in inputs {
        let raw = raw_for(input, data);
        match clean_field(input, raw.as_ref()) {
            Ok(value) => cleaned.insert(input.name.clone(), value),
            Err(message) => errors.add(input.name.clone(), message),
        }
    }

    if errors.is_empty() {
        Ok(cleaned)
    } else {
        Err(errors)
    }
}

/// The raw value for an input. A split date/time widget posts two values,
/// `<name>_0` (date) and `<name>_1` (time), which are joined here.
fn raw_for(input: &FormInput, data: &SubmittedData) -> Option<RawValue> {
    if let Some(raw) = data.get(&input.name) {
        return Some(raw.clone());
    }
    if input.widget == Widget::SplitDateTime {
        let date = data.get(&format!("{}_0", input.name)).and_then(RawValue::as_text);
        let time = data.get(&format!("{}_1", input.name)).and_then(RawValue::as_text);
        return match (date, time) {
            (Some(d), Some(t)) if !d.is_empty() || !t.is_empty() => {
                Some(RawValue::Text(format!("{d} {t}").trim().to_string()))
            }
            _ => None,
        };
    }
    None
}

/// Clean a single input. `raw` is `None` when nothing was submitted.
pub fn clean_field(input: &FormInput, raw: Option<&RawValue>) -> Result<FieldValue, String> {
    // Checkbox semantics: absence means false.
    if let FieldKind::Boolean { .. } = input.kind {
        let value = raw.map(to_bool).unwrap_or(false);
        if input.required && !value {
            return Err(REQUIRED.to_string());
        }
        return Ok(FieldValue::Bool(value));
    }
    if let FieldKind::NullBoolean { .. } = input.kind {
        return Ok(raw.and_then(to_null_bool).map_or(FieldValue::Null, FieldValue::Bool));
    }

    if input.is_multiple() {
        let values = raw.map(RawValue::as_list).unwrap_or_default();
        if values.is_empty() {
            return if input.required {
                Err(REQUIRED.to_string())
            } else {
                Ok(FieldValue::List(Vec::new()))
            };
        }
        return clean_multiple(input, values);
    }

    let text = match raw.filter(|r| !r.is_empty()).and_then(RawValue::as_text) {
        Some(text) if !text.is_empty() => text,
        _ => {
            return if input.required {
                Err(REQUIRED.to_string())
            } else {
                Ok(FieldValue::Null)
            };
        }
    };

    match &input.kind {
        FieldKind::Char {
            max_length,
            min_length,
            ..
        }
        | FieldKind::Text {
            max_length,
            min_length,
            ..
        } => {
            check_length(&text, *max_length, *min_length)?;
            Ok(FieldValue::Text(text))
        }
        FieldKind::Email { max_length, .. } => {
            check_length(&text, *max_length, None)?;
            if is_valid_email(&text) {
                Ok(FieldValue::Text(text))
            } else {
                Err("Enter a valid email address.".to_string())
            }
        }
        FieldKind::Url { max_length, .. } => {
            let url = clean_url(&text)?;
            check_length(&url, *max_length, None)?;
            Ok(FieldValue::Text(url))
        }
        FieldKind::Date { .. } => parse_date(&text)
            .map(FieldValue::Date)
            .ok_or_else(|| "Enter a valid date.".to_string()),
        FieldKind::DateTime { .. } => parse_datetime(&text)
            .map(FieldValue::DateTime)
            .ok_or_else(|| "Enter a valid date/time.".to_string()),
        FieldKind::Time { .. } => parse_time(&text)
            .map(FieldValue::Time)
            .ok_or_else(|| "Enter a valid time.".to_string()),
        FieldKind::Integer {
            min_value,
            max_value,
            ..
        } => {
            let value = parse_integer(&text).ok_or_else(|| "Enter a whole number.".to_string())?;
            check_range(value, *min_value, *max_value)?;
            Ok(FieldValue::Integer(value))
        }
        FieldKind::Float {
            min_value,
            max_value,
            ..
        } => {
            let value = text
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| "Enter a number.".to_string())?;
            check_range(value, *min_value, *max_value)?;
            Ok(FieldValue::Float(value))
        }
        FieldKind::Decimal {
            max_digits,
            decimal_places,
            min_value,
            max_value,
            ..
        } => {
            let value = Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map_err(|_| "Enter a number.".to_string())?;
            check_range(value, *min_value, *max_value)?;
            check_digits(value, *max_digits, *decimal_places)?;
            Ok(FieldValue::Decimal(value))
        }
        FieldKind::Choice { choices, .. } => {
            if is_choice(choices, &text) {
                Ok(FieldValue::Text(text))
            } else {
                Err(invalid_choice(&text))
            }
        }
        FieldKind::ForeignKey { choices, .. } => {
            // A relation without a known option list accepts any key.
            if choices.is_empty() || is_choice(choices, &text) {
                Ok(FieldValue::Text(text))
            } else {
                Err("Select a valid choice. That choice is not one of the available choices."
                    .to_string())
            }
        }
        FieldKind::Boolean { .. }
        | FieldKind::NullBoolean { .. }
        | FieldKind::MultipleChoice { .. }
        | FieldKind::ManyToMany { .. } => unreachable!("handled above"),
    }
}

fn clean_multiple(input: &FormInput, values: Vec<String>) -> Result<FieldValue, String> {
    let choices = input.choices();
    let unrestricted = matches!(input.kind, FieldKind::ManyToMany { .. }) && choices.is_empty();
    if !unrestricted {
        if let Some(bad) = values.iter().find(|v| !is_choice(choices, v)) {
            return Err(invalid_choice(bad));
        }
    }
    Ok(FieldValue::List(values))
}

fn is_choice(choices: &[Choice], value: &str) -> bool {
    choices.iter().any(|c| c.value == value)
}

fn invalid_choice(value: &str) -> String {
    format!("Select a valid choice. {value} is not one of the available choices.")
}

fn to_bool(raw: &RawValue) -> bool {
    match raw {
        RawValue::Null => false,
        RawValue::Bool(b) => *b,
        RawValue::Int(i) => *i != 0,
        RawValue::Float(f) => *f != 0.0,
        RawValue::Text(_) | RawValue::List(_) => !matches!(
            raw.as_text()
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "" | "false" | "0" | "off" | "no"
        ),
    }
}

fn to_null_bool(raw: &RawValue) -> Option<bool> {
    match raw {
        RawValue::Bool(b) => Some(*b),
        RawValue::Int(1) => Some(true),
        RawValue::Int(0) => Some(false),
        other => match other.as_text()?.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
    }
}

fn check_length(text: &str, max: Option<u32>, min: Option<u32>) -> Result<(), String> {
    let len = text.chars().count();
    if let Some(max) = max {
        if len > max as usize {
            return Err(format!(
                "Ensure this value has at most {max} characters (it has {len})."
            ));
        }
    }
    if let Some(min) = min {
        if len < min as usize {
            return Err(format!(
                "Ensure this value has at least {min} characters (it has {len})."
            ));
        }
    }
    Ok(())
}

fn check_range<T>(value: T, min: Option<T>, max: Option<T>) -> Result<(), String>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if let Some(max) = max {
        if value > max {
            return Err(format!("Ensure this value is less than or equal to {max}."));
        }
    }
    if let Some(min) = min {
        if value < min {
            return Err(format!("Ensure this value is greater than or equal to {min}."));
        }
    }
    Ok(())
}

/// Digit-count validation on the value as written (trailing zeros count).
fn check_digits(
    value: Decimal,
    max_digits: Option<u32>,
    decimal_places: Option<u32>,
) -> Result<(), String> {
    let decimals = value.scale();
    let mantissa_digits = value.mantissa().unsigned_abs().to_string().len() as u32;
    let digits = mantissa_digits.max(decimals);
    let whole_digits = digits - decimals;

    if let Some(max) = max_digits {
        if digits > max {
            return Err(format!(
                "Ensure that there are no more than {max} digits in total."
            ));
        }
    }
    if let Some(places) = decimal_places {
        if decimals > places {
            return Err(format!(
                "Ensure that there are no more than {places} decimal places."
            ));
        }
    }
    if let (Some(max), Some(places)) = (max_digits, decimal_places) {
        let max_whole = max.saturating_sub(places);
        if whole_digits > max_whole {
            return Err(format!(
                "Ensure that there are no more than {max_whole} digits before the decimal point."
            ));
        }
    }
    Ok(())
}

fn parse_integer(text: &str) -> Option<i64> {
    if let Ok(v) = text.parse::<i64>() {
        return Some(v);
    }
    // "3.0" is still a whole number.
    let f = text.parse::<f64>().ok()?;
    (f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64).then_some(f as i64)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| parse_date(text).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(text, fmt).ok())
}

/// Accept http(s) URLs with a host; a missing scheme defaults to http.
fn clean_url(text: &str) -> Result<String, String> {
    let candidate = if text.contains("://") {
        text.to_string()
    } else {
        format!("http://{text}")
    };
    match url::Url::parse(&candidate) {
        Ok(parsed)
            if matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty()) =>
        {
            Ok(candidate)
        }
        _ => Err("Enter a valid URL.".to_string()),
    }
}
