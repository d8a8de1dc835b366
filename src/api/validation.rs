use crate::api::errors::ApiError;

pub(crate) const GRADE_MIN: f64 = 0.0;
pub(crate) const GRADE_MAX: f64 = 10.0;
pub(crate) const GRADE_INTEGER_DIGITS: usize = 2;
pub(crate) const GRADE_FRACTION_DIGITS: usize = 2;

pub(crate) fn require_param<'a>(
    name: &str,
    value: Option<&'a String>,
) -> Result<&'a str, ApiError> {
    match value.map(|value| value.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ApiError::BadRequest(format!("{name} parameter is required"))),
    }
}

pub(crate) fn parse_id(name: &str, raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::BadRequest(format!("{name} must be a valid identifier")))
}

pub(crate) fn parse_grade(field: &str, raw: &str) -> Result<f64, String> {
    check_grade(field, raw)
}

/// Validates a grade lexically so float rounding cannot admit values like
/// `7.555`, then parses it. Digit counting ignores leading and trailing
/// zeros, mirroring a constraint on the numeric value rather than its
/// spelling.
fn check_grade(field: &str, raw: &str) -> Result<f64, String> {
    let raw = raw.trim();
    let unsigned = raw.strip_prefix('-').or_else(|| raw.strip_prefix('+')).unwrap_or(raw);

    let (integer, fraction) = match unsigned.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (unsigned, ""),
    };

    let all_digits = !unsigned.is_empty()
        && integer.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit());
    if !all_digits {
        return Err(format!("{field} must be a decimal number"));
    }

    let integer_digits = integer.trim_start_matches('0').len();
    let fraction_digits = fraction.trim_end_matches('0').len();
    if integer_digits > GRADE_INTEGER_DIGITS || fraction_digits > GRADE_FRACTION_DIGITS {
        return Err(format!(
            "{field} can have at most {GRADE_INTEGER_DIGITS} integer digits and \
             {GRADE_FRACTION_DIGITS} fractional digits"
        ));
    }

    let value: f64 =
        raw.parse().map_err(|_| format!("{field} must be a decimal number"))?;
    if !(GRADE_MIN..=GRADE_MAX).contains(&value) {
        return Err(format!("{field} must be between {GRADE_MIN} and {GRADE_MAX}"));
    }

    Ok(value)
}
