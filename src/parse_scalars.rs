//! Typing of scalar text under the YAML 1.2 core schema.

use crate::error::{Error, Location};
use crate::node::Scalar;
use crate::options::Options;
use crate::tags::CoreTag;

/// YAML 1.1 booleans (the "Norway problem" set), case-insensitive.
pub(crate) fn parse_yaml11_bool(s: &str) -> Option<bool> {
    const TRUE: [&str; 4] = ["true", "yes", "y", "on"];
    const FALSE: [&str; 4] = ["false", "no", "n", "off"];
    if TRUE.iter().any(|t| s.eq_ignore_ascii_case(t)) {
        Some(true)
    } else if FALSE.iter().any(|f| s.eq_ignore_ascii_case(f)) {
        Some(false)
    } else {
        None
    }
}

/// Core schema booleans: `true`, `True`, `TRUE` and the same for false.
pub(crate) fn parse_core_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

pub(crate) fn is_core_null(s: &str) -> bool {
    matches!(s, "" | "~" | "null" | "Null" | "NULL")
}

fn parse_digits(digits: &str, radix: u32) -> Option<u128> {
    let mut value: u128 = 0;
    let mut saw_digit = false;
    for ch in digits.chars() {
        if ch == '_' {
            continue;
        }
        let digit = ch.to_digit(radix)?;
        value = value.checked_mul(u128::from(radix))?.checked_add(u128::from(digit))?;
        saw_digit = true;
    }
    saw_digit.then_some(value)
}

/// Decimal, `0x`, `0o` and `0b` integers with an optional sign; `_` separators are
/// skipped. With `legacy_octal`, a leading `00` also means octal.
pub(crate) fn parse_int(s: &str, legacy_octal: bool) -> Option<i64> {
    let (negative, rest) = match s.as_bytes().first()? {
        b'-' => (true, &s[1..]),
        b'+' => (false, &s[1..]),
        _ => (false, s),
    };
    let (radix, digits) = if let Some(r) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        (16, r)
    } else if let Some(r) = rest.strip_prefix("0o").or_else(|| rest.strip_prefix("0O")) {
        (8, r)
    } else if let Some(r) = rest.strip_prefix("0b").or_else(|| rest.strip_prefix("0B")) {
        (2, r)
    } else if legacy_octal && rest.len() > 2 && rest.starts_with("00") {
        (8, &rest[2..])
    } else {
        (10, rest)
    };
    let magnitude = i128::try_from(parse_digits(digits, radix)?).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

/// Core schema floats, including `.inf`, `-.inf` and `.nan` in any case.
pub(crate) fn parse_float(s: &str) -> Option<f64> {
    match s.to_ascii_lowercase().as_str() {
        ".nan" | "+.nan" | "-.nan" => return Some(f64::NAN),
        ".inf" | "+.inf" => return Some(f64::INFINITY),
        "-.inf" => return Some(f64::NEG_INFINITY),
        _ => {}
    }
    // `str::parse` also takes `inf` and `NaN`, which YAML reads as strings.
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let numeric_start = unsigned
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '.');
    let numeric_body = unsigned
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-' | '_'));
    if !numeric_start || !numeric_body {
        return None;
    }
    s.replace('_', "").parse().ok()
}

/// Types an untagged plain scalar: null, boolean, integer, float, else string.
pub(crate) fn resolve_plain(text: &str, options: &Options) -> Scalar {
    if is_core_null(text) {
        return Scalar::Null;
    }
    let boolean = if options.strict_booleans {
        parse_core_bool(text)
    } else {
        parse_yaml11_bool(text)
    };
    if let Some(b) = boolean {
        return Scalar::Bool(b);
    }
    if let Some(i) = parse_int(text, options.legacy_octal_numbers) {
        return Scalar::Int(i);
    }
    if let Some(x) = parse_float(text) {
        return Scalar::Float(x);
    }
    Scalar::String(text.to_owned())
}

/// Types a scalar carrying a core tag. Text the tag cannot accept is an error.
pub(crate) fn resolve_tagged(
    text: &str,
    tag: CoreTag,
    options: &Options,
    location: Location,
) -> Result<Scalar, Error> {
    let invalid = || {
        Error::msg(format!("invalid !!{} value `{text}`", tag.name())).with_location(location)
    };
    let trimmed = text.trim();
    match tag {
        CoreTag::Str => Ok(Scalar::String(text.to_owned())),
        CoreTag::Int => parse_int(trimmed, options.legacy_octal_numbers)
            .map(Scalar::Int)
            .ok_or_else(invalid),
        CoreTag::Float => parse_float(trimmed)
            .or_else(|| parse_int(trimmed, false).map(|i| i as f64))
            .map(Scalar::Float)
            .ok_or_else(invalid),
        CoreTag::Bool => {
            let parsed = if options.strict_booleans {
                parse_core_bool(trimmed)
            } else {
                parse_yaml11_bool(trimmed)
            };
            parsed.map(Scalar::Bool).ok_or_else(invalid)
        }
        CoreTag::Null if is_core_null(trimmed) => Ok(Scalar::Null),
        CoreTag::Null => Err(invalid()),
        CoreTag::Seq | CoreTag::Map => Err(Error::msg(format!(
            "!!{} tag on a scalar value `{text}`",
            tag.name()
        ))
        .with_location(location)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(text: &str) -> Scalar {
        resolve_plain(text, &Options::default())
    }

    #[test]
    fn core_schema_typing() {
        assert_eq!(plain("~"), Scalar::Null);
        assert_eq!(plain(""), Scalar::Null);
        assert_eq!(plain("True"), Scalar::Bool(true));
        assert_eq!(plain("yes"), Scalar::String("yes".into()));
        assert_eq!(plain("-42"), Scalar::Int(-42));
        assert_eq!(plain("0x1F"), Scalar::Int(31));
        assert_eq!(plain("0o17"), Scalar::Int(15));
        assert_eq!(plain("1_000"), Scalar::Int(1000));
        assert_eq!(plain("2.5e3"), Scalar::Float(2500.0));
        assert_eq!(plain("-.inf"), Scalar::Float(f64::NEG_INFINITY));
        assert_eq!(plain("inf"), Scalar::String("inf".into()));
        assert_eq!(plain("1.2.3"), Scalar::String("1.2.3".into()));
        assert_eq!(plain("pkg.Point"), Scalar::String("pkg.Point".into()));
    }

    #[test]
    fn yaml11_booleans_when_not_strict() {
        let options = Options {
            strict_booleans: false,
            ..Options::default()
        };
        assert_eq!(resolve_plain("off", &options), Scalar::Bool(false));
        assert_eq!(resolve_plain("Y", &options), Scalar::Bool(true));
    }

    #[test]
    fn legacy_octal_is_opt_in() {
        let options = Options {
            legacy_octal_numbers: true,
            ..Options::default()
        };
        assert_eq!(resolve_plain("0017", &options), Scalar::Int(15));
        assert_eq!(plain("0017"), Scalar::Int(17));
    }

    #[test]
    fn integer_overflow_falls_back() {
        assert_eq!(parse_int("9223372036854775807", false), Some(i64::MAX));
        assert_eq!(parse_int("-9223372036854775808", false), Some(i64::MIN));
        assert_eq!(parse_int("9223372036854775808", false), None);
    }

    #[test]
    fn tags_force_types() {
        let options = Options::default();
        let at = Location::UNKNOWN;
        assert_eq!(
            resolve_tagged("12", CoreTag::Str, &options, at).unwrap(),
            Scalar::String("12".into())
        );
        assert_eq!(
            resolve_tagged("3", CoreTag::Float, &options, at).unwrap(),
            Scalar::Float(3.0)
        );
        let err = resolve_tagged("ten", CoreTag::Int, &options, at).unwrap_err();
        assert_eq!(err.to_string(), "invalid !!int value `ten`");
    }
}
