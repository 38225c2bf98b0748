//! The canonical instrument-name grammar, shared by every adapter's
//! translator so both vendors ever produce byte-identical names for the
//! same underlying option.
//!
//! ```text
//! option     = SYM "-" DDMMMYY "-" STRIKE "-" ("C" | "P")
//! DDMMMYY    = 1*2DIGIT 3UPPER 2DIGIT
//! STRIKE     = 1*DIGIT ["." 1*DIGIT]   ; no trailing zeros
//! underlying = SYM                       ; or vendor reference token
//! ```

use chrono::{Datelike, NaiveDate};

/// A parsed canonical option name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOption<'a> {
    pub sym: &'a str,
    pub expiry: &'a str,
    pub strike: f64,
    pub kind: OptionKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Call,
    Put,
}

impl OptionKind {
    pub fn as_letter(self) -> &'static str {
        match self {
            Self::Call => "C",
            Self::Put => "P",
        }
    }

    pub fn from_letter(s: &str) -> Option<Self> {
        match s {
            "C" => Some(Self::Call),
            "P" => Some(Self::Put),
            _ => None,
        }
    }
}

/// Splits a canonical name into `sym, expiry (DDMMMYY), strike, kind`.
/// Returns `None` for anything that isn't the 4-part option form (plain
/// underlyings fall through this and are handled by the caller).
pub fn parse_canonical_option(name: &str) -> Option<ParsedOption<'_>> {
    let parts: Vec<&str> = name.split('-').collect();
    if parts.len() != 4 {
        return None;
    }
    let [sym, expiry, strike, kind] = [parts[0], parts[1], parts[2], parts[3]];
    let strike: f64 = strike.parse().ok()?;
    let kind = OptionKind::from_letter(kind)?;
    Some(ParsedOption {
        sym,
        expiry,
        strike,
        kind,
    })
}

/// Formats a canonical option name from its parts, stripping trailing zeros
/// from the strike per the grammar.
pub fn format_canonical_option(sym: &str, expiry: &str, strike: f64, kind: OptionKind) -> String {
    format!(
        "{sym}-{expiry}-{strike}-{kind}",
        strike = format_strike(strike),
        kind = kind.as_letter()
    )
}

/// Strips insignificant trailing zeros from a decimal strike:
/// `500.00 -> "500"`, `500.50 -> "500.5"`.
pub fn format_strike(strike: f64) -> String {
    if strike.fract() == 0.0 {
        format!("{}", strike as i64)
    } else {
        let s = format!("{strike:.8}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// Formats a date as the canonical `DDMMMYY` token, e.g. `2026-02-20 -> "20FEB26"`.
pub fn format_expiry(date: NaiveDate) -> String {
    const MONTHS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    let month = MONTHS[date.month0() as usize];
    format!("{day}{month}{year:02}", day = date.day(), year = date.year() % 100)
}

/// Parses a `DDMMMYY` token back into a date. Returns `None` for anything
/// that doesn't match (callers sort unparseable dates last).
pub fn parse_expiry(token: &str) -> Option<NaiveDate> {
    const MONTHS: [&str; 12] = [
        "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
    ];
    let token = token.trim();
    let digits_end = token.find(|c: char| !c.is_ascii_digit())?;
    if !(1..=2).contains(&digits_end) {
        return None;
    }
    let day: u32 = token[..digits_end].parse().ok()?;
    let rest = &token[digits_end..];
    if rest.len() != 5 {
        return None;
    }
    let month_str = &rest[..3];
    let year_str = &rest[3..];
    let month = MONTHS.iter().position(|m| *m == month_str)? as u32 + 1;
    let year: i32 = year_str.parse().ok()?;
    // All expiries we deal with are 21st-century two-digit years.
    let year = 2000 + year;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// The millisecond Unix timestamp for an expiry, assuming a midnight-UTC
/// settlement instant (matches the precision the original implementation
/// used — this core does not model exchange-specific settlement times).
pub fn expiry_timestamp_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .expect("midnight is always valid")
        .and_utc()
        .timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strike_formatting_strips_trailing_zeros() {
        assert_eq!(format_strike(500.0), "500");
        assert_eq!(format_strike(500.5), "500.5");
        assert_eq!(format_strike(688.0), "688");
    }

    #[test]
    fn expiry_round_trips() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 20).unwrap();
        let token = format_expiry(date);
        assert_eq!(token, "20FEB26");
        assert_eq!(parse_expiry(&token), Some(date));
    }

    #[test]
    fn parse_expiry_rejects_garbage() {
        assert_eq!(parse_expiry("not-a-date"), None);
        assert_eq!(parse_expiry("XXFEB26"), None);
    }

    #[test]
    fn option_round_trip() {
        let name = "SPY-20FEB26-688-C";
        let parsed = parse_canonical_option(name).unwrap();
        assert_eq!(parsed.sym, "SPY");
        assert_eq!(parsed.expiry, "20FEB26");
        assert_eq!(parsed.strike, 688.0);
        assert_eq!(parsed.kind, OptionKind::Call);
        let rebuilt =
            format_canonical_option(parsed.sym, parsed.expiry, parsed.strike, parsed.kind);
        assert_eq!(rebuilt, name);
    }

    #[test]
    fn plain_underlying_is_not_an_option() {
        assert_eq!(parse_canonical_option("BTC-PERPETUAL"), None);
        assert_eq!(parse_canonical_option("SPY"), None);
    }
}
