use regex::Regex;

use crate::error::{PollError, PollResult};

use std::fmt;

/// A money value in a certain currency.
///
/// The value is always stored as cents, so 1.23 € becomes
/// `value_cents = 123` with currency `"€"`. The value may be negative at
/// parse time; whether a negative value is acceptable is decided by the
/// consumer (median polls reject it).
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CurrencyValue {
    pub value_cents: i64,
    pub currency: String,
}

impl CurrencyValue {
    pub fn new(value_cents: i64, currency: impl Into<String>) -> CurrencyValue {
        CurrencyValue {
            value_cents,
            currency: currency.into(),
        }
    }

    /// A standard rendering of the form `0.09`, `0.21` or `21.42 €`, with a
    /// configurable decimal separator. Useful for formatter implementations.
    pub fn default_format_string(&self, sep: &str) -> String {
        if self.value_cents < 0 {
            let positive = CurrencyValue {
                value_cents: -self.value_cents,
                currency: self.currency.clone(),
            };
            return format!("-{}", positive.default_format_string(sep));
        }
        let currency_str = if self.currency.is_empty() {
            String::new()
        } else {
            format!(" {}", self.currency)
        };
        let full = self.value_cents / 100;
        let cents = self.value_cents % 100;
        format!("{}{}{:02}{}", full, sep, cents, currency_str)
    }
}

impl fmt::Display for CurrencyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.default_format_string("."))
    }
}

/// Formats and parses currency strings.
///
/// The core knows nothing about currency symbols or decimal separators, it
/// only ever talks to this trait. A rule of thumb for implementations: a
/// value produced by `format` must parse back without errors.
pub trait CurrencyHandler: Send + Sync {
    fn format(&self, value: &CurrencyValue) -> String;
    fn parse(&self, s: &str) -> PollResult<CurrencyValue>;
}

/// A [`CurrencyHandler`] for simple Euro strings.
///
/// Formats to strings like `"1.23 €"` (or `"1.23"` without a currency).
/// Parses `"42€"`, `"21.42 €"`, `"-42€"` and `"21,42 €"`; both `.` and `,`
/// work as decimal separator, thousands separators are not supported.
#[derive(Debug, Clone)]
pub struct SimpleEuroHandler {
    rx: Regex,
}

impl SimpleEuroHandler {
    pub fn new() -> SimpleEuroHandler {
        SimpleEuroHandler {
            rx: Regex::new(r"^\s*(-)?\s*(\d+)(?:[,.](\d{1,2}))?\s*(€)?\s*$")
                .expect("euro pattern is valid"),
        }
    }
}

impl Default for SimpleEuroHandler {
    fn default() -> Self {
        SimpleEuroHandler::new()
    }
}

impl CurrencyHandler for SimpleEuroHandler {
    fn format(&self, value: &CurrencyValue) -> String {
        value.default_format_string(".")
    }

    fn parse(&self, s: &str) -> PollResult<CurrencyValue> {
        let caps = match self.rx.captures(s) {
            Some(caps) => caps,
            None => {
                return Err(PollError::syntax(format!(
                    "not a valid currency string: {}",
                    s
                )))
            }
        };
        let euro_str = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        let mut cents: i64 = euro_str
            .parse::<i64>()
            .map_err(|_| PollError::syntax(format!("currency integer out of range: {}", euro_str)))?
            * 100;
        if let Some(cents_match) = caps.get(3) {
            let cents_str = cents_match.as_str();
            // the pattern guarantees one or two digits
            let parsed: i64 = cents_str.parse().expect("digits match parses");
            cents += if cents_str.len() == 1 {
                parsed * 10
            } else {
                parsed
            };
        }
        if caps.get(1).is_some() {
            cents = -cents;
        }
        let currency = caps.get(4).map(|m| m.as_str()).unwrap_or("").to_string();
        Ok(CurrencyValue {
            value_cents: cents,
            currency,
        })
    }
}

/// A [`CurrencyHandler`] for plain cent integers.
///
/// Parses `"10"` as ten cents, no currency symbol allowed. Formats like
/// [`SimpleEuroHandler`].
#[derive(Debug, Clone, Default)]
pub struct RawCentHandler;

impl CurrencyHandler for RawCentHandler {
    fn format(&self, value: &CurrencyValue) -> String {
        value.default_format_string(".")
    }

    fn parse(&self, s: &str) -> PollResult<CurrencyValue> {
        let trimmed = s.trim();
        let cents: i64 = trimmed
            .parse()
            .map_err(|_| PollError::syntax(format!("invalid currency integer: {}", trimmed)))?;
        Ok(CurrencyValue {
            value_cents: cents,
            currency: String::new(),
        })
    }
}
