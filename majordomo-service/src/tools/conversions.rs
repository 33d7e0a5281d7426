//! Static currency and unit conversion tables.

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("Unsupported currency: {0}")]
    UnsupportedCurrency(String),

    #[error("Conversion from {from} to {to} is not supported")]
    UnsupportedUnits { from: String, to: String },
}

/// Units of currency per US dollar
const USD_RATES: &[(&str, f64)] = &[
    ("USD", 1.0),
    ("EUR", 0.85),
    ("GBP", 0.73),
    ("INR", 83.12),
    ("JPY", 110.0),
    ("AUD", 1.35),
    ("CAD", 1.25),
];

fn usd_rate(code: &str) -> Option<f64> {
    USD_RATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, rate)| *rate)
}

/// Convert between currencies via USD. Codes are case-insensitive.
pub fn convert_currency(amount: f64, from: &str, to: &str) -> Result<f64, ConversionError> {
    let from = from.trim().to_uppercase();
    let to = to.trim().to_uppercase();

    let from_rate = usd_rate(&from).ok_or_else(|| ConversionError::UnsupportedCurrency(from.clone()))?;
    let to_rate = usd_rate(&to).ok_or_else(|| ConversionError::UnsupportedCurrency(to.clone()))?;

    Ok(amount / from_rate * to_rate)
}

/// Convert a value between supported length, weight and temperature units
pub fn convert_units(value: f64, from: &str, to: &str) -> Result<f64, ConversionError> {
    let from = from.trim().to_lowercase();
    let to = to.trim().to_lowercase();

    if from == to {
        return Ok(value);
    }

    let converted = match (from.as_str(), to.as_str()) {
        ("m", "km") => value / 1000.0,
        ("km", "m") => value * 1000.0,
        ("m", "ft") => value * 3.28084,
        ("ft", "m") => value / 3.28084,
        ("mi", "km") => value * 1.60934,
        ("km", "mi") => value / 1.60934,
        ("kg", "lb") => value * 2.20462,
        ("lb", "kg") => value / 2.20462,
        ("g", "oz") => value / 28.3495,
        ("oz", "g") => value * 28.3495,
        ("c", "f") => value * 9.0 / 5.0 + 32.0,
        ("f", "c") => (value - 32.0) * 5.0 / 9.0,
        _ => return Err(ConversionError::UnsupportedUnits { from, to }),
    };

    Ok(converted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_via_usd() {
        let inr = convert_currency(10.0, "usd", "INR").unwrap();
        assert!((inr - 831.2).abs() < 1e-9);

        let eur = convert_currency(83.12, "INR", "EUR").unwrap();
        assert!((eur - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_currency() {
        assert_eq!(
            convert_currency(1.0, "USD", "BTC"),
            Err(ConversionError::UnsupportedCurrency("BTC".to_string()))
        );
    }

    #[test]
    fn test_units() {
        assert_eq!(convert_units(100.0, "C", "F").unwrap(), 212.0);
        assert_eq!(convert_units(2.5, "km", "m").unwrap(), 2500.0);
        assert!((convert_units(1.0, "mi", "km").unwrap() - 1.60934).abs() < 1e-9);
        assert!(convert_units(1.0, "kg", "km").is_err());
    }
}
