//! Arithmetic expression evaluator backing `calculate`.
//!
//! Input is screened down to `+ - * /`, parentheses, unary minus and decimal
//! literals before it reaches `meval`, so functions, constants and variables
//! never get evaluated.

use thiserror::Error;

/// Longest expression accepted
pub const MAX_EXPRESSION_LEN: usize = 512;

#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("expression is longer than {MAX_EXPRESSION_LEN} characters")]
    TooLong,

    #[error("expression is empty")]
    Empty,

    #[error("result is not a finite number (division by zero?)")]
    NotFinite,

    #[error("{0}")]
    Malformed(String),
}

/// Map accepted spellings onto the operators `meval` understands
fn screen(expression: &str) -> Result<String, CalcError> {
    if expression.chars().count() > MAX_EXPRESSION_LEN {
        return Err(CalcError::TooLong);
    }

    let mut screened = String::with_capacity(expression.len());
    for c in expression.chars() {
        match c {
            '0'..='9' | '.' | '+' | '-' | '*' | '/' | '(' | ')' => screened.push(c),
            ' ' | '\t' => screened.push(' '),
            'x' | '×' => screened.push('*'),
            '÷' => screened.push('/'),
            other => return Err(CalcError::UnexpectedChar(other)),
        }
    }

    if screened.trim().is_empty() {
        return Err(CalcError::Empty);
    }
    Ok(screened)
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let screened = screen(expression)?;
    let value = meval::eval_str(&screened).map_err(|e| CalcError::Malformed(e.to_string()))?;
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

/// Render a result without a trailing `.0` for whole numbers
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let rendered = format!("{:.6}", value);
        rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(evaluate("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(evaluate("10 * (5 - 3)").unwrap(), 20.0);
        assert_eq!(evaluate("-(2 + 2) / 4").unwrap(), -1.0);
        assert_eq!(evaluate("3 x 4").unwrap(), 12.0);
    }

    #[test]
    fn test_decimals() {
        assert!((evaluate("0.1 + 0.2").unwrap() - 0.3).abs() < 1e-9);
        assert_eq!(format_number(evaluate("7 / 2").unwrap()), "3.5");
        assert_eq!(format_number(evaluate("6 ÷ 2").unwrap()), "3");
    }

    #[test]
    fn test_rejects_bad_input() {
        assert_eq!(evaluate("1 / 0"), Err(CalcError::NotFinite));
        assert_eq!(evaluate("2 ^ 3"), Err(CalcError::UnexpectedChar('^')));
        assert_eq!(evaluate("sqrt(4)"), Err(CalcError::UnexpectedChar('s')));
        assert_eq!(evaluate("pi"), Err(CalcError::UnexpectedChar('p')));
        assert_eq!(evaluate(""), Err(CalcError::Empty));
        assert!(matches!(evaluate("(1 + 2"), Err(CalcError::Malformed(_))));
        assert!(matches!(evaluate("1 +"), Err(CalcError::Malformed(_))));
        assert!(evaluate("1 2").is_err());
    }

    #[test]
    fn test_deep_nesting_is_rejected_not_evaluated() {
        let nested = format!("{}1{}", "(".repeat(200_000), ")".repeat(200_000));
        assert_eq!(evaluate(&nested), Err(CalcError::TooLong));

        let negations = format!("{}1", "-".repeat(100_000));
        assert_eq!(evaluate(&negations), Err(CalcError::TooLong));
    }
}
