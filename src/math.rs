//! Deterministic math fast path.
//!
//! Recognizes a narrow set of problem shapes (two-operand arithmetic,
//! primality, circle and rectangle area) and answers them without calling
//! the generation backend. Anything else is reported as unsolved so the
//! caller can build a tutoring prompt instead.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static ARITHMETIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([+\-*/])(\d+)$").expect("valid arithmetic regex"));

/// Largest operand checked by trial division (at most 10^6 divisors).
pub const PRIMALITY_LIMIT: u64 = 1_000_000_000_000;

static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid integer regex"));

/// Evaluation failures inside a recognized problem shape.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    #[error("division by zero")]
    DivisionByZero,

    #[error("number too large: {0}")]
    Overflow(String),
}

/// Try to answer `problem` deterministically.
///
/// Returns `Ok(Some(answer))` when a known form matched, `Ok(None)` when no
/// form applies, and `Err` when a form matched but could not be evaluated.
/// Forms are tried in order and the first match wins.
pub fn try_solve(problem: &str) -> Result<Option<String>, MathError> {
    let problem = problem.trim().to_lowercase();

    let compact: String = problem.chars().filter(|c| !c.is_whitespace()).collect();
    if let Some(caps) = ARITHMETIC.captures(&compact) {
        return solve_arithmetic(&caps[1], &caps[2], &caps[3]).map(Some);
    }

    if problem.contains("prime") && problem.contains("number") {
        if let Some(answer) = solve_primality(&problem)? {
            return Ok(Some(answer));
        }
    }

    if problem.contains("area") {
        if problem.contains("circle") {
            if let Some(radius) = integers(&problem).next() {
                let r = radius?;
                #[allow(clippy::cast_precision_loss)]
                let area = std::f64::consts::PI * (r as f64) * (r as f64);
                return Ok(Some(format!(
                    "Area of circle with radius {r} = π × {r}² = {area:.2}"
                )));
            }
        }

        if problem.contains("rectangle") || problem.contains("square") {
            let mut numbers = integers(&problem);
            if let (Some(l), Some(w)) = (numbers.next(), numbers.next()) {
                let (l, w) = (l?, w?);
                let product = l
                    .checked_mul(w)
                    .ok_or_else(|| MathError::Overflow(format!("{l} × {w}")))?;
                return Ok(Some(format!(
                    "Area = length × width = {l} × {w} = {product}"
                )));
            }
        }
    }

    Ok(None)
}

fn solve_arithmetic(lhs: &str, op: &str, rhs: &str) -> Result<String, MathError> {
    let a = parse_integer(lhs)?;
    let b = parse_integer(rhs)?;
    let overflow = || MathError::Overflow(format!("{a}{op}{b}"));

    let value = match op {
        "+" => a.checked_add(b).ok_or_else(overflow)?.to_string(),
        "-" => a.checked_sub(b).ok_or_else(overflow)?.to_string(),
        "*" => a.checked_mul(b).ok_or_else(overflow)?.to_string(),
        "/" => {
            if b == 0 {
                return Err(MathError::DivisionByZero);
            }
            // True division: always rendered as a float.
            #[allow(clippy::cast_precision_loss)]
            let quotient = a as f64 / b as f64;
            format!("{quotient:?}")
        }
        _ => unreachable!("operator class is [+-*/]"),
    };

    Ok(format!("Solution: {value}"))
}

/// Trial division by 2..=floor(sqrt(n)).
///
/// `None` for n <= 1, n above [`PRIMALITY_LIMIT`], or no integer at all.
fn solve_primality(problem: &str) -> Result<Option<String>, MathError> {
    let Some(n) = integers(problem).next() else {
        return Ok(None);
    };
    let Ok(n) = u64::try_from(n?) else {
        return Ok(None);
    };
    if n <= 1 || n > PRIMALITY_LIMIT {
        return Ok(None);
    }

    let mut divisor = 2u64;
    while divisor.saturating_mul(divisor) <= n {
        if n % divisor == 0 {
            return Ok(Some(format!(
                "{n} is not a prime number (divisible by {divisor})"
            )));
        }
        divisor += 1;
    }
    Ok(Some(format!("{n} is a prime number")))
}

fn integers(text: &str) -> impl Iterator<Item = Result<i128, MathError>> + '_ {
    INTEGER.find_iter(text).map(|m| parse_integer(m.as_str()))
}

fn parse_integer(digits: &str) -> Result<i128, MathError> {
    digits
        .parse::<i128>()
        .map_err(|_| MathError::Overflow(digits.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solved(problem: &str) -> String {
        try_solve(problem)
            .expect("should evaluate")
            .expect("should be solvable")
    }

    #[test]
    fn arithmetic_operators() {
        assert_eq!(solved("2+2"), "Solution: 4");
        assert_eq!(solved("10 - 25"), "Solution: -15");
        assert_eq!(solved(" 12 * 12 "), "Solution: 144");
    }

    #[test]
    fn division_is_true_division() {
        assert_eq!(solved("4/2"), "Solution: 2.0");
        assert_eq!(solved("1 / 4"), "Solution: 0.25");
        assert_eq!(solved("1/3"), "Solution: 0.3333333333333333");
    }

    #[test]
    fn division_by_zero_is_an_error() {
        assert_eq!(try_solve("7/0"), Err(MathError::DivisionByZero));
    }

    #[test]
    fn arithmetic_overflow_is_an_error() {
        let huge = "9".repeat(60);
        assert!(matches!(
            try_solve(&format!("{huge}+1")),
            Err(MathError::Overflow(_))
        ));
    }

    #[test]
    fn primality_matches_trial_division() {
        assert_eq!(solved("what is 17 a prime number"), "17 is a prime number");
        assert_eq!(solved("is 2 a prime number?"), "2 is a prime number");
        assert_eq!(
            solved("is 91 a prime number"),
            "91 is not a prime number (divisible by 7)"
        );
        assert_eq!(
            solved("Is 49 a PRIME Number"),
            "49 is not a prime number (divisible by 7)"
        );
    }

    #[test]
    fn primality_ignores_one_and_zero() {
        assert_eq!(try_solve("is 1 a prime number"), Ok(None));
        assert_eq!(try_solve("is 0 a prime number"), Ok(None));
    }

    #[test]
    fn primality_skips_operands_above_limit() {
        assert_eq!(
            try_solve("is 18446744073709551557 a prime number"),
            Ok(None)
        );
        assert_eq!(
            try_solve(&format!("is {} a prime number", PRIMALITY_LIMIT + 1)),
            Ok(None)
        );
        assert_eq!(
            solved("is 1000000000000 a prime number"),
            "1000000000000 is not a prime number (divisible by 2)"
        );
        assert_eq!(
            solved("is 999999999989 a prime number"),
            "999999999989 is a prime number"
        );
    }

    #[test]
    fn primality_needs_both_words() {
        assert_eq!(try_solve("is 7 prime"), Ok(None));
    }

    #[test]
    fn circle_area() {
        assert_eq!(
            solved("area of a circle with radius 5"),
            "Area of circle with radius 5 = π × 5² = 78.54"
        );
        assert_eq!(
            solved("Find the area of circle r=1"),
            "Area of circle with radius 1 = π × 1² = 3.14"
        );
    }

    #[test]
    fn rectangle_and_square_area() {
        assert_eq!(
            solved("area of rectangle 4 by 6"),
            "Area = length × width = 4 × 6 = 24"
        );
        assert_eq!(
            solved("what is the area of a square 3 and 3"),
            "Area = length × width = 3 × 3 = 9"
        );
    }

    #[test]
    fn rectangle_needs_two_numbers() {
        assert_eq!(try_solve("area of rectangle with side 4"), Ok(None));
    }

    #[test]
    fn unrecognized_problem_is_unsolved() {
        assert_eq!(try_solve("solve x^2 - 4 = 0"), Ok(None));
        assert_eq!(try_solve("what is a derivative"), Ok(None));
    }
}
