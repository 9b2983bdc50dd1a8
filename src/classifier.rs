//! Message classification.
//!
//! Routes a free-text message to the math, vitals or general strategy.
//! The math check runs first, so a message carrying both math and vitals
//! cues is always math.

use std::sync::LazyLock;

use regex::Regex;

const MATH_KEYWORDS: &[&str] = &[
    "solve",
    "calculate",
    "math",
    "equation",
    "formula",
    "function",
    "derivative",
    "integral",
    "algebra",
    "geometry",
    "trigonometry",
    "calculus",
    "statistics",
    "probability",
    "matrix",
    "vector",
    "graph",
    "plot",
    "prime",
    "factor",
    "polynomial",
    "theorem",
    "proof",
    "angle",
    "area",
    "volume",
    "percentage",
    "ratio",
];

const MATH_SYMBOLS: &[char] = &[
    '+', '-', '*', '/', '=', '^', '√', 'π', '∞', '∑', '∫', '∂', '∆',
];

static MATH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\d+\s*[+\-*/]\s*\d+",
        r"[xX]\s*[+\-*/]\s*[yY]",
        r"[fF]\(x\)",
        r"\d+\s*=\s*\d+",
        r"[0-9]+\^[0-9]+",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid math pattern"))
    .collect()
});

static VITALS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)\s*/\s*(\d+).*?(\d+)\s*(?:bpm|heart|hr)").expect("valid vitals pattern")
});

/// Blood pressure and pulse readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vitals {
    pub systolic: i64,
    pub diastolic: i64,
    pub heart_rate: i64,
}

impl Vitals {
    /// Heart rate assumed when a structured reading omits it.
    pub const DEFAULT_HEART_RATE: i64 = 75;
}

/// Outcome of classifying a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Math,
    /// Vitals found in free text, with the extracted readings.
    Vitals(Vitals),
    General,
}

/// Classify a free-text message.
pub fn classify(message: &str) -> Category {
    if is_math_related(message) {
        return Category::Math;
    }
    if let Some(vitals) = extract_vitals(message) {
        return Category::Vitals(vitals);
    }
    Category::General
}

/// Keyword, symbol or arithmetic-shape match.
pub fn is_math_related(message: &str) -> bool {
    let lower = message.to_lowercase();
    MATH_KEYWORDS.iter().any(|k| lower.contains(k))
        || message.contains(MATH_SYMBOLS)
        || MATH_PATTERNS.iter().any(|p| p.is_match(message))
}

/// Pull `systolic/diastolic ... heart-rate (bpm|heart|hr)` out of a message.
pub fn extract_vitals(message: &str) -> Option<Vitals> {
    let lower = message.to_lowercase();
    let caps = VITALS_PATTERN.captures(&lower)?;
    Some(Vitals {
        systolic: caps[1].parse().ok()?,
        diastolic: caps[2].parse().ok()?,
        heart_rate: caps[3].parse().ok()?,
    })
}
