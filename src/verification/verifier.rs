//! Ground-truth comparison for extracted answers.

/// Checks a model's extracted answer against the ground truth.
///
/// Numbers compare by value (`"70"` equals `"70.0"`); everything else
/// compares trimmed and case-insensitively. There is no partial credit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verifier;

impl Verifier {
    pub fn new() -> Self {
        Self
    }

    pub fn verify(&self, extracted: Option<&str>, ground_truth: &str) -> bool {
        let Some(extracted) = extracted.map(str::trim).filter(|a| !a.is_empty()) else {
            return false;
        };
        let ground_truth = ground_truth.trim();

        match (parse_number(extracted), parse_number(ground_truth)) {
            (Some(a), Some(b)) => a == b,
            _ => extracted.to_lowercase() == ground_truth.to_lowercase(),
        }
    }
}

/// Finite decimals only. "nan" and "inf" are compared as text.
fn parse_number(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|x| x.is_finite())
}
