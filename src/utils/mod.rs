// Shared numeric helpers for scoring

/// Log-scale normalization of a count against the corpus maximum.
/// Returns a value in [0, 1]; 0 when the corpus maximum is 0.
pub fn log_normalize(value: f64, max_in_corpus: f64) -> f64 {
    if max_in_corpus <= 0.0 {
        return 0.0;
    }
    (value.max(0.0) + 1.0).ln() / (max_in_corpus + 1.0).ln()
}

/// Exponential age decay: 1.0 at age 0, ~0.37 at `horizon_days`.
pub fn exponential_age_decay(age_days: f64, horizon_days: f64) -> f64 {
    if horizon_days <= 0.0 {
        return 0.0;
    }
    (-age_days.max(0.0) / horizon_days).exp()
}

/// Fraction that degrades to 0 instead of NaN on an empty denominator.
pub fn safe_fraction(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}
