//! Per-exchange correlation ids.

use chrono::Utc;
use rand::Rng;

const SUFFIX_LEN: usize = 7;

/// `<unix millis>-<7 lowercase alphanumerics>`, e.g. `1714550400000-k3x9q0a`.
pub fn generate() -> String {
    let suffix: String = rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), suffix)
}
