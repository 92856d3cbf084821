//! Random identifiers for time-points, ringtones and templates

use rand::Rng;

/// Generate a random 128-bit identifier rendered as 32 lowercase hex digits
pub fn random_id() -> String {
    let value: u128 = rand::thread_rng().gen();
    format!("{:032x}", value)
}

/// Generate a random identifier with a fixed prefix, e.g. `custom-…`
pub fn prefixed_id(prefix: &str) -> String {
    format!("{}-{}", prefix, random_id())
}
