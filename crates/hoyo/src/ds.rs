//! DS header generation for overseas Hoyolab endpoints.
//!
//! Game-record requests must carry a `DS` header of the form
//! `"{t},{r},{hash}"` where `t` is the unix timestamp, `r` a 6-character
//! alphanumeric nonce, and `hash` the MD5 hex digest of
//! `"salt={salt}&t={t}&r={r}"`. The salt is fixed per API generation.

use rand::distr::Alphanumeric;
use rand::Rng;

/// Salt for overseas game-record endpoints.
const OS_SALT: &str = "6s25p5ox5y14umn1p61aqyyvbvvl3lrs";

/// Build a DS header value for the current moment.
pub fn generate() -> String {
    let t = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let r: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();
    sign(t, &r)
}

/// Build a DS header value from explicit inputs.
fn sign(t: u64, r: &str) -> String {
    let digest = md5::compute(format!("salt={OS_SALT}&t={t}&r={r}"));
    format!("{t},{r},{digest:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_is_deterministic_for_fixed_inputs() {
        assert_eq!(sign(1700000000, "abc123"), sign(1700000000, "abc123"));
    }

    #[test]
    fn header_has_three_comma_fields() {
        let ds = sign(1700000000, "abc123");
        let parts: Vec<&str> = ds.split(',').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "1700000000");
        assert_eq!(parts[1], "abc123");
        assert_eq!(parts[2].len(), 32);
    }

    #[test]
    fn generate_produces_six_char_nonce() {
        let ds = generate();
        let parts: Vec<&str> = ds.split(',').collect();
        assert_eq!(parts[1].len(), 6);
    }
}
