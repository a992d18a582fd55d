//! Identifier and ARN generation for identity resources.
//!
//! Identifiers follow the provider's shape: a four-letter type prefix
//! followed by 17 characters from the base-32-ish uppercase alphabet
//! (`AIDA...` for users, `AROA...` for roles, `AKIA...` for access keys).

use rand::Rng;

/// The fixed account every emulated resource belongs to.
pub const ACCOUNT_ID: &str = "123456789012";

/// Provider identifier alphabet (uppercase letters and digits 2-7).
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

/// Generate a prefixed resource identifier, e.g. `AIDAJQABLZS4A3QDU576Q`.
#[must_use]
pub fn resource_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..17)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{prefix}{suffix}")
}

/// Build an identity-service ARN: `arn:aws:iam::<account>:<type>/<name>`.
#[must_use]
pub fn arn(resource_type: &str, path: &str, name: &str) -> String {
    // Paths always begin and end with '/'; the default path is "/".
    format!("arn:aws:iam::{ACCOUNT_ID}:{resource_type}{path}{name}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_have_prefix_and_length() {
        let id = resource_id("AIDA");
        assert_eq!(id.len(), 21);
        assert!(id.starts_with("AIDA"));
        assert!(id.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn ids_are_unlikely_to_collide() {
        let a = resource_id("AKIA");
        let b = resource_id("AKIA");
        assert_ne!(a, b);
    }

    #[test]
    fn arn_shape() {
        assert_eq!(
            arn("user", "/", "alice"),
            "arn:aws:iam::123456789012:user/alice"
        );
        assert_eq!(
            arn("role", "/service/", "deployer"),
            "arn:aws:iam::123456789012:role/service/deployer"
        );
    }
}
