//! Identifier generation for network/compute resources.
//!
//! IDs follow the provider's long-ID shape: a type prefix, a dash, and 17
//! lowercase hex characters (`vpc-0a1b2c3d4e5f60718`).

use rand::Rng;

const HEX: &[u8] = b"0123456789abcdef";

/// Generate a prefixed resource identifier, e.g. `subnet-0f2e1d3c4b5a69788`.
#[must_use]
pub fn resource_id(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..17)
        .map(|_| HEX[rng.gen_range(0..HEX.len())] as char)
        .collect();
    format!("{prefix}-{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_shape() {
        let id = resource_id("vpc");
        assert!(id.starts_with("vpc-"));
        assert_eq!(id.len(), 4 + 17);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn ids_are_unlikely_to_collide() {
        assert_ne!(resource_id("i"), resource_id("i"));
    }
}
