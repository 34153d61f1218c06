//! Key Shape Normalizer: `user:1042:profile` (hash) -> `user::profile:hash`.

use std::fmt;

use serde::Serialize;

/// Grouping identity: the key name with every ASCII digit removed, plus the type tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ShapeKey {
    pub pattern: String,
    pub key_type: String,
}

impl fmt::Display for ShapeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.pattern, self.key_type)
    }
}

pub fn normalize(key: &str, key_type: &str) -> ShapeKey {
    ShapeKey {
        pattern: key.chars().filter(|c| !c.is_ascii_digit()).collect(),
        key_type: key_type.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_digits_and_appends_type() {
        assert_eq!(normalize("user123:abc45", "string").to_string(), "user:abc:string");
    }

    #[test]
    fn all_digit_key_collapses_to_type() {
        assert_eq!(normalize("000", "list").to_string(), ":list");
    }

    #[test]
    fn same_structure_different_ids_share_a_shape() {
        assert_eq!(
            normalize("session:81:token", "hash"),
            normalize("session:7:token", "hash")
        );
        assert_ne!(
            normalize("session:81:token", "hash"),
            normalize("session:81:token", "string")
        );
    }

    #[test]
    fn non_ascii_digits_are_kept() {
        assert_eq!(normalize("clé٣", "set").pattern, "clé٣");
    }
}
