use crate::entity_actor::EntityError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a tracked entity. Doubles as its routing key.
    EntityId
);

string_id!(
    /// Network address a member is reachable at, e.g. `10.0.0.4:8080`.
    MemberAddress
);

string_id!(
    /// Routing bucket an entity belongs to, rendered in decimal.
    ShardId
);

impl ShardId {
    /// Derives the shard for a routing key.
    ///
    /// Every member computes the same bucket for the same key: the hash is a fixed 31-based
    /// polynomial over the key's UTF-16 units, taken modulo `shard_count`. Blank keys cannot
    /// be placed and are rejected.
    pub fn from_routing_key(key: &str, shard_count: u32) -> Result<Self, EntityError> {
        if key.trim().is_empty() {
            return Err(EntityError::MalformedRoutingKey(key.to_string()));
        }
        let hash = key
            .encode_utf16()
            .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(i32::from(unit)));
        let bucket = hash.unsigned_abs() % shard_count.max(1);
        Ok(Self(bucket.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shard_is_stable_and_in_range() {
        let first = ShardId::from_routing_key("entity-17", 16).unwrap();
        let second = ShardId::from_routing_key("entity-17", 16).unwrap();
        assert_eq!(first, second);

        let bucket: u32 = first.as_str().parse().unwrap();
        assert!(bucket < 16);
    }

    #[test]
    fn test_known_bucket() {
        // "a" hashes to 97.
        assert_eq!(ShardId::from_routing_key("a", 10).unwrap().as_str(), "7");
    }

    #[test]
    fn test_blank_key_is_malformed() {
        for key in ["", "   "] {
            let err = ShardId::from_routing_key(key, 16).unwrap_err();
            assert!(matches!(err, EntityError::MalformedRoutingKey(_)));
        }
    }

    #[test]
    fn test_ids_serialize_as_plain_strings() {
        let id = EntityId::new("e1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"e1\"");
    }
}
