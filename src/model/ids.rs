//! Numeric identifiers shared by every service.
//!
//! On the wire an id is a decimal string (`"42"`). Inbound payloads and query strings may
//! carry either the string or the bare number.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

pub(crate) fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match RawId::deserialize(deserializer)? {
        RawId::Number(id) => Ok(id),
        RawId::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid id: {text:?}"))),
    }
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u64);

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map(Self)
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                $crate::model::ids::deserialize_id(deserializer).map(Self)
            }
        }
    };
}

record_id!(
    /// Customer registry key.
    CustomerId
);
record_id!(
    /// Order ledger key.
    OrderId
);
record_id!(
    /// Factory-assigned key of a production job and of the robot it produces.
    SerialNumber
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_strings() {
        assert_eq!(serde_json::to_string(&OrderId(17)).unwrap(), "\"17\"");
    }

    #[test]
    fn ids_accept_strings_and_numbers() {
        let from_text: SerialNumber = serde_json::from_str("\"42\"").unwrap();
        let from_number: SerialNumber = serde_json::from_str("42").unwrap();
        assert_eq!(from_text, SerialNumber(42));
        assert_eq!(from_number, SerialNumber(42));
        assert!(serde_json::from_str::<CustomerId>("\"forty-two\"").is_err());
        assert!(serde_json::from_str::<CustomerId>("-1").is_err());
    }
}
