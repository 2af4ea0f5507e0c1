use serde::{self, Deserialize, Deserializer, Serializer};

/// Serializes a USB id as an upper-case hex string with four digits, e.g. `0x1A86`.
pub fn serialize<S>(id: &u16, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(format!("{:#06X}", id).as_str())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    parse_int::parse::<u16>(&text).map_err(|error| {
        serde::de::Error::custom(format!("invalid USB id `{text}`: {error}"))
    })
}
