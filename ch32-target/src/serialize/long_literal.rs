use serde::{self, de::Visitor, Deserializer, Serializer};

/// Serializes a number as a C `long` literal, e.g. `48000000L`.
pub fn serialize<S>(value: &u64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(format!("{value}L").as_str())
}

/// Accepts both the literal form and a plain integer.
pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    struct LongLiteral;

    impl Visitor<'_> for LongLiteral {
        type Value = u64;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("an integer or a long literal like `48000000L`")
        }

        fn visit_u64<E>(self, value: u64) -> Result<u64, E>
        where
            E: serde::de::Error,
        {
            Ok(value)
        }

        fn visit_i64<E>(self, value: i64) -> Result<u64, E>
        where
            E: serde::de::Error,
        {
            u64::try_from(value).map_err(E::custom)
        }

        fn visit_str<E>(self, value: &str) -> Result<u64, E>
        where
            E: serde::de::Error,
        {
            let digits = value.trim_end_matches(['L', 'l']);
            parse_int::parse::<u64>(digits).map_err(|error| {
                E::custom(format!("invalid long literal `{value}`: {error}"))
            })
        }
    }

    deserializer.deserialize_any(LongLiteral)
}
