//! Serde helpers for the device's JSON settings format

/// The device encodes booleans as `0`/`1` integers (`iEnabled: 1`)
pub mod int_flag {
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Int(i64),
        Bool(bool),
    }

    /// Serialize a flag as `0` or `1`
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(u8::from(*value))
    }

    /// Accept either an integer flag or a JSON boolean
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        Ok(match Flag::deserialize(deserializer)? {
            Flag::Int(value) => value != 0,
            Flag::Bool(value) => value,
        })
    }
}
