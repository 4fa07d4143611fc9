//! Domain Layer - Core Entity Trait
//!
//! Every persisted entity maps to one backend table and travels as a JSON row.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone + Serialize + DeserializeOwned {
    /// Backend table holding rows of this entity
    const TABLE: &'static str;

    /// Server-assigned identifier, `None` until the entity is first stored
    fn id(&self) -> Option<&str>;

    /// Applied to every entity decoded from a backend row
    fn after_load(&mut self) {}
}

/// Deserialize `null` as the type's default value.
///
/// Text columns come back as `null` when the row was written by an older
/// client that did not set them.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Deserialize an identifier that may be stored as text or as a number
pub(crate) fn optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(i64),
    }

    Ok(Option::<RawId>::deserialize(deserializer)?.map(|raw| match raw {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    }))
}
