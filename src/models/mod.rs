use serde::{Deserialize, Deserializer};

pub mod attempt;
pub mod mailing;
pub mod message;
pub mod recipient;
pub mod user;

/// Keeps `null` distinct from an absent field: absent => None, null => Some(None).
pub(crate) fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
