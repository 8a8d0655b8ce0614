mod statvault;
mod store;

pub use statvault::StatvaultError;
pub use store::StoreError;

use serde::Serializer;
use std::fmt::Display;

pub trait IsRetryable {
    fn is_retryable(&self) -> bool;
}

/// Serialize an error through its `Display` impl so reports stay JSON friendly.
pub(crate) fn serialize_display<T, S>(value: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    serializer.collect_str(value)
}

pub(crate) fn serialize_optional_display<T, S>(
    value: &Option<T>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    T: Display,
    S: Serializer,
{
    match value {
        Some(value) => serializer.collect_str(value),
        None => serializer.serialize_none(),
    }
}
