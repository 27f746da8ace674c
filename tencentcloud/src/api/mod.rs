//! TencentCloud API v3 access: signing, transport, error classification and
//! per-action pacing, plus the request shapes of the Live and TSF actions

pub mod client;
pub mod error;
pub mod live;
pub mod ratelimit;
pub mod signer;
pub mod tsf;

pub use client::{ApiCall, Client, ClientConfig, CloudApi, Service};
pub use error::{ApiError, ErrorClass, RETRYABLE_ERROR_CODES};
pub use ratelimit::{ActionRateLimit, RateLimiter};
pub use signer::Credential;

use serde::{Deserialize, Deserializer};

/// Reads a block that Terraform state holds as a list of at most one element
/// but the API expects as a plain object
pub(crate) fn single_block<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany<T> {
        Many(Vec<T>),
        One(T),
    }

    Ok(match Option::<OneOrMany<T>>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::Many(items)) => items.into_iter().next(),
        Some(OneOrMany::One(item)) => Some(item),
    })
}

/// Reads an integer that Terraform state keeps as a string, e.g. a TSF task's
/// `success_ratio` of "100"
pub(crate) fn integer_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IntOrString {
        Int(i64),
        String(String),
    }

    match Option::<IntOrString>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntOrString::Int(value)) => Ok(Some(value)),
        Some(IntOrString::String(text)) => text.trim().parse().map(Some).map_err(|_| {
            serde::de::Error::custom(format!("expected an integer, got '{}'", text))
        }),
    }
}
