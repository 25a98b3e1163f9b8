//! Byte codecs used by byte-backed drivers.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::DriverResult;

/// Converts a collection of shape `S` to and from its durable byte form.
pub trait Codec<S>: Send + Sync {
    /// Short name for log output.
    fn name(&self) -> &'static str;

    fn encode(&self, data: &S) -> DriverResult<Vec<u8>>;

    fn decode(&self, bytes: &[u8]) -> DriverResult<S>;
}

/// JSON codec (`serde_json`).
///
/// Map-shaped collections need string-like keys to be representable.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl<S> Codec<S> for JsonCodec
where
    S: Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode(&self, data: &S) -> DriverResult<Vec<u8>> {
        Ok(serde_json::to_vec(data)?)
    }

    fn decode(&self, bytes: &[u8]) -> DriverResult<S> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Compact binary codec (`bincode`).
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

impl<S> Codec<S> for BincodeCodec
where
    S: Serialize + DeserializeOwned,
{
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode(&self, data: &S) -> DriverResult<Vec<u8>> {
        Ok(bincode::serialize(data)?)
    }

    fn decode(&self, bytes: &[u8]) -> DriverResult<S> {
        Ok(bincode::deserialize(bytes)?)
    }
}
