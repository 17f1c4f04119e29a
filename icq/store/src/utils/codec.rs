use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A trait that defines how types are decoded/encoded.
pub trait Codec {
    type Value;
    type Encoded: AsRef<[u8]>;

    fn encode(value: &Self::Value) -> Option<Self::Encoded>;

    fn decode(bytes: &[u8]) -> Option<Self::Value>;
}

/// A JSON codec that uses `serde_json` to encode/decode as a JSON string
#[derive(Clone, Debug)]
pub struct JsonCodec<T>(PhantomData<T>);

impl<T: Serialize + DeserializeOwned> Codec for JsonCodec<T> {
    type Value = T;
    type Encoded = String;

    fn encode(value: &Self::Value) -> Option<Self::Encoded> {
        serde_json::to_string(value).ok()
    }

    fn decode(bytes: &[u8]) -> Option<Self::Value> {
        let json_string = String::from_utf8(bytes.to_vec()).ok()?;
        serde_json::from_str(&json_string).ok()
    }
}

/// A codec for paths with no associated value, i.e. set membership markers
#[derive(Clone, Debug)]
pub struct NullCodec;

impl Codec for NullCodec {
    type Value = ();
    type Encoded = Vec<u8>;

    fn encode(_value: &Self::Value) -> Option<Self::Encoded> {
        Some(vec![])
    }

    fn decode(_bytes: &[u8]) -> Option<Self::Value> {
        Some(())
    }
}
