//! Serialization helpers attached to existing types

use error_stack::ResultExt;
use serde::{Deserialize, Serialize};

use crate::errors::{CustomResult, ParsingError};

/// Serialize any `Debug + Serialize` value to JSON, reporting the value on failure
pub trait Encode {
    /// Encode `self` as a JSON string
    fn encode_to_string_of_json(&self) -> CustomResult<String, ParsingError>;

    /// Encode `self` as a [`serde_json::Value`]
    fn encode_to_value(&self) -> CustomResult<serde_json::Value, ParsingError>;
}

impl<A> Encode for A
where
    A: Serialize + std::fmt::Debug + ?Sized,
{
    fn encode_to_string_of_json(&self) -> CustomResult<String, ParsingError> {
        serde_json::to_string(self)
            .change_context(ParsingError::EncodeError("json"))
            .attach_printable_lazy(|| format!("Unable to encode {self:?}"))
    }

    fn encode_to_value(&self) -> CustomResult<serde_json::Value, ParsingError> {
        serde_json::to_value(self)
            .change_context(ParsingError::EncodeError("json-value"))
            .attach_printable_lazy(|| format!("Unable to encode {self:?}"))
    }
}

/// Parse a JSON response body
pub trait ByteSliceExt {
    /// Deserialize `self` into `T`, naming `type_name` in the error
    fn parse_struct<'de, T>(&'de self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: Deserialize<'de>;
}

impl ByteSliceExt for [u8] {
    fn parse_struct<'de, T>(&'de self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: Deserialize<'de>,
    {
        serde_json::from_slice(self)
            .change_context(ParsingError::StructParseFailure(type_name))
            .attach_printable_lazy(|| {
                format!(
                    "Unable to parse {type_name} from {:?}",
                    String::from_utf8_lossy(self)
                )
            })
    }
}
