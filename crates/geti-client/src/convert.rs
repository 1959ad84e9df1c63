// SPDX-License-Identifier: Apache-2.0
// Copyright © 2025 Au-Zone Technologies. All Rights Reserved.

//! Conversion helpers between wire values and typed domain values.
//!
//! The platform transmits enumerations and timestamps as text. This module
//! converts such values into the typed representation used by the data
//! models and back again:
//!
//! - [`enum_converter`] builds a coercion function for any [`WireEnum`], with
//!   [`str_to_task_type`], [`str_to_media_type`], [`str_to_shape_type`] and
//!   [`str_to_annotation_kind`] as ready-made specialisations.
//! - [`str_to_datetime`] parses ISO-8601 timestamps.
//! - [`attribute_to_wire`] renders enum and date-time values to their
//!   canonical text form for transmission.
//! - [`round_dictionary`] replaces floats in nested JSON by fixed-decimal
//!   strings.
//! - [`image_from_buffer`] decodes an encoded image into a pixel grid.
//!
//! # Examples
//!
//! ```rust
//! use geti_client::{TaskType, str_to_task_type};
//!
//! let task_type = str_to_task_type("detection").unwrap();
//! assert_eq!(task_type, TaskType::Detection);
//!
//! // Already typed values pass through unchanged.
//! assert_eq!(str_to_task_type(TaskType::Crop).unwrap(), TaskType::Crop);
//!
//! assert!(str_to_task_type("not-a-task").is_err());
//! ```

use crate::{
    Error,
    models::{AnnotationKind, MediaType, ShapeType, TaskType},
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use image::RgbImage;
use serde::{Deserialize, Deserializer, Serializer};
use serde_json::Value;

/// Number of decimals used by [`round_dictionary`] when writing annotation
/// files.
pub const DEFAULT_DECIMAL_PLACES: usize = 3;

/// A closed set of string-tagged variants as transmitted by the platform.
pub trait WireEnum: Copy + Eq + Sized + 'static {
    /// Type name used in error messages.
    const NAME: &'static str;
    /// Every variant of the enumeration.
    const VARIANTS: &'static [Self];

    /// The wire representation of this variant.
    fn as_wire_str(&self) -> &'static str;

    /// Looks up the variant whose wire representation is `value`.
    fn from_wire_str(value: &str) -> Result<Self, Error> {
        Self::VARIANTS
            .iter()
            .find(|variant| variant.as_wire_str() == value)
            .copied()
            .ok_or_else(|| {
                Error::InvalidValue(format!(
                    "'{}' is not a valid {}, expected one of: {}",
                    value,
                    Self::NAME,
                    Self::VARIANTS
                        .iter()
                        .map(|v| v.as_wire_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ))
            })
    }
}

/// Input accepted by the coercion functions: either the already typed value,
/// its textual wire form, or some other JSON value which cannot be coerced.
#[derive(Clone, Debug, PartialEq)]
pub enum Coercible<T> {
    /// Already the target type.
    Typed(T),
    /// Textual wire representation.
    Text(String),
    /// Any other value; coercing it is an error.
    Other(Value),
}

impl<T> From<&str> for Coercible<T> {
    fn from(value: &str) -> Self {
        Coercible::Text(value.to_string())
    }
}

impl<T> From<String> for Coercible<T> {
    fn from(value: String) -> Self {
        Coercible::Text(value)
    }
}

impl<T> From<Value> for Coercible<T> {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => Coercible::Text(text),
            other => Coercible::Other(other),
        }
    }
}

impl From<DateTime<Utc>> for Coercible<DateTime<Utc>> {
    fn from(value: DateTime<Utc>) -> Self {
        Coercible::Typed(value)
    }
}

/// Coerces `input` into the enumeration `E`.
pub fn coerce_enum<E: WireEnum>(input: Coercible<E>) -> Result<E, Error> {
    match input {
        Coercible::Typed(value) => Ok(value),
        Coercible::Text(text) => E::from_wire_str(&text),
        Coercible::Other(value) => Err(Error::InvalidValue(format!(
            "Cannot convert value {} to enum {}",
            value,
            E::NAME
        ))),
    }
}

/// Builds a converter function for the enumeration `E`.
///
/// ```rust
/// use geti_client::{MediaType, enum_converter};
///
/// let to_media_type = enum_converter::<MediaType>();
/// assert_eq!(to_media_type("video".into()).unwrap(), MediaType::Video);
/// ```
pub fn enum_converter<E: WireEnum>() -> fn(Coercible<E>) -> Result<E, Error> {
    coerce_enum::<E>
}

pub fn str_to_task_type(value: impl Into<Coercible<TaskType>>) -> Result<TaskType, Error> {
    enum_converter::<TaskType>()(value.into())
}

pub fn str_to_media_type(value: impl Into<Coercible<MediaType>>) -> Result<MediaType, Error> {
    enum_converter::<MediaType>()(value.into())
}

pub fn str_to_shape_type(value: impl Into<Coercible<ShapeType>>) -> Result<ShapeType, Error> {
    enum_converter::<ShapeType>()(value.into())
}

pub fn str_to_annotation_kind(
    value: impl Into<Coercible<AnnotationKind>>,
) -> Result<AnnotationKind, Error> {
    enum_converter::<AnnotationKind>()(value.into())
}

/// Converts an optional ISO-8601 timestamp into a UTC date-time.
///
/// Timestamps carrying an offset are converted to UTC; naive timestamps are
/// read as UTC. Structured values pass through and absence (or JSON `null`)
/// maps to `None`.
pub fn str_to_datetime(
    value: Option<Coercible<DateTime<Utc>>>,
) -> Result<Option<DateTime<Utc>>, Error> {
    match value {
        None | Some(Coercible::Other(Value::Null)) => Ok(None),
        Some(Coercible::Typed(datetime)) => Ok(Some(datetime)),
        Some(Coercible::Text(text)) => parse_iso8601(&text).map(Some),
        Some(Coercible::Other(value)) => Err(Error::InvalidValue(format!(
            "Cannot convert value {} to a datetime",
            value
        ))),
    }
}

fn parse_iso8601(text: &str) -> Result<DateTime<Utc>, Error> {
    let text = text.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Ok(datetime.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(datetime) = DateTime::parse_from_str(text, format) {
            return Ok(datetime.with_timezone(&Utc));
        }
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        && let Some(naive) = date.and_hms_opt(0, 0, 0)
    {
        return Ok(naive.and_utc());
    }

    Err(Error::InvalidValue(format!(
        "'{}' is not an ISO-8601 timestamp",
        text
    )))
}

/// Canonical text form of a timestamp, e.g. `2022-03-04T10:11:12.345+00:00`.
pub fn datetime_to_wire(datetime: &DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

/// A model attribute on its way to the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum AttributeValue {
    /// Variant of an enumerated domain value, by wire name.
    Enum(&'static str),
    /// A timestamp.
    DateTime(DateTime<Utc>),
    /// Anything else, transmitted as is.
    Other(Value),
}

impl From<DateTime<Utc>> for AttributeValue {
    fn from(value: DateTime<Utc>) -> Self {
        AttributeValue::DateTime(value)
    }
}

impl From<Value> for AttributeValue {
    fn from(value: Value) -> Self {
        AttributeValue::Other(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::Other(Value::String(value.to_string()))
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::Other(Value::String(value))
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Other(Value::from(value))
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Other(Value::from(value))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Other(Value::Bool(value))
    }
}

impl<V: Into<AttributeValue>> From<Option<V>> for AttributeValue {
    fn from(value: Option<V>) -> Self {
        match value {
            Some(value) => value.into(),
            None => AttributeValue::Other(Value::Null),
        }
    }
}

/// Renders an attribute to the value sent over the wire.
///
/// Enumerated values become their wire string and timestamps their ISO-8601
/// form; every other value is returned unchanged. Never fails.
pub fn attribute_to_wire(value: impl Into<AttributeValue>) -> Value {
    match value.into() {
        AttributeValue::Enum(name) => Value::String(name.to_string()),
        AttributeValue::DateTime(datetime) => Value::String(datetime_to_wire(&datetime)),
        AttributeValue::Other(value) => value,
    }
}

/// Replaces every floating point number in `input` by its string
/// representation with `decimal_places` decimals.
///
/// Objects and arrays are walked recursively; integers, strings, booleans and
/// nulls are left untouched and the nesting structure is preserved.
///
/// ```rust
/// use geti_client::round_dictionary;
/// use serde_json::json;
///
/// let rounded = round_dictionary(json!({"x": 0.12345, "points": [1.5, 2]}), 3);
/// assert_eq!(rounded, json!({"x": "0.123", "points": ["1.500", 2]}));
/// ```
pub fn round_dictionary(input: Value, decimal_places: usize) -> Value {
    match input {
        Value::Number(number) if number.is_f64() => match number.as_f64() {
            Some(float) => Value::String(format!("{:.*}", decimal_places, float)),
            None => Value::Number(number),
        },
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| round_dictionary(item, decimal_places))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, round_dictionary(value, decimal_places)))
                .collect(),
        ),
        other => other,
    }
}

/// Decodes an encoded image (JPEG, PNG, BMP, TIFF or WebP) into an RGB pixel
/// grid.
pub fn image_from_buffer(buffer: &[u8]) -> Result<RgbImage, Error> {
    if buffer.is_empty() {
        return Err(Error::Decode("empty image buffer".to_string()));
    }
    let decoded = image::load_from_memory(buffer)?;
    Ok(decoded.to_rgb8())
}

pub(crate) fn deserialize_datetime<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    str_to_datetime(value.map(Coercible::from)).map_err(serde::de::Error::custom)
}

pub(crate) fn serialize_datetime<S>(
    value: &Option<DateTime<Utc>>,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(datetime) => serializer.serialize_str(&datetime_to_wire(datetime)),
        None => serializer.serialize_none(),
    }
}

/// Accepts a JSON number or a numeric string, so that annotation files written
/// through [`round_dictionary`] load back.
pub(crate) fn deserialize_lenient_f64<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(number) => Ok(number),
        NumberOrText::Text(text) => text
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("'{}' is not a number", text))),
    }
}

/// Declares an enumerated domain value with its wire strings.
///
/// Generates the enum, its [`WireEnum`] implementation, `Display`, `FromStr`,
/// `TryFrom<&str>` and serde implementations that go through
/// [`coerce_enum`].
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$variant_meta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$variant_meta])* $variant ),+
        }

        impl $crate::convert::WireEnum for $name {
            const NAME: &'static str = stringify!($name);
            const VARIANTS: &'static [Self] = &[ $( $name::$variant ),+ ];

            fn as_wire_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", $crate::convert::WireEnum::as_wire_str(self))
            }
        }

        impl TryFrom<&str> for $name {
            type Error = $crate::Error;

            fn try_from(s: &str) -> Result<Self, Self::Error> {
                <$name as $crate::convert::WireEnum>::from_wire_str(s)
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.try_into()
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str($crate::convert::WireEnum::as_wire_str(self))
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let value = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
                $crate::convert::coerce_enum::<$name>(value.into())
                    .map_err(serde::de::Error::custom)
            }
        }

        impl From<$name> for $crate::convert::Coercible<$name> {
            fn from(value: $name) -> Self {
                $crate::convert::Coercible::Typed(value)
            }
        }

        impl From<$name> for $crate::convert::AttributeValue {
            fn from(value: $name) -> Self {
                $crate::convert::AttributeValue::Enum(
                    $crate::convert::WireEnum::as_wire_str(&value),
                )
            }
        }
    };
}

pub(crate) use wire_enum;
