//! Field encodings for the persisted JSON blobs.
//!
//! The blobs were first written by the mobile app's JSON coder, so identifiers,
//! binary fields and dates keep that coder's shapes:
//! - UUIDs as uppercase hyphenated strings
//! - byte blobs as standard base64 strings
//! - dates as fractional seconds since 2001-01-01T00:00:00Z

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serializer};
use uuid::Uuid;

/// Seconds between the Unix epoch and 2001-01-01T00:00:00Z.
pub const REFERENCE_EPOCH_SECS: i64 = 978_307_200;

const MICROS_PER_SEC: i64 = 1_000_000;

pub mod uuid_upper {
    use super::*;

    pub fn serialize<S: Serializer>(id: &Uuid, serializer: S) -> Result<S::Ok, S::Error> {
        let mut buf = Uuid::encode_buffer();
        serializer.serialize_str(id.hyphenated().encode_upper(&mut buf))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Uuid, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Uuid::parse_str(&raw).map_err(<D::Error as DeError>::custom)
    }
}

pub mod base64_bytes {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw.as_bytes()).map_err(<D::Error as DeError>::custom)
    }
}

pub mod base64_list {
    use super::*;
    use serde::ser::SerializeSeq;

    pub fn serialize<S: Serializer>(blobs: &[Vec<u8>], serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(blobs.len()))?;
        for blob in blobs {
            seq.serialize_element(&STANDARD.encode(blob))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<Vec<u8>>, D::Error> {
        let raw = Vec::<String>::deserialize(deserializer)?;
        raw.iter()
            .map(|item| STANDARD.decode(item.as_bytes()).map_err(<D::Error as DeError>::custom))
            .collect()
    }
}

/// Optional date stored as reference-epoch seconds, omitted when absent.
///
/// Values are kept to microsecond precision, which an f64 of this magnitude
/// carries without loss.
pub mod reference_date_opt {
    use super::*;

    pub fn serialize<S: Serializer>(
        date: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(date) => serializer.serialize_f64(to_reference_secs(date)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<f64>::deserialize(deserializer)? {
            Some(secs) => from_reference_secs(secs)
                .map(Some)
                .ok_or_else(|| <D::Error as DeError>::custom(format!("date out of range: {secs}"))),
            None => Ok(None),
        }
    }
}

pub fn to_reference_secs(date: &DateTime<Utc>) -> f64 {
    (date.timestamp_micros() - REFERENCE_EPOCH_SECS * MICROS_PER_SEC) as f64
        / MICROS_PER_SEC as f64
}

pub fn from_reference_secs(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let micros = (secs * MICROS_PER_SEC as f64).round() as i64;
    let unix_micros = micros.checked_add(REFERENCE_EPOCH_SECS * MICROS_PER_SEC)?;
    DateTime::<Utc>::from_timestamp_micros(unix_micros)
}
