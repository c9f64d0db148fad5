//! JSON records printed by the external parser.

use error_stack::Report;
use serde::Deserialize;
use serde::Deserializer;

use crate::core::ExtractedStat;
use crate::core::ExtractionError;
use crate::core::Provenance;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord {
    #[serde(deserialize_with = "deserialize_i64_from_string")]
    raw_data_length: i64,
    #[serde(deserialize_with = "deserialize_channel")]
    channel_number: String,
    #[serde(default, deserialize_with = "deserialize_optional_u64_from_string")]
    file_size: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64_from_string")]
    digitisation: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64_from_string")]
    offset: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64_from_string")]
    range: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_f64_from_string")]
    sampling_rate: Option<f64>,
}

impl From<WireRecord> for ExtractedStat {
    fn from(record: WireRecord) -> Self {
        ExtractedStat {
            raw_data_length: record.raw_data_length,
            channel: record.channel_number,
            provenance: Provenance {
                file_size: record.file_size,
                digitisation: record.digitisation,
                offset: record.offset,
                range: record.range,
                sampling_rate: record.sampling_rate,
            },
        }
    }
}

/// Parses the parser's stdout: a JSON array with one object per read.
///
/// # Errors
///
/// - [`ExtractionError::MalformedOutput`] if the output is not such an array
///   or any record has a missing or unparseable field
pub fn parse_output(stdout: &[u8]) -> Result<Vec<ExtractedStat>, Report<ExtractionError>> {
    let records: Vec<WireRecord> = serde_json::from_slice(stdout).map_err(|e| {
        Report::new(ExtractionError::MalformedOutput {
            message: e.to_string(),
        })
    })?;
    Ok(records.into_iter().map(ExtractedStat::from).collect())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrInteger {
    String(String),
    Integer(i64),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrFloat {
    String(String),
    Float(f64),
}

fn deserialize_i64_from_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match StringOrInteger::deserialize(deserializer)? {
        StringOrInteger::String(s) => s.trim().parse::<i64>().map_err(|e| {
            serde::de::Error::custom(format!("Failed to parse integer from string '{s}': {e}"))
        }),
        StringOrInteger::Integer(i) => Ok(i),
    }
}

fn deserialize_channel<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let channel = match StringOrInteger::deserialize(deserializer)? {
        StringOrInteger::String(s) => s.trim().to_string(),
        StringOrInteger::Integer(i) => i.to_string(),
    };
    if channel.is_empty() {
        return Err(serde::de::Error::custom("empty channel number"));
    }
    Ok(channel)
}

fn deserialize_optional_u64_from_string<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrInteger>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrInteger::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrInteger::String(s)) => s.trim().parse::<u64>().map(Some).map_err(|e| {
            serde::de::Error::custom(format!("Failed to parse integer from string '{s}': {e}"))
        }),
        Some(StringOrInteger::Integer(i)) => u64::try_from(i)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("negative file size {i}"))),
    }
}

fn deserialize_optional_f64_from_string<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<StringOrFloat>::deserialize(deserializer)? {
        None => Ok(None),
        Some(StringOrFloat::String(s)) if s.trim().is_empty() => Ok(None),
        Some(StringOrFloat::String(s)) => s.trim().parse::<f64>().map(Some).map_err(|e| {
            serde::de::Error::custom(format!("Failed to parse float from string '{s}': {e}"))
        }),
        Some(StringOrFloat::Float(f)) => Ok(Some(f)),
    }
}
