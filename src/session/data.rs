use chrono::Local;
use std::str::Utf8Error;

/// Column names written at the top of every run.
pub const HEADER: [&str; 5] = [
    "timestamp",
    "air_temperature",
    "air_humidity",
    "soil_temperature",
    "soil_humidity",
];

/// Local time, ISO-8601, whole seconds, no offset.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// One receive event decoded as text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reading {
    pub message: String, // trimmed payload, as printed to the console
    pub fields: Vec<String>,
}

/// One row of the log: timestamp followed by the reading's fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub timestamp: String,
    pub values: Vec<String>,
}

impl Record {
    pub fn new(timestamp: String, reading: Reading) -> Self {
        Record {
            timestamp,
            values: reading.fields,
        }
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.timestamp.as_str()).chain(self.values.iter().map(String::as_str))
    }
}

/// Treats the whole chunk as a single record, whatever its line structure.
/// Field count is not checked.
pub fn decode(chunk: &[u8]) -> Result<Reading, Utf8Error> {
    let message = std::str::from_utf8(chunk)?.trim_matches(is_padding);
    Ok(Reading {
        message: message.to_string(),
        fields: message.split(',').map(str::to_string).collect(),
    })
}

// Unicode whitespace plus the ASCII file/group/record/unit separators.
fn is_padding(c: char) -> bool {
    c.is_whitespace() || ('\x1c'..='\x1f').contains(&c)
}

pub fn timestamp_now() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}
