use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use std::{fmt, str::FromStr};
use thiserror::Error;

/// 1-based ordinal of a row within its sheet.
///
/// Rows are never inserted or removed while a run is in flight, so the
/// ordinal is a stable back-reference into the sheet's row storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowId(usize);

impl RowId {
    pub const FIRST: RowId = RowId(1);

    /// Builds a row id from a 1-based ordinal; `0` is clamped to the first row.
    pub fn new(ordinal: usize) -> Self {
        Self(ordinal.max(1))
    }

    pub fn from_index(index: usize) -> Self {
        Self(index + 1)
    }

    pub fn ordinal(self) -> usize {
        self.0
    }

    /// 0-based offset into the sheet's row storage.
    pub fn index(self) -> usize {
        self.0 - 1
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ColumnParseError {
    #[error("Column reference is empty")]
    Empty,

    #[error("Column numbers start at 1")]
    Zero,

    #[error("Invalid column reference: {0}")]
    Invalid(String),
}

/// 1-based column position, written either as a number (`2`) or in
/// spreadsheet letters (`B`, `AA`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Column(usize);

impl Column {
    /// Column from an ordinal known to be non-zero; panics on `0`.
    pub const fn nth(ordinal: usize) -> Self {
        assert!(ordinal > 0, "column ordinals start at 1");
        Self(ordinal)
    }

    pub fn new(ordinal: usize) -> Result<Self, ColumnParseError> {
        if ordinal == 0 {
            return Err(ColumnParseError::Zero);
        }
        Ok(Self(ordinal))
    }

    pub fn from_letters(letters: &str) -> Result<Self, ColumnParseError> {
        if letters.is_empty() {
            return Err(ColumnParseError::Empty);
        }

        let mut ordinal: usize = 0;
        for ch in letters.chars() {
            if !ch.is_ascii_alphabetic() {
                return Err(ColumnParseError::Invalid(letters.to_string()));
            }
            let digit = (ch.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
            ordinal = ordinal
                .checked_mul(26)
                .and_then(|v| v.checked_add(digit))
                .ok_or_else(|| ColumnParseError::Invalid(letters.to_string()))?;
        }

        Ok(Self(ordinal))
    }

    pub fn ordinal(self) -> usize {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 - 1
    }

    pub fn letters(self) -> String {
        let mut n = self.0;
        let mut out = Vec::new();
        while n > 0 {
            let rem = (n - 1) % 26;
            out.push((b'A' + rem as u8) as char);
            n = (n - 1) / 26;
        }
        out.iter().rev().collect()
    }
}

impl FromStr for Column {
    type Err = ColumnParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ColumnParseError::Empty);
        }
        match s.parse::<usize>() {
            Ok(ordinal) => Column::new(ordinal),
            Err(_) => Column::from_letters(s),
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.letters())
    }
}

impl Serialize for Column {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.letters())
    }
}

impl<'de> Deserialize<'de> for Column {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawColumn {
            Number(usize),
            Text(String),
        }

        match RawColumn::deserialize(deserializer)? {
            RawColumn::Number(n) => Column::new(n).map_err(de::Error::custom),
            RawColumn::Text(s) => s.parse().map_err(de::Error::custom),
        }
    }
}

/// Opaque identifier the remote check service assigns to a job.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for JobId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Some deployments of the service return numeric ids.
impl<'de> Deserialize<'de> for JobId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::String(s) => Ok(JobId::new(s)),
            serde_json::Value::Number(n) => Ok(JobId::new(n.to_string())),
            other => Err(de::Error::custom(format!("invalid job id: {other}"))),
        }
    }
}
