//! Staging file format

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// When the writer puts quotes around a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotingPolicy {
    /// Quote only fields containing the delimiter, quote char, escape char or a line break
    #[default]
    Minimal,
    /// Quote every field
    #[serde(alias = "always")]
    All,
    /// Quote every field that is not a number
    NonNumeric,
    /// Never quote; special characters are prefixed with the escape char
    None,
}

impl QuotingPolicy {
    fn csv_style(self) -> csv::QuoteStyle {
        match self {
            QuotingPolicy::Minimal => csv::QuoteStyle::Necessary,
            QuotingPolicy::All => csv::QuoteStyle::Always,
            QuotingPolicy::NonNumeric => csv::QuoteStyle::NonNumeric,
            QuotingPolicy::None => csv::QuoteStyle::Never,
        }
    }
}

/// Delimiter/quote/escape rules shared by the stager and the loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingFormat {
    /// Field delimiter (default `\x01`, Hive's default field terminator)
    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Quote character
    #[serde(default = "default_quote_char", alias = "quotechar")]
    pub quote_char: char,

    /// Escape character, if any
    #[serde(default, alias = "escapechar")]
    pub escape_char: Option<char>,

    /// Quoting policy
    #[serde(default)]
    pub quoting: QuotingPolicy,
}

fn default_delimiter() -> char {
    '\x01'
}

fn default_quote_char() -> char {
    '"'
}

impl Default for StagingFormat {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            quote_char: default_quote_char(),
            escape_char: None,
            quoting: QuotingPolicy::default(),
        }
    }
}

impl StagingFormat {
    /// Create a format with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field delimiter
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the quote character
    #[must_use]
    pub fn with_quote_char(mut self, quote_char: char) -> Self {
        self.quote_char = quote_char;
        self
    }

    /// Set the escape character
    #[must_use]
    pub fn with_escape_char(mut self, escape_char: char) -> Self {
        self.escape_char = Some(escape_char);
        self
    }

    /// Set the quoting policy
    #[must_use]
    pub fn with_quoting(mut self, quoting: QuotingPolicy) -> Self {
        self.quoting = quoting;
        self
    }

    /// Check that every special character is a distinct single-byte ASCII char
    pub fn validate(&self) -> Result<()> {
        let delimiter = ascii_byte("delimiter", self.delimiter)?;
        let quote = ascii_byte("quote_char", self.quote_char)?;
        if delimiter == quote {
            return Err(Error::invalid_value(
                "quote_char",
                "must differ from the delimiter",
            ));
        }
        if let Some(escape) = self.escape_char {
            let escape = ascii_byte("escape_char", escape)?;
            if escape == delimiter || escape == quote {
                return Err(Error::invalid_value(
                    "escape_char",
                    "must differ from the delimiter and the quote char",
                ));
            }
        }
        if matches!(self.delimiter, '\n' | '\r') {
            return Err(Error::invalid_value(
                "delimiter",
                "line breaks cannot be used as a delimiter",
            ));
        }
        Ok(())
    }

    pub(crate) fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub(crate) fn quote_byte(&self) -> u8 {
        self.quote_char as u8
    }

    pub(crate) fn escape_byte(&self) -> Option<u8> {
        self.escape_char.map(|c| c as u8)
    }

    /// csv writer configured for the quoting policies the csv crate handles
    pub(crate) fn csv_writer_builder(&self) -> csv::WriterBuilder {
        let mut builder = csv::WriterBuilder::new();
        builder
            .has_headers(false)
            .delimiter(self.delimiter_byte())
            .quote(self.quote_byte())
            .quote_style(self.quoting.csv_style())
            .terminator(csv::Terminator::Any(b'\n'));
        if let Some(escape) = self.escape_byte() {
            builder.double_quote(false).escape(escape);
        }
        builder
    }

    /// csv reader matching [`Self::csv_writer_builder`]
    pub(crate) fn csv_reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter_byte())
            .quote(self.quote_byte())
            .terminator(csv::Terminator::Any(b'\n'));
        if let Some(escape) = self.escape_byte() {
            builder.double_quote(false).escape(Some(escape));
        }
        builder
    }
}

fn ascii_byte(field: &str, c: char) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(Error::invalid_value(
            field,
            format!("{c:?} is not a single-byte ASCII character"),
        ))
    }
}
