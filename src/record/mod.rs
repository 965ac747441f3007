pub mod synth;

pub use synth::Synthesizer;

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::net::Ipv4Addr;
use std::ops::Range;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Separator between fields of a rendered log line
pub const FIELD_SEPARATOR: char = '|';

/// Number of fields in a rendered log line
pub const FIELD_COUNT: usize = 9;

/// Message carried by every generated record
pub const MESSAGE: &str = "Request processed";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("expected 9 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid {field}: '{value}'")]
    InvalidField { field: &'static str, value: String },
}

impl ParseError {
    fn invalid(field: &'static str, value: &str) -> Self {
        ParseError::InvalidField {
            field,
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Debug,
    Warn,
    Error,
}

impl LogLevel {
    pub const ALL: [LogLevel; 4] = [
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Warn,
        LogLevel::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }

    /// HTTP status code reported for a request logged at this level
    pub fn status_code(&self) -> u16 {
        match self {
            LogLevel::Error => 500,
            LogLevel::Warn => 404,
            LogLevel::Info | LogLevel::Debug => 200,
        }
    }

    /// Half-open range of response times (ms) for a request logged at this level
    pub fn response_time_range(&self) -> Range<u32> {
        match self {
            LogLevel::Error => 500..2000,
            LogLevel::Warn | LogLevel::Info | LogLevel::Debug => 20..520,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogLevel::ALL
            .into_iter()
            .find(|level| level.as_str() == s)
            .ok_or_else(|| ParseError::invalid("level", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| ParseError::invalid("method", s))
    }
}

/// One synthetic server access log entry.
///
/// Rendered by `Display` as a single `|`-separated line (without a trailing
/// newline) and parsed back by `FromStr`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub correlation_id: Uuid,
    pub source_ip: Ipv4Addr,
    pub method: HttpMethod,
    pub endpoint: String,
    pub status_code: u16,
    pub response_time_ms: u32,
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sep = FIELD_SEPARATOR;
        write!(
            f,
            "{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}{sep}{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.level,
            self.correlation_id.hyphenated(),
            self.source_ip,
            self.method,
            self.endpoint,
            self.status_code,
            self.response_time_ms,
            self.message,
        )
    }
}

impl FromStr for LogRecord {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
        if fields.len() != FIELD_COUNT {
            return Err(ParseError::FieldCount(fields.len()));
        }

        let timestamp = DateTime::parse_from_rfc3339(fields[0])
            .map_err(|_| ParseError::invalid("timestamp", fields[0]))?
            .with_timezone(&Utc);
        let correlation_id =
            Uuid::parse_str(fields[2]).map_err(|_| ParseError::invalid("correlation id", fields[2]))?;
        let source_ip: Ipv4Addr = fields[3]
            .parse()
            .map_err(|_| ParseError::invalid("source ip", fields[3]))?;
        let status_code: u16 = fields[6]
            .parse()
            .map_err(|_| ParseError::invalid("status code", fields[6]))?;
        let response_time_ms: u32 = fields[7]
            .parse()
            .map_err(|_| ParseError::invalid("response time", fields[7]))?;

        Ok(LogRecord {
            timestamp,
            level: fields[1].parse()?,
            correlation_id,
            source_ip,
            method: fields[4].parse()?,
            endpoint: fields[5].to_string(),
            status_code,
            response_time_ms,
            message: fields[8].to_string(),
        })
    }
}
