//! Parsed GDB/MI output record

use crate::mi::error::MiSyntaxError;
use crate::mi::types::*;
use serde::Serialize;
use std::fmt;

/// One line of GDB/MI output after parsing.
///
/// `results` is never absent; records without a payload, and records
/// whose payload could not be parsed, carry an empty list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiRecord {
    pub(crate) kind: MiRecordKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) token: Option<u64>,
    pub(crate) class: String,
    pub(crate) results: MiTList,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) stream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) syntax_error: Option<MiSyntaxError>,
}

impl MiRecord {
    pub(crate) fn empty(kind: MiRecordKind) -> Self {
        Self {
            kind,
            token: None,
            class: String::new(),
            results: MiTList::new(),
            stream: None,
            syntax_error: None,
        }
    }

    pub fn kind(&self) -> MiRecordKind {
        self.kind
    }

    /// Numeric prefix echoing the command token, e.g. `15` in `15^done`
    pub fn token(&self) -> Option<u64> {
        self.token
    }

    /// Raw class text: `done`, `stopped`, `breakpoint-created`, ...
    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn results(&self) -> &MiTList {
        &self.results
    }

    /// Decoded text of a stream record; the raw line for unknown records
    pub fn stream(&self) -> Option<&str> {
        self.stream.as_deref()
    }

    /// Set when the line was not well-formed; `results` then holds the
    /// part that parsed.
    pub fn syntax_error(&self) -> Option<&MiSyntaxError> {
        self.syntax_error.as_ref()
    }

    pub fn is_stream(&self) -> bool {
        self.kind.is_stream()
    }

    pub fn is_async(&self) -> bool {
        self.kind.is_async()
    }

    pub fn is_prompt(&self) -> bool {
        self.kind == MiRecordKind::Prompt
    }

    /// `^error`
    pub fn is_error(&self) -> bool {
        self.kind == MiRecordKind::Result && self.class == "error"
    }

    /// The `msg` of an `^error` record
    pub fn error_message(&self) -> Option<&str> {
        if self.is_error() {
            self.results.const_value("msg")
        } else {
            None
        }
    }

    pub fn result_class(&self) -> Option<ResultClass> {
        (self.kind == MiRecordKind::Result).then(|| ResultClass::from(self.class.as_str()))
    }

    pub fn async_class(&self) -> Option<AsyncClass> {
        (self.kind == MiRecordKind::ExecAsync).then(|| AsyncClass::from(self.class.as_str()))
    }

    pub fn notification_class(&self) -> Option<NotificationClass> {
        (self.kind == MiRecordKind::NotifyAsync)
            .then(|| NotificationClass::from(self.class.as_str()))
    }

    /// Reason of a `*stopped` record. GDB omits it for some stops
    /// (e.g. after an interrupt), which maps to `Unknown("")`.
    pub fn stop_reason(&self) -> Option<StopReason> {
        if self.async_class() != Some(AsyncClass::Stopped) {
            return None;
        }
        Some(StopReason::from(self.results.const_value("reason").unwrap_or_default()))
    }
}

impl fmt::Display for MiRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(token) = self.token {
            write!(f, "{}", token)?;
        }
        match self.kind.marker() {
            Some(marker) if self.kind.is_stream() => {
                write!(f, "{}", marker)?;
                write_quoted(f, self.stream.as_deref().unwrap_or_default())
            }
            Some(marker) => {
                write!(f, "{}{}", marker, self.class)?;
                for entry in &self.results {
                    write!(f, ",{}", entry)?;
                }
                Ok(())
            }
            None if self.kind == MiRecordKind::Prompt => f.write_str("(gdb)"),
            None => f.write_str(self.stream.as_deref().unwrap_or_default()),
        }
    }
}
