//! GDB Machine Interface (MI) Type Definitions
//!
//! The result tree keeps entries in the order GDB printed them and allows
//! repeated names, so it is a list of entries rather than a map.

use serde::Serialize;
use std::fmt;

/// Record kind, selected by the marker character that starts a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MiRecordKind {
    /// `^done`, `^error`, ...
    Result,
    /// `*stopped`, `*running`
    ExecAsync,
    /// `+download`
    StatusAsync,
    /// `=breakpoint-created`, `=thread-group-added`, ...
    NotifyAsync,
    /// `~"..."`
    ConsoleStream,
    /// `@"..."`
    TargetStream,
    /// `&"..."`
    LogStream,
    /// The `(gdb)` line that terminates a batch of output
    Prompt,
    Unknown,
}

impl MiRecordKind {
    pub fn from_marker(c: char) -> Option<Self> {
        match c {
            '^' => Some(MiRecordKind::Result),
            '*' => Some(MiRecordKind::ExecAsync),
            '+' => Some(MiRecordKind::StatusAsync),
            '=' => Some(MiRecordKind::NotifyAsync),
            '~' => Some(MiRecordKind::ConsoleStream),
            '@' => Some(MiRecordKind::TargetStream),
            '&' => Some(MiRecordKind::LogStream),
            _ => None,
        }
    }

    pub fn marker(self) -> Option<char> {
        match self {
            MiRecordKind::Result => Some('^'),
            MiRecordKind::ExecAsync => Some('*'),
            MiRecordKind::StatusAsync => Some('+'),
            MiRecordKind::NotifyAsync => Some('='),
            MiRecordKind::ConsoleStream => Some('~'),
            MiRecordKind::TargetStream => Some('@'),
            MiRecordKind::LogStream => Some('&'),
            MiRecordKind::Prompt | MiRecordKind::Unknown => None,
        }
    }

    pub fn is_stream(self) -> bool {
        matches!(
            self,
            MiRecordKind::ConsoleStream | MiRecordKind::TargetStream | MiRecordKind::LogStream
        )
    }

    pub fn is_async(self) -> bool {
        matches!(
            self,
            MiRecordKind::ExecAsync | MiRecordKind::StatusAsync | MiRecordKind::NotifyAsync
        )
    }
}

/// GDB/MI result class types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultClass {
    Done,
    Running,
    Connected,
    Error,
    Exit,
    Other(String),
}

impl From<&str> for ResultClass {
    fn from(s: &str) -> Self {
        match s {
            "done" => ResultClass::Done,
            "running" => ResultClass::Running,
            "connected" => ResultClass::Connected,
            "error" => ResultClass::Error,
            "exit" => ResultClass::Exit,
            _ => ResultClass::Other(s.to_string()),
        }
    }
}

/// GDB/MI exec-async class types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AsyncClass {
    Stopped,
    Running,
    Other(String),
}

impl From<&str> for AsyncClass {
    fn from(s: &str) -> Self {
        match s {
            "stopped" => AsyncClass::Stopped,
            "running" => AsyncClass::Running,
            _ => AsyncClass::Other(s.to_string()),
        }
    }
}

/// GDB/MI notification types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationClass {
    BreakpointCreated,
    BreakpointModified,
    BreakpointDeleted,
    ThreadGroupAdded,
    ThreadGroupRemoved,
    ThreadGroupStarted,
    ThreadGroupExited,
    ThreadCreated,
    ThreadSelected,
    ThreadExited,
    LibraryLoaded,
    LibraryUnloaded,
    CmdParamChanged,
    ParamChanged,
    MemoryChanged,
    Other(String),
}

impl From<&str> for NotificationClass {
    fn from(s: &str) -> Self {
        match s {
            "breakpoint-created" => NotificationClass::BreakpointCreated,
            "breakpoint-modified" => NotificationClass::BreakpointModified,
            "breakpoint-deleted" => NotificationClass::BreakpointDeleted,
            "thread-group-added" => NotificationClass::ThreadGroupAdded,
            "thread-group-removed" => NotificationClass::ThreadGroupRemoved,
            "thread-group-started" => NotificationClass::ThreadGroupStarted,
            "thread-group-exited" => NotificationClass::ThreadGroupExited,
            "thread-created" => NotificationClass::ThreadCreated,
            "thread-selected" => NotificationClass::ThreadSelected,
            "thread-exited" => NotificationClass::ThreadExited,
            "library-loaded" => NotificationClass::LibraryLoaded,
            "library-unloaded" => NotificationClass::LibraryUnloaded,
            "cmd-param-changed" => NotificationClass::CmdParamChanged,
            "param-changed" => NotificationClass::ParamChanged,
            "memory-changed" => NotificationClass::MemoryChanged,
            _ => NotificationClass::Other(s.to_string()),
        }
    }
}

/// Stop reason types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StopReason {
    BreakpointHit,
    WatchpointTrigger,
    ReadWatchpointTrigger,
    AccessWatchpointTrigger,
    FunctionFinished,
    LocationReached,
    WatchpointScope,
    EndSteppingRange,
    ExitedSignalled,
    Exited,
    ExitedNormally,
    SignalReceived,
    SolibEvent,
    Fork,
    Vfork,
    SyscallEntry,
    SyscallReturn,
    Unknown(String),
}

impl From<&str> for StopReason {
    fn from(s: &str) -> Self {
        match s {
            "breakpoint-hit" => StopReason::BreakpointHit,
            "watchpoint-trigger" => StopReason::WatchpointTrigger,
            "read-watchpoint-trigger" => StopReason::ReadWatchpointTrigger,
            "access-watchpoint-trigger" => StopReason::AccessWatchpointTrigger,
            "function-finished" => StopReason::FunctionFinished,
            "location-reached" => StopReason::LocationReached,
            "watchpoint-scope" => StopReason::WatchpointScope,
            "end-stepping-range" => StopReason::EndSteppingRange,
            "exited-signalled" => StopReason::ExitedSignalled,
            "exited" => StopReason::Exited,
            "exited-normally" => StopReason::ExitedNormally,
            "signal-received" => StopReason::SignalReceived,
            "solib-event" => StopReason::SolibEvent,
            "fork" => StopReason::Fork,
            "vfork" => StopReason::Vfork,
            "syscall-entry" => StopReason::SyscallEntry,
            "syscall-return" => StopReason::SyscallReturn,
            _ => StopReason::Unknown(s.to_string()),
        }
    }
}

/// GDB/MI value types
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum MiValue {
    /// Decoded contents of a quoted string
    Const(String),
    /// `{...}`
    Tuple(MiTList),
    /// `[...]`
    List(MiTList),
}

impl MiValue {
    pub fn as_const(&self) -> Option<&str> {
        match self {
            MiValue::Const(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&MiTList> {
        match self {
            MiValue::Tuple(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&MiTList> {
        match self {
            MiValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// Children of a tuple or list; `None` for consts
    pub fn entries(&self) -> Option<&MiTList> {
        match self {
            MiValue::Tuple(t) | MiValue::List(t) => Some(t),
            MiValue::Const(_) => None,
        }
    }
}

impl fmt::Display for MiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MiValue::Const(s) => write_quoted(f, s),
            MiValue::Tuple(t) => {
                f.write_str("{")?;
                t.write_entries(f)?;
                f.write_str("}")
            }
            MiValue::List(l) => {
                f.write_str("[")?;
                l.write_entries(f)?;
                f.write_str("]")
            }
        }
    }
}

/// Writes `s` as an MI c-string. Control characters go out as octal
/// escapes so the rendering stays on one line.
pub(crate) fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in s.chars() {
        match c {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            c if (c as u32) < 0x20 || c == '\u{7f}' => write!(f, "\\{:03o}", c as u32)?,
            c => write!(f, "{}", c)?,
        }
    }
    f.write_str("\"")
}

/// One `name=value` result, or a bare value inside a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MiEntry {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub value: MiValue,
}

impl MiEntry {
    pub fn named(name: impl Into<String>, value: MiValue) -> Self {
        Self {
            name: Some(name.into()),
            value,
        }
    }

    pub fn bare(value: MiValue) -> Self {
        Self { name: None, value }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> &MiValue {
        &self.value
    }

    pub fn matches(&self, name: &str) -> bool {
        self.name.as_deref() == Some(name)
    }
}

impl fmt::Display for MiEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.name {
            write!(f, "{}=", name)?;
        }
        write!(f, "{}", self.value)
    }
}

/// Ordered collection of entries; the payload of a record, a tuple or a list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MiTList {
    entries: Vec<MiEntry>,
}

impl MiTList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: MiEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&MiEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MiEntry> {
        self.entries.iter()
    }

    /// Value of the first entry called `name`
    pub fn value_of(&self, name: &str) -> Option<&MiValue> {
        self.entries.iter().find(|e| e.matches(name)).map(|e| &e.value)
    }

    /// Every value called `name`, in order
    pub fn values_of<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MiValue> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.matches(name))
            .map(|e| &e.value)
    }

    /// Decoded string of the first entry called `name`, if that is a const
    pub fn const_value(&self, name: &str) -> Option<&str> {
        self.value_of(name).and_then(MiValue::as_const)
    }

    /// Walks dotted names through nested tuples and lists,
    /// e.g. `"frame.fullname"`.
    pub fn find_path(&self, path: &str) -> Option<&MiValue> {
        let mut parts = path.split('.');
        let mut current = self.value_of(parts.next()?)?;
        for part in parts {
            current = current.entries()?.value_of(part)?;
        }
        Some(current)
    }

    pub(crate) fn write_entries(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, entry) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}", entry)?;
        }
        Ok(())
    }
}

impl fmt::Display for MiTList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_entries(f)
    }
}

impl<'a> IntoIterator for &'a MiTList {
    type Item = &'a MiEntry;
    type IntoIter = std::slice::Iter<'a, MiEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl FromIterator<MiEntry> for MiTList {
    fn from_iter<I: IntoIterator<Item = MiEntry>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}
