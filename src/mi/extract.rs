//! Typed views over common GDB/MI payloads

use crate::mi::types::{MiTList, MiValue};
use serde::Serialize;
use tracing::debug;

fn const_string(tuple: &MiTList, key: &str) -> Option<String> {
    tuple.const_value(key).map(str::to_string)
}

fn const_parsed<T: std::str::FromStr>(tuple: &MiTList, key: &str) -> Option<T> {
    tuple.const_value(key).and_then(|s| s.parse().ok())
}

/// Breakpoint information
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Breakpoint {
    pub number: String,
    #[serde(rename = "type")]
    pub breakpoint_type: String,
    pub disposition: String,
    pub enabled: bool,
    pub addr: Option<String>,
    pub func: Option<String>,
    pub file: Option<String>,
    pub fullname: Option<String>,
    pub line: Option<u64>,
    pub thread_groups: Option<Vec<String>>,
    pub times: u64,
    pub original_location: Option<String>,
    pub condition: Option<String>,
    pub ignore_count: Option<u64>,
    /// Per-location entries of a breakpoint whose `addr` is `<MULTIPLE>`
    pub locations: Vec<BreakpointLocation>,
}

/// One resolved location of a multi-location breakpoint (`2.1`, `2.2`, ...)
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BreakpointLocation {
    pub number: String,
    pub enabled: bool,
    pub addr: Option<String>,
    pub func: Option<String>,
    pub file: Option<String>,
    pub fullname: Option<String>,
    pub line: Option<u64>,
}

impl Breakpoint {
    /// Reads the fields of a `bkpt={...}` tuple; `None` without a `number`.
    pub fn from_tuple(tuple: &MiTList) -> Option<Self> {
        let mut bp = Breakpoint {
            number: const_string(tuple, "number")?,
            breakpoint_type: const_string(tuple, "type").unwrap_or_default(),
            disposition: const_string(tuple, "disp").unwrap_or_default(),
            enabled: tuple.const_value("enabled").map(|s| s == "y").unwrap_or(true),
            addr: const_string(tuple, "addr"),
            func: const_string(tuple, "func"),
            file: const_string(tuple, "file"),
            fullname: const_string(tuple, "fullname"),
            line: const_parsed(tuple, "line"),
            thread_groups: tuple.value_of("thread-groups").and_then(MiValue::as_list).map(|list| {
                list.iter()
                    .filter_map(|e| e.value().as_const().map(str::to_string))
                    .collect()
            }),
            times: const_parsed(tuple, "times").unwrap_or(0),
            original_location: const_string(tuple, "original-location"),
            condition: const_string(tuple, "cond"),
            ignore_count: const_parsed(tuple, "ignore"),
            locations: Vec::new(),
        };

        // GDB 13+ nests the locations instead of appending them
        if let Some(locations) = tuple.value_of("locations").and_then(MiValue::as_list) {
            bp.locations = locations
                .iter()
                .filter_map(|e| e.value().as_tuple())
                .filter_map(BreakpointLocation::from_tuple)
                .collect();
        }
        Some(bp)
    }

    pub fn is_multiple(&self) -> bool {
        self.addr.as_deref() == Some("<MULTIPLE>")
    }
}

impl BreakpointLocation {
    pub fn from_tuple(tuple: &MiTList) -> Option<Self> {
        Some(BreakpointLocation {
            number: const_string(tuple, "number")?,
            enabled: tuple.const_value("enabled").map(|s| s == "y").unwrap_or(true),
            addr: const_string(tuple, "addr"),
            func: const_string(tuple, "func"),
            file: const_string(tuple, "file"),
            fullname: const_string(tuple, "fullname"),
            line: const_parsed(tuple, "line"),
        })
    }
}

/// Collects breakpoints from a result list such as the payload of
/// `^done,bkpt={...}` or the `body` of a `BreakpointTable`.
///
/// Older GDBs print the locations of a multi-location breakpoint as bare
/// tuples right after its `bkpt` entry; those are attached to it.
pub fn breakpoints(results: &MiTList) -> Vec<Breakpoint> {
    let mut breakpoints: Vec<Breakpoint> = Vec::new();

    for entry in results {
        let Some(tuple) = entry.value().as_tuple() else {
            continue;
        };
        match entry.name() {
            Some("bkpt") => {
                if let Some(bp) = Breakpoint::from_tuple(tuple) {
                    breakpoints.push(bp);
                }
            }
            None => {
                if let (Some(current), Some(location)) =
                    (breakpoints.last_mut(), BreakpointLocation::from_tuple(tuple))
                {
                    current.locations.push(location);
                }
            }
            _ => {}
        }
    }

    debug!("Parsed {} breakpoints", breakpoints.len());
    breakpoints
}

/// Breakpoints listed by `-break-list`
pub fn breakpoint_table(results: &MiTList) -> Vec<Breakpoint> {
    results
        .find_path("BreakpointTable.body")
        .and_then(MiValue::entries)
        .map(breakpoints)
        .unwrap_or_default()
}

/// Frame information
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Frame {
    pub level: u64,
    pub addr: String,
    pub func: Option<String>,
    pub file: Option<String>,
    pub fullname: Option<String>,
    pub line: Option<u64>,
    pub arch: Option<String>,
}

impl Frame {
    /// `*stopped` frames carry no `level`; it defaults to 0 there.
    pub fn from_tuple(tuple: &MiTList) -> Self {
        Frame {
            level: const_parsed(tuple, "level").unwrap_or(0),
            addr: const_string(tuple, "addr").unwrap_or_default(),
            func: const_string(tuple, "func"),
            file: const_string(tuple, "file"),
            fullname: const_string(tuple, "fullname"),
            line: const_parsed(tuple, "line"),
            arch: const_string(tuple, "arch"),
        }
    }
}

/// The `frame={...}` of a record, if any
pub fn frame(results: &MiTList) -> Option<Frame> {
    results
        .value_of("frame")
        .and_then(MiValue::as_tuple)
        .map(Frame::from_tuple)
}

/// Frames from `-stack-list-frames`
pub fn stack_frames(results: &MiTList) -> Vec<Frame> {
    results
        .value_of("stack")
        .and_then(MiValue::entries)
        .map(|stack| {
            stack
                .values_of("frame")
                .filter_map(MiValue::as_tuple)
                .map(Frame::from_tuple)
                .collect()
        })
        .unwrap_or_default()
}
