//! GDB/MI output parser
//!
//! Turns lines printed by `gdb --interpreter=mi2` into [`mi::MiRecord`]s
//! holding an ordered, queryable result tree.

pub mod config;
pub mod mi;
pub mod reader;
