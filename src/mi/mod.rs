//! GDB Machine Interface (MI) parsing

pub mod error;
pub mod extract;
pub mod lexer;
pub mod parser;
pub mod record;
pub mod types;

pub use error::MiSyntaxError;
pub use parser::MiParser;
pub use record::MiRecord;
pub use types::*;
