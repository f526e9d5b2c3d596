//! Reader configuration

use std::env;

pub const CHARSET_ENV: &str = "GDB_MI_CHARSET";
pub const KEEP_PROMPTS_ENV: &str = "GDB_MI_KEEP_PROMPTS";

/// Settings for a record reader
#[derive(Debug, Clone, PartialEq)]
pub struct ReaderConfig {
    /// Charset used for octal escapes in strings
    pub charset: String,
    /// Drop `(gdb)` prompt lines instead of forwarding them
    pub skip_prompts: bool,
    /// Bound of the record channel
    pub channel_capacity: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            charset: "UTF-8".to_string(),
            skip_prompts: true,
            channel_capacity: 256,
        }
    }
}

impl ReaderConfig {
    /// Defaults overridden by `GDB_MI_CHARSET` and `GDB_MI_KEEP_PROMPTS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(charset) = lookup(CHARSET_ENV).filter(|s| !s.trim().is_empty()) {
            config.charset = charset.trim().to_string();
        }
        if let Some(keep) = lookup(KEEP_PROMPTS_ENV) {
            config.skip_prompts = !matches!(
                keep.trim().to_ascii_lowercase().as_str(),
                "1" | "true" | "yes" | "on"
            );
        }
        config
    }
}
