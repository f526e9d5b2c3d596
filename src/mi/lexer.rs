//! GDB/MI tokenizer
//!
//! Splits one line of MI output into punctuation, identifiers and quoted
//! strings. Quoted strings are decoded on the way: `\"` and `\\` are
//! unescaped, runs of octal escapes are gathered as raw bytes and decoded
//! with the configured charset, and every other escape is kept verbatim.

use crate::mi::error::MiSyntaxError;
use encoding_rs::{Encoding, UTF_8};
use std::fmt;
use tracing::warn;

/// Lexical token with its decoded text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Variable names, class names, record tokens
    Ident(String),
    /// Decoded contents of a quoted string
    Str(String),
    /// One of `= { } [ ] , ^ * + ~ @ &`
    Punct(char),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier `{}`", s),
            Token::Str(_) => f.write_str("string"),
            Token::Punct(c) => write!(f, "'{}'", c),
        }
    }
}

fn is_punct(c: char) -> bool {
    matches!(
        c,
        '=' | '{' | '}' | '[' | ']' | ',' | '^' | '*' | '+' | '~' | '@' | '&' | '"'
    )
}

/// Accumulates bytes from consecutive octal escapes and decodes them as
/// one run, so multi-byte characters split over several escapes survive.
#[derive(Debug, Clone)]
pub struct CharsetDecoder {
    encoding: &'static Encoding,
    pending: Vec<u8>,
}

impl CharsetDecoder {
    /// Resolves a charset label such as `Cp1251` or `UTF-8`.
    /// Unknown labels fall back to UTF-8.
    pub fn for_label(label: &str) -> Self {
        let encoding = Encoding::for_label(label.trim().as_bytes()).unwrap_or_else(|| {
            warn!("Unknown charset '{}', decoding octal escapes as UTF-8", label);
            UTF_8
        });
        Self {
            encoding,
            pending: Vec::new(),
        }
    }

    /// Canonical name of the resolved charset
    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    pub fn push_byte(&mut self, byte: u8) {
        self.pending.push(byte);
    }

    /// Decodes pending bytes into `out`; malformed sequences become U+FFFD.
    pub fn flush_into(&mut self, out: &mut String) {
        if self.pending.is_empty() {
            return;
        }
        let (text, _had_errors) = self.encoding.decode_without_bom_handling(&self.pending);
        out.push_str(&text);
        self.pending.clear();
    }

    /// Decodes a raw byte run directly
    pub fn decode(&self, bytes: &[u8]) -> String {
        self.encoding.decode_without_bom_handling(bytes).0.into_owned()
    }

    fn reset(&mut self) {
        self.pending.clear();
    }
}

impl Default for CharsetDecoder {
    fn default() -> Self {
        Self {
            encoding: UTF_8,
            pending: Vec::new(),
        }
    }
}

/// Tokenizer over a single line. `reset` rewinds it for the next line.
#[derive(Debug, Clone, Default)]
pub struct MiLexer {
    chars: Vec<char>,
    pos: usize,
    peeked: Option<Option<(usize, Token)>>,
    decoder: CharsetDecoder,
    error: Option<MiSyntaxError>,
}

impl MiLexer {
    pub fn new(charset: &str) -> Self {
        Self {
            decoder: CharsetDecoder::for_label(charset),
            ..Default::default()
        }
    }

    pub fn charset(&self) -> &'static str {
        self.decoder.name()
    }

    pub fn reset(&mut self, line: &str) {
        self.chars = line.chars().collect();
        self.pos = 0;
        self.peeked = None;
        self.decoder.reset();
        self.error = None;
    }

    /// Offset of the next unread character
    pub fn position(&self) -> usize {
        match &self.peeked {
            Some(Some((at, _))) => *at,
            _ => self.pos,
        }
    }

    /// First lexical error seen on this line
    pub fn take_error(&mut self) -> Option<MiSyntaxError> {
        self.error.take()
    }

    /// Consumes a run of ASCII digits, the optional record token. Must be
    /// called before any token has been peeked.
    pub fn take_digits(&mut self) -> Option<String> {
        debug_assert!(self.peeked.is_none());
        let start = self.pos;
        while self.pos < self.chars.len() && self.chars[self.pos].is_ascii_digit() {
            self.pos += 1;
        }
        (self.pos > start).then(|| self.chars[start..self.pos].iter().collect())
    }

    pub fn peek(&mut self) -> Option<&Token> {
        if self.peeked.is_none() {
            let next = self.scan();
            self.peeked = Some(next);
        }
        self.peeked
            .as_ref()
            .and_then(|p| p.as_ref())
            .map(|(_, token)| token)
    }

    pub fn next_token(&mut self) -> Option<(usize, Token)> {
        match self.peeked.take() {
            Some(peeked) => peeked,
            None => self.scan(),
        }
    }

    fn scan(&mut self) -> Option<(usize, Token)> {
        while self.pos < self.chars.len() && self.chars[self.pos].is_whitespace() {
            self.pos += 1;
        }
        let start = self.pos;
        let c = *self.chars.get(self.pos)?;
        if c == '"' {
            self.pos += 1;
            let s = self.read_string(start);
            return Some((start, Token::Str(s)));
        }
        if is_punct(c) {
            self.pos += 1;
            return Some((start, Token::Punct(c)));
        }
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            if c.is_whitespace() || is_punct(c) {
                break;
            }
            self.pos += 1;
        }
        let ident: String = self.chars[start..self.pos].iter().collect();
        Some((start, Token::Ident(ident)))
    }

    /// Reads the body of a string whose opening quote is at `start`.
    fn read_string(&mut self, start: usize) -> String {
        let mut out = String::new();
        loop {
            let Some(&c) = self.chars.get(self.pos) else {
                self.decoder.flush_into(&mut out);
                self.record_error(MiSyntaxError::UnterminatedString { at: start });
                return out;
            };
            self.pos += 1;
            match c {
                '"' => {
                    self.decoder.flush_into(&mut out);
                    return out;
                }
                '\\' => self.read_escape(&mut out),
                c => {
                    self.decoder.flush_into(&mut out);
                    out.push(c);
                }
            }
        }
    }

    fn read_escape(&mut self, out: &mut String) {
        let Some(&c) = self.chars.get(self.pos) else {
            self.decoder.flush_into(out);
            out.push('\\');
            self.record_error(MiSyntaxError::DanglingEscape { at: self.pos - 1 });
            return;
        };
        if c.is_digit(8) {
            let mut value: u32 = 0;
            let mut digits = 0;
            while digits < 3 {
                match self.chars.get(self.pos).and_then(|d| d.to_digit(8)) {
                    Some(d) => {
                        value = value * 8 + d;
                        self.pos += 1;
                        digits += 1;
                    }
                    None => break,
                }
            }
            self.decoder.push_byte((value & 0xff) as u8);
            return;
        }
        self.pos += 1;
        self.decoder.flush_into(out);
        match c {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    fn record_error(&mut self, error: MiSyntaxError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }
}

/// Interprets the C escapes GDB leaves in console/target/log text
/// (`\n`, `\t`, `\r`) for display.
pub fn unescape_stream_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some('n') => {
                    result.push('\n');
                    chars.next();
                }
                Some('t') => {
                    result.push('\t');
                    chars.next();
                }
                Some('r') => {
                    result.push('\r');
                    chars.next();
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}
