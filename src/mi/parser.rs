//! GDB Machine Interface (MI) Parser
//!
//! Recursive-descent parser that turns one line of GDB/MI output into an
//! [`MiRecord`]. Parsing never fails: on the first syntax error the parser
//! stops, keeps whatever it has built so far and notes the error on the
//! record.
//!
//! ```text
//! record := [token] marker class ( "," entry )*
//!         | [token] stream-marker c-string
//! entry  := variable "=" value | value
//! value  := c-string | "{" [ entry ( "," entry )* ] "}"
//!                    | "[" [ entry ( "," entry )* ] "]"
//! ```

use crate::mi::error::MiSyntaxError;
use crate::mi::lexer::{MiLexer, Token};
use crate::mi::record::MiRecord;
use crate::mi::types::*;
use tracing::{debug, warn};

const PROMPT: &str = "(gdb)";

/// Deepest tuple/list nesting accepted before the line is treated as malformed
pub const MAX_DEPTH: usize = 256;

/// GDB/MI Parser
///
/// Reusable across lines: `setup` resets all per-line state. Only the
/// charset chosen at construction carries over.
#[derive(Debug, Clone)]
pub struct MiParser {
    lexer: MiLexer,
    line: String,
    error: Option<MiSyntaxError>,
    depth: usize,
}

impl MiParser {
    /// Creates a parser that decodes octal escapes with `charset`
    /// (any WHATWG label, e.g. `UTF-8`, `Cp1251`, `windows-1252`).
    pub fn new(charset: &str) -> Self {
        Self {
            lexer: MiLexer::new(charset),
            line: String::new(),
            error: None,
            depth: 0,
        }
    }

    pub fn charset(&self) -> &'static str {
        self.lexer.charset()
    }

    /// Primes the parser with one line of output
    pub fn setup(&mut self, line: &str) {
        self.line = line.trim_end_matches(['\r', '\n']).to_string();
        self.lexer.reset(&self.line);
        self.error = None;
        self.depth = 0;
    }

    /// Parses the line given to the last `setup`
    pub fn parse(&mut self) -> MiRecord {
        let record = self.parse_record();
        debug!(
            "Parsed {:?} record: class={:?} entries={} error={:?}",
            record.kind,
            record.class,
            record.results.len(),
            record.syntax_error
        );
        record
    }

    /// `setup` followed by `parse`
    pub fn parse_line(&mut self, line: &str) -> MiRecord {
        self.setup(line);
        self.parse()
    }

    fn parse_record(&mut self) -> MiRecord {
        let trimmed = self.line.trim();
        if trimmed.starts_with(PROMPT) {
            return MiRecord::empty(MiRecordKind::Prompt);
        }
        if trimmed.is_empty() {
            return MiRecord::empty(MiRecordKind::Unknown);
        }

        let mut token_error = None;
        let token = self.lexer.take_digits().and_then(|digits| match digits.parse::<u64>() {
            Ok(token) => Some(token),
            Err(_) => {
                warn!("Record token {} does not fit in u64", digits);
                token_error = Some(MiSyntaxError::TokenOverflow { at: 0, token: digits });
                None
            }
        });

        let kind = match self.lexer.peek() {
            Some(Token::Punct(c)) => MiRecordKind::from_marker(*c),
            _ => None,
        };
        let Some(kind) = kind else {
            let at = self.lexer.position();
            let mut record = MiRecord::empty(MiRecordKind::Unknown);
            record.stream = Some(self.line.clone());
            record.syntax_error = Some(MiSyntaxError::MissingMarker { at });
            return record;
        };
        self.lexer.next_token();

        let mut record = MiRecord::empty(kind);
        record.token = token;

        if kind.is_stream() {
            record.stream = self.parse_stream_body();
        } else {
            record.class = self.parse_class();
            if self.error.is_none() {
                record.results = self.parse_results();
            }
        }

        record.syntax_error = token_error.or_else(|| self.finish_errors());
        record
    }

    fn parse_stream_body(&mut self) -> Option<String> {
        let text = match self.lexer.next_token() {
            Some((_, Token::Str(s))) => s,
            Some((at, found)) => {
                self.unexpected(at, &found, "string");
                return None;
            }
            None => {
                self.unexpected_end("string");
                return None;
            }
        };
        if let Some((at, found)) = self.lexer.next_token() {
            self.unexpected(at, &found, "end of line");
        }
        Some(text)
    }

    fn parse_class(&mut self) -> String {
        match self.lexer.next_token() {
            Some((_, Token::Ident(class))) => class,
            Some((at, found)) => {
                self.unexpected(at, &found, "record class");
                String::new()
            }
            None => {
                self.unexpected_end("record class");
                String::new()
            }
        }
    }

    /// `( "," entry )*` up to the end of the line
    fn parse_results(&mut self) -> MiTList {
        let mut results = MiTList::new();
        while let Some((at, token)) = self.lexer.next_token() {
            if token != Token::Punct(',') {
                self.unexpected(at, &token, "','");
                break;
            }
            if let Some(entry) = self.parse_entry() {
                results.push(entry);
            }
            if self.error.is_some() {
                break;
            }
        }
        results
    }

    /// `variable "=" value` or a bare value
    fn parse_entry(&mut self) -> Option<MiEntry> {
        match self.lexer.peek() {
            Some(Token::Ident(_)) => {
                let Some((_, Token::Ident(name))) = self.lexer.next_token() else {
                    return None;
                };
                match self.lexer.next_token() {
                    Some((_, Token::Punct('='))) => {}
                    Some((at, found)) => {
                        self.unexpected(at, &found, "'='");
                        return None;
                    }
                    None => {
                        self.unexpected_end("'='");
                        return None;
                    }
                }
                self.parse_value().map(|value| MiEntry::named(name, value))
            }
            Some(_) => self.parse_value().map(MiEntry::bare),
            None => {
                self.unexpected_end("result");
                None
            }
        }
    }

    fn parse_value(&mut self) -> Option<MiValue> {
        match self.lexer.next_token() {
            Some((_, Token::Str(s))) => Some(MiValue::Const(s)),
            Some((at, Token::Punct(open @ ('{' | '[')))) => {
                if self.depth >= MAX_DEPTH {
                    if self.error.is_none() {
                        self.error = Some(MiSyntaxError::TooDeep { at });
                    }
                    return None;
                }
                self.depth += 1;
                let value = if open == '{' {
                    MiValue::Tuple(self.parse_items('}'))
                } else {
                    MiValue::List(self.parse_items(']'))
                };
                self.depth -= 1;
                Some(value)
            }
            Some((at, found)) => {
                self.unexpected(at, &found, "value");
                None
            }
            None => {
                self.unexpected_end("value");
                None
            }
        }
    }

    /// Body of a tuple or list, after its opening bracket.
    /// Returns the entries read so far if the body is malformed.
    fn parse_items(&mut self, close: char) -> MiTList {
        let expected = if close == '}' { "',' or '}'" } else { "',' or ']'" };
        let mut items = MiTList::new();

        if self.lexer.peek() == Some(&Token::Punct(close)) {
            self.lexer.next_token();
            return items;
        }

        loop {
            if let Some(entry) = self.parse_entry() {
                items.push(entry);
            }
            if self.error.is_some() {
                return items;
            }
            match self.lexer.next_token() {
                Some((_, Token::Punct(','))) => {}
                Some((_, Token::Punct(c))) if c == close => return items,
                Some((at, found)) => {
                    self.unexpected(at, &found, expected);
                    return items;
                }
                None => {
                    self.unexpected_end(expected);
                    return items;
                }
            }
        }
    }

    fn unexpected(&mut self, at: usize, found: &Token, expected: &'static str) {
        if self.error.is_none() {
            self.error = Some(MiSyntaxError::UnexpectedToken {
                at,
                found: found.to_string(),
                expected,
            });
        }
    }

    fn unexpected_end(&mut self, expected: &'static str) {
        if self.error.is_none() {
            let at = self.line.chars().count();
            self.error = Some(MiSyntaxError::UnexpectedEnd { at, expected });
        }
    }

    /// Earliest of the lexical and grammar errors
    fn finish_errors(&mut self) -> Option<MiSyntaxError> {
        match (self.lexer.take_error(), self.error.take()) {
            (Some(lexical), Some(grammar)) => {
                if lexical.position() <= grammar.position() {
                    Some(lexical)
                } else {
                    Some(grammar)
                }
            }
            (lexical, grammar) => lexical.or(grammar),
        }
    }
}

impl Default for MiParser {
    fn default() -> Self {
        Self::new("UTF-8")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTIPLE_LOCATION_BKPT: &str = r#"15^done,bkpt={number="2",type="breakpoint",disp="keep",enabled="y",addr="<MULTIPLE>",times="0",original-location="Customer::Customer"},{number="2.1",enabled="y",addr="0x08048f2e",func="Customer::Customer(std::string const&, std::string const&, int)",file="customer.cc",fullname="/export/home/user/Customer/customer.cc",line="28"},{number="2.2",enabled="y",addr="0x08049034",func="Customer::Customer(std::string const&, std::string const&, int)",file="customer.cc",fullname="/export/home/user/Customer/customer.cc",line="28"}"#;

    #[test]
    fn test_parse_result_done() {
        let mut parser = MiParser::default();
        let record = parser.parse_line("^done");
        assert_eq!(record.kind(), MiRecordKind::Result);
        assert_eq!(record.class(), "done");
        assert!(record.results().is_empty());
        assert!(record.token().is_none());
        assert!(record.syntax_error().is_none());
    }

    #[test]
    fn test_multiple_location_breakpoint() {
        let mut parser = MiParser::default();
        parser.setup(MULTIPLE_LOCATION_BKPT);
        let record = parser.parse();
        assert_eq!(record.token(), Some(15));
        assert_eq!(record.result_class(), Some(ResultClass::Done));

        let results = record.results();
        assert_eq!(results.len(), 3);
        assert_eq!(
            results.get(0).unwrap().to_string(),
            r#"bkpt={number="2",type="breakpoint",disp="keep",enabled="y",addr="<MULTIPLE>",times="0",original-location="Customer::Customer"}"#
        );
        assert_eq!(
            results.get(1).unwrap().to_string(),
            r#"{number="2.1",enabled="y",addr="0x08048f2e",func="Customer::Customer(std::string const&, std::string const&, int)",file="customer.cc",fullname="/export/home/user/Customer/customer.cc",line="28"}"#
        );
        assert!(results.get(2).unwrap().name().is_none());
        assert!(record.syntax_error().is_none());
    }

    #[test]
    fn test_stopped_round_trip() {
        let line = r#"*stopped,reason="end-stepping-range",frame={addr="0x08050a4e",func="main",args=[{name="argc",value="1"},{name="argv",value="0x8047c3c"}],file="args.c",fullname="/tmp/args.c",line="7"},thread-id="1",stopped-threads="all""#;
        let mut parser = MiParser::default();
        let record = parser.parse_line(line);
        assert_eq!(record.kind(), MiRecordKind::ExecAsync);
        assert_eq!(record.results().len(), 4);
        assert_eq!(record.to_string(), line);
        assert_eq!(
            record.results().find_path("frame.fullname").and_then(MiValue::as_const),
            Some("/tmp/args.c")
        );
        let args = record.results().find_path("frame.args").and_then(MiValue::as_list).unwrap();
        assert_eq!(args.len(), 2);
        assert_eq!(args.get(1).unwrap().to_string(), r#"{name="argv",value="0x8047c3c"}"#);
    }

    #[test]
    fn test_octal_fullname_cp1251() {
        let line = r#"*stopped,reason="breakpoint-hit",fullname="C:\\Users\\\314\356\350\\main.cpp",line="5""#;
        let mut parser = MiParser::new("Cp1251");
        let record = parser.parse_line(line);
        assert_eq!(record.results().const_value("fullname"), Some(r"C:\Users\Мои\main.cpp"));
        assert_eq!(record.results().const_value("line"), Some("5"));
    }

    #[test]
    fn test_quoted_value_keeps_quotes() {
        let mut parser = MiParser::default();
        let record = parser.parse_line(r#"^done,value="\"a\"""#);
        assert_eq!(record.results().const_value("value"), Some("\"a\""));
        assert_eq!(record.to_string(), r#"^done,value="\"a\"""#);
    }

    #[test]
    fn test_duplicate_names() {
        let mut parser = MiParser::default();
        let record = parser.parse_line(r#"^done,a="1",a="2""#);
        let results = record.results();
        assert_eq!(results.len(), 2);
        assert_eq!(results.const_value("a"), Some("1"));
        assert_eq!(results.get(1).unwrap().value().as_const(), Some("2"));
    }

    #[test]
    fn test_lists_of_values_and_results() {
        let mut parser = MiParser::default();
        let record = parser.parse_line(
            r#"^done,thread-ids={thread-id="1",thread-id="2"},names=["eax","ecx",""],stack=[frame={level="0"},frame={level="1"}],empty=[],none={}"#,
        );
        let results = record.results();
        assert_eq!(results.len(), 5);
        let names = results.value_of("names").and_then(MiValue::as_list).unwrap();
        assert_eq!(names.len(), 3);
        assert!(names.get(0).unwrap().name().is_none());
        let stack = results.value_of("stack").and_then(MiValue::as_list).unwrap();
        assert_eq!(stack.values_of("frame").count(), 2);
        assert!(results.value_of("empty").and_then(MiValue::as_list).unwrap().is_empty());
        assert_eq!(results.get(4).unwrap().to_string(), "none={}");
        assert!(record.syntax_error().is_none());
    }

    #[test]
    fn test_corrupted_stopped() {
        let mut parser = MiParser::default();
        let record = parser.parse_line(
            r#"*stopped,reason="signal-received",signal-name="SIGSEGV",frame={addr="0x0804",func="main",args=[{name="argc",value="1"}"#,
        );
        assert_eq!(record.kind(), MiRecordKind::ExecAsync);
        assert!(record.results().value_of("xxx").is_none());
        assert!(record.results().const_value("xxx").is_none());
        assert_eq!(record.results().const_value("reason"), Some("signal-received"));
        let frame = record.results().value_of("frame").and_then(MiValue::as_tuple).unwrap();
        assert_eq!(frame.const_value("func"), Some("main"));
        assert!(matches!(
            record.syntax_error(),
            Some(MiSyntaxError::UnexpectedEnd { .. })
        ));
    }

    #[test]
    fn test_stray_punctuation_keeps_prefix() {
        let mut parser = MiParser::default();
        let record = parser.parse_line(r#"^done,a="1",b=}"#);
        assert_eq!(record.results().len(), 1);
        assert_eq!(record.results().const_value("a"), Some("1"));
        assert_eq!(
            record.syntax_error(),
            Some(&MiSyntaxError::UnexpectedToken {
                at: 14,
                found: "'}'".to_string(),
                expected: "value",
            })
        );
    }

    #[test]
    fn test_unterminated_string_reported_first() {
        let mut parser = MiParser::default();
        let record = parser.parse_line(r#"^error,msg="No symbol"#);
        assert!(record.is_error());
        assert_eq!(record.error_message(), Some("No symbol"));
        assert_eq!(
            record.syntax_error(),
            Some(&MiSyntaxError::UnterminatedString { at: 11 })
        );
    }

    #[test]
    fn test_missing_equals() {
        let mut parser = MiParser::default();
        let record = parser.parse_line(r#"=thread-group-added,id"#);
        assert_eq!(record.kind(), MiRecordKind::NotifyAsync);
        assert_eq!(record.class(), "thread-group-added");
        assert!(record.results().is_empty());
        assert!(matches!(record.syntax_error(), Some(MiSyntaxError::UnexpectedEnd { .. })));
    }

    #[test]
    fn test_stream_records() {
        let mut parser = MiParser::default();
        let console = parser.parse_line(r#"~"GNU gdb (GDB) 13.2\n""#);
        assert_eq!(console.kind(), MiRecordKind::ConsoleStream);
        assert!(console.is_stream());
        assert_eq!(console.stream(), Some(r"GNU gdb (GDB) 13.2\n"));
        assert_eq!(console.to_string(), r#"~"GNU gdb (GDB) 13.2\\n""#);

        let log = parser.parse_line(r#"&"warning: \"x\"""#);
        assert_eq!(log.kind(), MiRecordKind::LogStream);
        assert_eq!(log.stream(), Some("warning: \"x\""));

        let target = parser.parse_line(r#"@"out""#);
        assert_eq!(target.kind(), MiRecordKind::TargetStream);
        assert!(target.results().is_empty());
    }

    #[test]
    fn test_stream_record_without_string() {
        let mut parser = MiParser::default();
        let record = parser.parse_line("~oops");
        assert_eq!(record.kind(), MiRecordKind::ConsoleStream);
        assert!(record.stream().is_none());
        assert!(record.syntax_error().is_some());
    }

    #[test]
    fn test_prompt_and_unknown() {
        let mut parser = MiParser::default();
        assert_eq!(parser.parse_line("(gdb) ").kind(), MiRecordKind::Prompt);

        let unknown = parser.parse_line("Reading symbols from a.out...");
        assert_eq!(unknown.kind(), MiRecordKind::Unknown);
        assert_eq!(unknown.stream(), Some("Reading symbols from a.out..."));
        assert_eq!(unknown.syntax_error(), Some(&MiSyntaxError::MissingMarker { at: 0 }));
        assert!(unknown.results().value_of("anything").is_none());
    }

    #[test]
    fn test_status_async_and_token() {
        let mut parser = MiParser::default();
        let record = parser.parse_line("42+download,section=\".text\",section-size=\"6668\"\r");
        assert_eq!(record.kind(), MiRecordKind::StatusAsync);
        assert_eq!(record.token(), Some(42));
        assert_eq!(record.class(), "download");
        assert_eq!(record.to_string(), r#"42+download,section=".text",section-size="6668""#);
    }

    #[test]
    fn test_unclosed_brackets_hit_depth_limit() {
        let mut parser = MiParser::default();
        let record = parser.parse_line(&format!("^done,a=\"1\",b={}", "[".repeat(100_000)));
        assert_eq!(record.results().const_value("a"), Some("1"));
        assert!(matches!(record.syntax_error(), Some(MiSyntaxError::TooDeep { .. })));

        let mut depth = 0;
        let mut value = record.results().value_of("b");
        while let Some(list) = value.and_then(MiValue::as_list) {
            depth += 1;
            value = list.get(0).map(MiEntry::value);
        }
        assert_eq!(depth, MAX_DEPTH);

        let next = parser.parse_line(r#"^done,c=[[["x"]]]"#);
        assert!(next.syntax_error().is_none());
        assert_eq!(next.to_string(), r#"^done,c=[[["x"]]]"#);
    }

    #[test]
    fn test_deep_tuples_in_reader_thread() {
        let handle = std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(|| {
                let mut parser = MiParser::default();
                parser
                    .parse_line(&format!("*stopped,frame={}", "{f=".repeat(50_000)))
                    .syntax_error()
                    .cloned()
            })
            .unwrap();
        assert!(matches!(handle.join().unwrap(), Some(MiSyntaxError::TooDeep { .. })));
    }

    #[test]
    fn test_token_overflow_is_reported() {
        let mut parser = MiParser::default();
        let record = parser.parse_line(r#"99999999999999999999999^done,value="1""#);
        assert!(record.token().is_none());
        assert_eq!(record.results().const_value("value"), Some("1"));
        assert_eq!(
            record.syntax_error(),
            Some(&MiSyntaxError::TokenOverflow {
                at: 0,
                token: "99999999999999999999999".to_string(),
            })
        );
    }

    #[test]
    fn test_parser_reuse_resets_state() {
        let mut parser = MiParser::new("Cp1251");
        let broken = parser.parse_line(r#"^done,value="open"#);
        assert!(broken.syntax_error().is_some());

        let ok = parser.parse_line(r#"^done,value="\342""#);
        assert!(ok.syntax_error().is_none());
        assert_eq!(ok.results().const_value("value"), Some("в"));
        assert_eq!(parser.charset(), "windows-1251");
    }
}
