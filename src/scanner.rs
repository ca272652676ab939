//! Tolerant JSONC event scanner — the pipeline's event source.
//!
//! Walks the raw text once and emits the ordered stream of structural events
//! (with byte offsets) that the tree builder consumes. Malformed input turns
//! into non-fatal [`Event::Error`] entries and scanning keeps going; a
//! trailing comma before `}` / `]` is accepted without complaint. Line (`//`)
//! and block (`/* */`) comments are reported as events, never discarded.

use serde_json::Number;

// ————————————————————————————————————————————————————————————————————————————
// TYPES
// ————————————————————————————————————————————————————————————————————————————

/// Literal payload carried by a value event. The tag always matches the kind
/// of the tree node built from it; `Null` is the absent-value arm.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Number(Number),
    Str(String),
    Null,
}

/// One structural parse event. Offsets and lengths are byte positions into
/// the scanned text. End events carry the closing token's own span.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ObjectBegin { offset: usize },
    ObjectEnd { offset: usize, length: usize },
    ArrayBegin { offset: usize },
    ArrayEnd { offset: usize, length: usize },
    /// A property name token inside an object; span covers the quoted key.
    Property { name: String, offset: usize, length: usize },
    Literal { value: Literal, offset: usize, length: usize },
    /// `:` or `,`.
    Separator { ch: char, offset: usize },
    Comment { offset: usize, length: usize },
    Error { code: ErrorCode, offset: usize, length: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ErrorCode {
    #[error("invalid symbol")]
    InvalidSymbol,
    #[error("invalid number format")]
    InvalidNumberFormat,
    #[error("property name expected")]
    PropertyNameExpected,
    #[error("value expected")]
    ValueExpected,
    #[error("colon expected")]
    ColonExpected,
    #[error("comma expected")]
    CommaExpected,
    #[error("closing brace expected")]
    CloseBraceExpected,
    #[error("closing bracket expected")]
    CloseBracketExpected,
    #[error("end of file expected")]
    EndOfFileExpected,
    #[error("invalid escape character in string")]
    InvalidEscapeCharacter,
    #[error("unexpected end of string")]
    UnexpectedEndOfString,
    #[error("unexpected end of comment")]
    UnexpectedEndOfComment,
}

// ————————————————————————————————————————————————————————————————————————————
// ENTRY POINT
// ————————————————————————————————————————————————————————————————————————————

/// Scan `src` to completion and return every event in source order.
pub fn scan(src: &str) -> Vec<Event> {
    let mut scanner = Scanner { src, pos: 0, events: Vec::new() };
    scanner.skip_trivia();
    if scanner.at_end() {
        scanner.error(ErrorCode::ValueExpected, src.len(), 0);
    } else {
        scanner.scan_value();
        scanner.skip_trivia();
        if !scanner.at_end() {
            let rest = src.len() - scanner.pos;
            scanner.error(ErrorCode::EndOfFileExpected, scanner.pos, rest);
        }
    }
    scanner.events
}

// ————————————————————————————————————————————————————————————————————————————
// IMPLEMENTATION
// ————————————————————————————————————————————————————————————————————————————

struct Scanner<'a> {
    src: &'a str,
    pos: usize,
    events: Vec<Event>,
}

impl<'a> Scanner<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn peek_at(&self, ahead: usize) -> Option<u8> {
        self.src.as_bytes().get(self.pos + ahead).copied()
    }

    fn push(&mut self, event: Event) {
        self.events.push(event);
    }

    fn error(&mut self, code: ErrorCode, offset: usize, length: usize) {
        self.push(Event::Error { code, offset, length });
    }

    /// Skip one whole character; local recovery around unexpected input.
    fn bump_char(&mut self) {
        if let Some(c) = self.src[self.pos..].chars().next() {
            self.pos += c.len_utf8();
        }
    }

    /// Skip whitespace, reporting any comments passed over as events.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') if self.peek_at(1) == Some(b'/') => self.line_comment(),
                Some(b'/') if self.peek_at(1) == Some(b'*') => self.block_comment(),
                _ => return,
            }
        }
    }

    fn line_comment(&mut self) {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b == b'\n' || b == b'\r' {
                break;
            }
            self.pos += 1;
        }
        self.push(Event::Comment { offset: start, length: self.pos - start });
    }

    fn block_comment(&mut self) {
        let start = self.pos;
        self.pos += 2;
        loop {
            match self.peek() {
                None => {
                    self.error(ErrorCode::UnexpectedEndOfComment, start, self.pos - start);
                    break;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.pos += 2;
                    break;
                }
                _ => self.pos += 1,
            }
        }
        self.push(Event::Comment { offset: start, length: self.pos - start });
    }

    fn scan_value(&mut self) {
        match self.peek() {
            Some(b'{') => self.scan_object(),
            Some(b'[') => self.scan_array(),
            Some(b'"') => {
                let (text, offset, length) = self.scan_string();
                self.push(Event::Literal { value: Literal::Str(text), offset, length });
            }
            Some(b'-') | Some(b'0'..=b'9') => self.scan_number(),
            Some(_) => self.scan_keyword(),
            None => self.error(ErrorCode::ValueExpected, self.pos, 0),
        }
    }

    fn scan_object(&mut self) {
        self.push(Event::ObjectBegin { offset: self.pos });
        self.pos += 1;
        let mut first = true;
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    self.error(ErrorCode::CloseBraceExpected, self.pos, 0);
                    self.push(Event::ObjectEnd { offset: self.pos, length: 0 });
                    return;
                }
                Some(b'}') => {
                    self.push(Event::ObjectEnd { offset: self.pos, length: 1 });
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            if !first {
                if self.peek() == Some(b',') {
                    self.push(Event::Separator { ch: ',', offset: self.pos });
                    self.pos += 1;
                    self.skip_trivia();
                    // trailing comma before the closing brace
                    if self.peek() == Some(b'}') || self.at_end() {
                        continue;
                    }
                } else {
                    self.error(ErrorCode::CommaExpected, self.pos, 0);
                }
            }
            first = false;
            if self.peek() == Some(b'"') {
                let (name, offset, length) = self.scan_string();
                self.push(Event::Property { name, offset, length });
            } else {
                self.error(ErrorCode::PropertyNameExpected, self.pos, 0);
                self.bump_char();
                continue;
            }
            self.skip_trivia();
            if self.peek() == Some(b':') {
                self.push(Event::Separator { ch: ':', offset: self.pos });
                self.pos += 1;
            } else {
                self.error(ErrorCode::ColonExpected, self.pos, 0);
            }
            self.skip_trivia();
            match self.peek() {
                // missing value, e.g. `{"a":}` or `{"a":,`
                Some(b'}') | Some(b',') | None => self.error(ErrorCode::ValueExpected, self.pos, 0),
                _ => self.scan_value(),
            }
        }
    }

    fn scan_array(&mut self) {
        self.push(Event::ArrayBegin { offset: self.pos });
        self.pos += 1;
        let mut first = true;
        loop {
            self.skip_trivia();
            match self.peek() {
                None => {
                    self.error(ErrorCode::CloseBracketExpected, self.pos, 0);
                    self.push(Event::ArrayEnd { offset: self.pos, length: 0 });
                    return;
                }
                Some(b']') => {
                    self.push(Event::ArrayEnd { offset: self.pos, length: 1 });
                    self.pos += 1;
                    return;
                }
                _ => {}
            }
            if !first {
                if self.peek() == Some(b',') {
                    self.push(Event::Separator { ch: ',', offset: self.pos });
                    self.pos += 1;
                    self.skip_trivia();
                    // trailing comma before the closing bracket
                    if self.peek() == Some(b']') || self.at_end() {
                        continue;
                    }
                } else {
                    self.error(ErrorCode::CommaExpected, self.pos, 0);
                }
            }
            first = false;
            self.scan_value();
        }
    }

    /// Quoted string; returns (decoded text, token offset, token length).
    fn scan_string(&mut self) -> (String, usize, usize) {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let Some(b) = self.peek() else {
                self.error(ErrorCode::UnexpectedEndOfString, start, self.pos - start);
                break;
            };
            match b {
                b'"' => {
                    self.pos += 1;
                    break;
                }
                b'\n' | b'\r' => {
                    self.error(ErrorCode::UnexpectedEndOfString, start, self.pos - start);
                    break;
                }
                b'\\' => {
                    self.pos += 1;
                    self.scan_escape(&mut out, start);
                }
                _ => {
                    let Some(c) = self.src[self.pos..].chars().next() else {
                        break;
                    };
                    out.push(c);
                    self.pos += c.len_utf8();
                }
            }
        }
        (out, start, self.pos - start)
    }

    fn scan_escape(&mut self, out: &mut String, string_start: usize) {
        let Some(b) = self.peek() else {
            self.error(ErrorCode::UnexpectedEndOfString, string_start, self.pos - string_start);
            return;
        };
        self.pos += 1;
        match b {
            b'"' => out.push('"'),
            b'\\' => out.push('\\'),
            b'/' => out.push('/'),
            b'b' => out.push('\u{0008}'),
            b'f' => out.push('\u{000c}'),
            b'n' => out.push('\n'),
            b'r' => out.push('\r'),
            b't' => out.push('\t'),
            b'u' => match self.scan_unicode_escape() {
                Some(c) => out.push(c),
                None => self.error(ErrorCode::InvalidEscapeCharacter, self.pos, 0),
            },
            _ => self.error(ErrorCode::InvalidEscapeCharacter, self.pos - 1, 1),
        }
    }

    fn scan_unicode_escape(&mut self) -> Option<char> {
        let high = self.hex4()?;
        if (0xD800..0xDC00).contains(&high) {
            // high surrogate; look for the paired `\uXXXX` low half
            if self.peek() == Some(b'\\') && self.peek_at(1) == Some(b'u') {
                let mark = self.pos;
                self.pos += 2;
                if let Some(low) = self.hex4() {
                    if (0xDC00..0xE000).contains(&low) {
                        let combined = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                        return char::from_u32(combined);
                    }
                }
                self.pos = mark;
            }
            return Some('\u{fffd}');
        }
        char::from_u32(high).or(Some('\u{fffd}'))
    }

    fn hex4(&mut self) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..4 {
            let digit = (self.peek()? as char).to_digit(16)?;
            value = value * 16 + digit;
            self.pos += 1;
        }
        Some(value)
    }

    fn scan_number(&mut self) {
        let start = self.pos;
        if self.peek() == Some(b'-') {
            self.pos += 1;
        }
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.pos += 1;
        }
        if self.peek() == Some(b'.') {
            self.pos += 1;
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some(b'e') | Some(b'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some(b'+') | Some(b'-')) {
                self.pos += 1;
            }
            while matches!(self.peek(), Some(b'0'..=b'9')) {
                self.pos += 1;
            }
        }
        let length = self.pos - start;
        // parse the exact lexeme so materialized values match serde_json
        match serde_json::from_str::<Number>(&self.src[start..self.pos]) {
            Ok(value) => self.push(Event::Literal { value: Literal::Number(value), offset: start, length }),
            Err(_) => self.error(ErrorCode::InvalidNumberFormat, start, length),
        }
    }

    fn scan_keyword(&mut self) {
        let start = self.pos;
        while matches!(self.peek(), Some(b) if b.is_ascii_alphabetic()) {
            self.pos += 1;
        }
        if self.pos == start {
            // not even a word; skip one character so scanning makes progress
            self.bump_char();
            self.error(ErrorCode::InvalidSymbol, start, self.pos - start);
            return;
        }
        let length = self.pos - start;
        match &self.src[start..self.pos] {
            "true" => self.push(Event::Literal { value: Literal::Bool(true), offset: start, length }),
            "false" => self.push(Event::Literal { value: Literal::Bool(false), offset: start, length }),
            "null" => self.push(Event::Literal { value: Literal::Null, offset: start, length }),
            _ => self.error(ErrorCode::InvalidSymbol, start, length),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// TESTS
// ————————————————————————————————————————————————————————————————————————————

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(events: &[Event]) -> Vec<ErrorCode> {
        events
            .iter()
            .filter_map(|e| match e {
                Event::Error { code, .. } => Some(*code),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn simple_object_event_order() {
        let events = scan(r#"{"a":1}"#);
        assert_eq!(events[0], Event::ObjectBegin { offset: 0 });
        assert_eq!(
            events[1],
            Event::Property { name: "a".into(), offset: 1, length: 3 }
        );
        assert_eq!(events[2], Event::Separator { ch: ':', offset: 4 });
        assert!(matches!(
            &events[3],
            Event::Literal { value: Literal::Number(_), offset: 5, length: 1 }
        ));
        assert_eq!(events[4], Event::ObjectEnd { offset: 6, length: 1 });
        assert!(errors(&events).is_empty());
    }

    #[test]
    fn trailing_comma_is_not_an_error() {
        assert!(errors(&scan(r#"{"a":1,}"#)).is_empty());
        assert!(errors(&scan("[1,2,]")).is_empty());
    }

    #[test]
    fn missing_value_reports_and_still_closes() {
        let events = scan(r#"{"a":}"#);
        assert_eq!(errors(&events), vec![ErrorCode::ValueExpected]);
        assert!(events.iter().any(|e| matches!(e, Event::ObjectEnd { .. })));
    }

    #[test]
    fn comments_are_events_with_exact_spans() {
        let src = "{\n// port\n\"port\": 8080\n}";
        let events = scan(src);
        let comment = events
            .iter()
            .find_map(|e| match e {
                Event::Comment { offset, length } => Some(&src[*offset..offset + length]),
                _ => None,
            })
            .unwrap();
        assert_eq!(comment, "// port");
        assert!(errors(&events).is_empty());
    }

    #[test]
    fn block_comment_and_unterminated_block() {
        let events = scan("/* hi */ {}");
        assert!(matches!(&events[0], Event::Comment { offset: 0, length: 8 }));
        let events = scan("{} /* oops");
        assert!(errors(&events).contains(&ErrorCode::UnexpectedEndOfComment));
    }

    #[test]
    fn unknown_keyword_is_invalid_symbol() {
        let events = scan(r#"{"a": nope}"#);
        assert!(errors(&events).contains(&ErrorCode::InvalidSymbol));
        assert!(events.iter().any(|e| matches!(e, Event::ObjectEnd { .. })));
    }

    #[test]
    fn string_escapes_decode() {
        let events = scan(r#"["a\n\t\"A😀"]"#);
        let text = events
            .iter()
            .find_map(|e| match e {
                Event::Literal { value: Literal::Str(s), .. } => Some(s.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(text, "a\n\t\"A😀");
    }

    #[test]
    fn unclosed_containers_report_at_end_of_input() {
        let events = scan(r#"{"a": [1, 2"#);
        let errs = errors(&events);
        assert!(errs.contains(&ErrorCode::CloseBracketExpected));
        assert!(errs.contains(&ErrorCode::CloseBraceExpected));
    }

    #[test]
    fn content_after_top_level_value() {
        let events = scan("{} {}");
        assert_eq!(errors(&events), vec![ErrorCode::EndOfFileExpected]);
    }
}
