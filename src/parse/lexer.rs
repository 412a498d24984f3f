//! Tokenizer for the pseudo-XML artifact format.
//!
//! Only tags are structural; everything else is text. Action bodies are read
//! in raw-text mode (see [`Lexer::raw_until_close`]) so generated code that
//! contains `<` or `>` is never tokenized.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("unterminated attribute value starting at byte {0}")]
    UnterminatedAttribute(usize),
    #[error("unterminated tag starting at byte {0}")]
    UnterminatedTag(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag<'a> {
    pub name: &'a str,
    pub attrs: Vec<(&'a str, &'a str)>,
    pub self_closing: bool,
}

impl<'a> Tag<'a> {
    pub fn attr(&self, key: &str) -> Option<&'a str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| *v)
    }

    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Open(Tag<'a>),
    Close(&'a str),
    Text(&'a str),
}

pub struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    /// Everything not yet consumed.
    pub fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'a>>, LexError> {
        let bytes = self.src.as_bytes();
        if self.pos >= bytes.len() {
            return Ok(None);
        }
        let start = self.pos;

        if bytes[start] == b'<' {
            match bytes.get(start + 1) {
                Some(b'/') if bytes.get(start + 2).is_some_and(|b| is_name_byte(*b)) => {
                    return self.close_tag(start).map(Some);
                }
                Some(b) if b.is_ascii_alphabetic() => {
                    return self.open_tag(start).map(Some);
                }
                _ => {}
            }
        }

        // Plain text runs to the next '<' after the current byte.
        let end = self.src[start + 1..]
            .find('<')
            .map(|i| start + 1 + i)
            .unwrap_or(bytes.len());
        self.pos = end;
        Ok(Some(Token::Text(&self.src[start..end])))
    }

    /// Jump to the next `<name ...>` start tag and lex just that tag. Text in
    /// between is skipped unread, so prose such as `i<n` never reaches the
    /// tokenizer.
    pub fn next_tag(&mut self, name: &str) -> Result<Option<Tag<'a>>, LexError> {
        while let Some(at) = find_open(self.src, self.pos, name) {
            self.pos = at;
            if let Some(Token::Open(tag)) = self.next_token()? {
                return Ok(Some(tag));
            }
            self.pos = at + 1;
        }
        self.pos = self.src.len();
        Ok(None)
    }

    /// Consume raw text up to the first closing tag named `name` and return it.
    /// The closing tag itself is consumed too. Returns `None` (consuming
    /// nothing) when no such closing tag follows.
    pub fn raw_until_close(&mut self, name: &str) -> Option<&'a str> {
        let (body_end, after) = find_close(self.src, self.pos, name)?;
        let body = &self.src[self.pos..body_end];
        self.pos = after;
        Some(body)
    }

    fn close_tag(&mut self, start: usize) -> Result<Token<'a>, LexError> {
        let bytes = self.src.as_bytes();
        let name_start = start + 2;
        let mut i = name_start;
        while i < bytes.len() && is_name_byte(bytes[i]) {
            i += 1;
        }
        let name = &self.src[name_start..i];
        let gt = self.src[i..]
            .find('>')
            .ok_or(LexError::UnterminatedTag(start))?;
        self.pos = i + gt + 1;
        Ok(Token::Close(name))
    }

    fn open_tag(&mut self, start: usize) -> Result<Token<'a>, LexError> {
        let bytes = self.src.as_bytes();
        let mut i = start + 1;
        while i < bytes.len() && is_name_byte(bytes[i]) {
            i += 1;
        }
        let name = &self.src[start + 1..i];
        let mut attrs = Vec::new();

        loop {
            while i < bytes.len() && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            let Some(&b) = bytes.get(i) else {
                return Err(LexError::UnterminatedTag(start));
            };
            match b {
                b'>' => {
                    self.pos = i + 1;
                    return Ok(Token::Open(Tag { name, attrs, self_closing: false }));
                }
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    self.pos = i + 2;
                    return Ok(Token::Open(Tag { name, attrs, self_closing: true }));
                }
                b if is_name_byte(b) => {
                    let key_start = i;
                    while i < bytes.len() && is_name_byte(bytes[i]) {
                        i += 1;
                    }
                    let key = &self.src[key_start..i];
                    let mut j = i;
                    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    if bytes.get(j) != Some(&b'=') {
                        attrs.push((key, ""));
                        continue;
                    }
                    j += 1;
                    while j < bytes.len() && bytes[j].is_ascii_whitespace() {
                        j += 1;
                    }
                    match bytes.get(j) {
                        Some(&q) if q == b'"' || q == b'\'' => {
                            let close = self.src[j + 1..]
                                .find(q as char)
                                .ok_or(LexError::UnterminatedAttribute(j))?;
                            attrs.push((key, &self.src[j + 1..j + 1 + close]));
                            i = j + 1 + close + 1;
                        }
                        Some(_) => {
                            let v_start = j;
                            while j < bytes.len()
                                && !bytes[j].is_ascii_whitespace()
                                && bytes[j] != b'>'
                            {
                                j += 1;
                            }
                            attrs.push((key, &self.src[v_start..j]));
                            i = j;
                        }
                        None => return Err(LexError::UnterminatedTag(start)),
                    }
                }
                // Stray punctuation inside a tag (JSX braces and the like).
                _ => i += 1,
            }
        }
    }
}

/// Locate the first `<name` at or after `from` that is followed by whitespace,
/// `>` or `/` (so `<boltActionX` does not match `boltAction`).
pub fn find_open(src: &str, from: usize, name: &str) -> Option<usize> {
    let bytes = src.as_bytes();
    let mut cursor = from;
    while let Some(rel) = src[cursor..].find('<') {
        let at = cursor + rel;
        let name_end = at + 1 + name.len();
        if name_end <= bytes.len()
            && src.is_char_boundary(name_end)
            && src[at + 1..name_end].eq_ignore_ascii_case(name)
            && bytes.get(name_end).map_or(true, |b| !is_name_byte(*b))
        {
            return Some(at);
        }
        cursor = at + 1;
    }
    None
}

/// Locate the first `</name>` at or after `from`. Whitespace is tolerated
/// between the name and `>`. Returns (start of the closing tag, byte after it).
pub fn find_close(src: &str, from: usize, name: &str) -> Option<(usize, usize)> {
    let bytes = src.as_bytes();
    let mut cursor = from;
    while let Some(rel) = src[cursor..].find("</") {
        let at = cursor + rel;
        let name_start = at + 2;
        let name_end = name_start + name.len();
        if name_end <= bytes.len()
            && src.is_char_boundary(name_end)
            && src[name_start..name_end].eq_ignore_ascii_case(name)
        {
            let mut k = name_end;
            while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if bytes.get(k) == Some(&b'>') {
                return Some((at, k + 1));
            }
        }
        cursor = at + 2;
    }
    None
}

/// First `name="value"` (or single-quoted) anywhere in `src`, tag or not.
/// Returns the value and the byte offset just past the closing quote.
pub fn find_attr<'a>(src: &'a str, name: &str) -> Option<(&'a str, usize)> {
    let bytes = src.as_bytes();
    let mut cursor = 0;
    while let Some(rel) = src[cursor..].find(name) {
        let at = cursor + rel;
        cursor = at + name.len();
        if at > 0 && is_name_byte(bytes[at - 1]) {
            continue;
        }
        let mut j = at + name.len();
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        if bytes.get(j) != Some(&b'=') {
            continue;
        }
        j += 1;
        while j < bytes.len() && bytes[j].is_ascii_whitespace() {
            j += 1;
        }
        let Some(&q) = bytes.get(j) else { continue };
        if q != b'"' && q != b'\'' {
            continue;
        }
        if let Some(close) = src[j + 1..].find(q as char) {
            return Some((&src[j + 1..j + 1 + close], j + 1 + close + 1));
        }
    }
    None
}
