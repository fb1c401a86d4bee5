//! Brace-delimited chunk scanning and tagged field reading.
//!
//! ASE text is a tree of `*LABEL` tokens, some followed by a `{ … }` block.
//! [`find_chunk`] extracts the body of such a block; [`FieldReader`] walks a
//! body and parses the values that follow individual tags.

use std::str::FromStr;

use crate::error::{AseError, Result};

/// The body of a `{ … }` block following a label.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Chunk<'a> {
    /// Byte offset of the label in the scanned text.
    pub start: usize,
    /// Text strictly between the outer braces.
    pub body: &'a str,
    /// Byte offset one past the closing brace.
    pub end: usize,
}

fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Offset of the first occurrence of `label` at or after `from` that stands
/// on its own: `*MESH_FACE` does not match inside `*MESH_FACE_LIST`, and
/// `*MATERIAL 1` does not match inside `*MATERIAL 12`.
pub fn find_label(text: &str, label: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let label_bytes = label.as_bytes();
    let (first, last) = (*label_bytes.first()?, *label_bytes.last()?);
    let step = label.chars().next().map_or(1, char::len_utf8);

    let mut pos = from;
    loop {
        let idx = pos + text.get(pos..)?.find(label)?;
        let after = idx + label.len();
        let open_before = !is_label_byte(first) || idx == 0 || !is_label_byte(bytes[idx - 1]);
        let open_after =
            !is_label_byte(last) || after >= bytes.len() || !is_label_byte(bytes[after]);
        if open_before && open_after {
            return Some(idx);
        }
        pos = idx + step;
    }
}

/// Balance the first `{` at or after `pos`.
///
/// `label` only names the chunk in errors.
pub fn chunk_at<'a>(text: &'a str, pos: usize, label: &str) -> Result<Chunk<'a>> {
    let bytes = text.as_bytes();
    let open = text
        .get(pos..)
        .and_then(|rest| rest.find('{'))
        .map(|offset| pos + offset)
        .ok_or_else(|| AseError::malformed(label, "no opening brace after label"))?;

    let mut depth = 0usize;
    for (close, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok(Chunk {
                        start: pos,
                        body: &text[open + 1..close],
                        end: close + 1,
                    });
                }
            }
            _ => {}
        }
    }
    Err(AseError::malformed(label, "unbalanced braces"))
}

/// Locate `label` at or after `offset` and return the block that follows it.
///
/// Returns `Ok(None)` when the label does not occur. A label without a
/// following `{`, or a block whose braces never balance, is an error.
pub fn find_chunk<'a>(text: &'a str, label: &str, offset: usize) -> Result<Option<Chunk<'a>>> {
    let Some(start) = find_label(text, label, offset) else {
        return Ok(None);
    };
    let chunk = chunk_at(text, start + label.len(), label)?;
    Ok(Some(Chunk { start, ..chunk }))
}

/// [`find_chunk`] from the start of `text`, failing when the label is absent.
pub fn require_chunk<'a>(text: &'a str, label: &str) -> Result<Chunk<'a>> {
    find_chunk(text, label, 0)?.ok_or_else(|| AseError::malformed(label, "label not found"))
}

/// Cursor over chunk text that advances explicitly and reports what it
/// failed to find.
pub struct FieldReader<'a> {
    text: &'a str,
    pos: usize,
    field: String,
}

impl<'a> FieldReader<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            pos: 0,
            field: String::new(),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Jump forward to `pos`, e.g. past a chunk read from the same text.
    pub fn skip_to(&mut self, pos: usize) {
        self.pos = self.pos.max(pos.min(self.text.len()));
    }

    /// Move past the next occurrence of `tag`.
    pub fn seek(&mut self, tag: &str) -> Result<()> {
        if self.try_seek(tag) {
            Ok(())
        } else {
            Err(AseError::FieldNotFound(tag.to_string()))
        }
    }

    /// Like [`seek`](Self::seek), but leaves the cursor in place when the
    /// tag does not occur.
    pub fn try_seek(&mut self, tag: &str) -> bool {
        match find_label(self.text, tag, self.pos) {
            Some(idx) => {
                self.pos = idx + tag.len();
                self.field.clear();
                self.field.push_str(tag);
                true
            }
            None => false,
        }
    }

    fn skip_whitespace(&mut self) {
        let text = self.text;
        let rest = &text[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn invalid(&self, value: &str) -> AseError {
        AseError::InvalidValue {
            field: self.field.clone(),
            value: value.to_string(),
        }
    }

    /// The next whitespace-delimited token.
    pub fn next_token(&mut self) -> Result<&'a str> {
        self.skip_whitespace();
        let text = self.text;
        let rest = &text[self.pos..];
        let len = rest.find(char::is_whitespace).unwrap_or(rest.len());
        if len == 0 {
            return Err(self.invalid(""));
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    pub fn next_value<T: FromStr>(&mut self) -> Result<T> {
        let token = self.next_token()?;
        token.parse().map_err(|_| self.invalid(token))
    }

    pub fn next_f32(&mut self) -> Result<f32> {
        self.next_value()
    }

    pub fn next_usize(&mut self) -> Result<usize> {
        self.next_value()
    }

    /// An entry index, with or without a trailing colon (`12` or `12:`).
    pub fn next_index(&mut self) -> Result<usize> {
        let token = self.next_token()?;
        token
            .strip_suffix(':')
            .unwrap_or(token)
            .parse()
            .map_err(|_| self.invalid(token))
    }

    /// The integer after `key:`, written either as `A: 3` or `A:3`.
    pub fn next_keyed_usize(&mut self, key: &str) -> Result<usize> {
        let token = self.next_token()?;
        let inline = token
            .strip_prefix(key)
            .and_then(|rest| rest.strip_prefix(':'))
            .ok_or_else(|| AseError::InvalidValue {
                field: format!("{key}:"),
                value: token.to_string(),
            })?;
        let value = if inline.is_empty() {
            self.next_token()?
        } else {
            inline
        };
        value.parse().map_err(|_| AseError::InvalidValue {
            field: format!("{key}:"),
            value: value.to_string(),
        })
    }

    /// A double-quoted string; the quotes are not part of the result.
    pub fn next_quoted(&mut self) -> Result<&'a str> {
        self.skip_whitespace();
        let text = self.text;
        let rest = &text[self.pos..];
        let Some(inner) = rest.strip_prefix('"') else {
            let token = rest.split_whitespace().next().unwrap_or("");
            return Err(self.invalid(token));
        };
        let len = inner
            .find('"')
            .ok_or_else(|| self.invalid(rest.lines().next().unwrap_or(rest)))?;
        self.pos += len + 2;
        Ok(&inner[..len])
    }

    pub fn next_vec3(&mut self) -> Result<[f32; 3]> {
        Ok([self.next_f32()?, self.next_f32()?, self.next_f32()?])
    }
}

pub fn has_field(text: &str, tag: &str) -> bool {
    find_label(text, tag, 0).is_some()
}

fn reader_at<'a>(text: &'a str, tag: &str) -> Result<FieldReader<'a>> {
    let mut reader = FieldReader::new(text);
    reader.seek(tag)?;
    Ok(reader)
}

pub fn read_f32(text: &str, tag: &str) -> Result<f32> {
    reader_at(text, tag)?.next_f32()
}

pub fn read_usize(text: &str, tag: &str) -> Result<usize> {
    reader_at(text, tag)?.next_usize()
}

pub fn read_quoted<'a>(text: &'a str, tag: &str) -> Result<&'a str> {
    reader_at(text, tag)?.next_quoted()
}

pub fn read_vec3(text: &str, tag: &str) -> Result<[f32; 3]> {
    reader_at(text, tag)?.next_vec3()
}

/// `Ok(None)` when the tag is absent; a present tag must parse.
pub fn read_optional_f32(text: &str, tag: &str) -> Result<Option<f32>> {
    if has_field(text, tag) {
        read_f32(text, tag).map(Some)
    } else {
        Ok(None)
    }
}

pub fn read_optional_quoted<'a>(text: &'a str, tag: &str) -> Result<Option<&'a str>> {
    if has_field(text, tag) {
        read_quoted(text, tag).map(Some)
    } else {
        Ok(None)
    }
}
