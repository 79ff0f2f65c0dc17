use std::borrow::Cow;
use std::collections::HashMap;

use tracing::warn;

use crate::error::{ParseError, ParseErrorKind};
use crate::model::{Entry, MalformedLines};

/// Parse `.env` entries from UTF-8 text, failing on the first malformed line.
///
/// Values are returned after quote stripping; no substitution happens here.
pub fn parse_str(input: &str) -> Result<Vec<Entry>, ParseError> {
    parse_str_with_mode(input, MalformedLines::Abort)
}

/// Parse `.env` entries from UTF-8 text with a specific malformed-line policy.
pub fn parse_str_with_mode(
    input: &str,
    malformed_lines: MalformedLines,
) -> Result<Vec<Entry>, ParseError> {
    let normalized = normalize_newlines(input);

    let mut entries = Vec::new();
    let mut by_key = HashMap::<String, usize>::new();

    for (idx, line) in normalized.split('\n').enumerate() {
        let line_num = idx as u32 + 1;
        let entry = match parse_line(line, line_num) {
            Ok(Some(entry)) => entry,
            Ok(None) => continue,
            Err(err) if malformed_lines == MalformedLines::Skip => {
                warn!(line = err.line, error = %err, "skipping malformed line");
                continue;
            }
            Err(err) => return Err(err),
        };

        if let Some(existing_idx) = by_key.get(&entry.key).copied() {
            entries[existing_idx] = entry;
        } else {
            by_key.insert(entry.key.clone(), entries.len());
            entries.push(entry);
        }
    }

    Ok(entries)
}

fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if !input.contains('\r') {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            out.push('\n');
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
            continue;
        }
        out.push(ch);
    }

    Cow::Owned(out)
}

fn parse_line(line: &str, line_num: u32) -> Result<Option<Entry>, ParseError> {
    let working = line.trim();
    if working.is_empty() || working.starts_with('#') {
        return Ok(None);
    }

    let Some((raw_key, raw_value)) = working.split_once('=') else {
        let column = line.trim_end().chars().count() as u32 + 1;
        return Err(ParseError::new(
            line_num,
            column,
            ParseErrorKind::InvalidSyntax,
        ));
    };

    let key = raw_key.trim();
    if key.is_empty() {
        return Err(ParseError::new(line_num, 1, ParseErrorKind::MissingKey));
    }

    Ok(Some(Entry {
        key: key.to_owned(),
        value: unquote(raw_value.trim()),
        line: line_num,
    }))
}

/// Strip one matching pair of surrounding quotes and unescape that quote.
fn unquote(value: &str) -> String {
    for (quote, escaped) in [('"', "\\\""), ('\'', "\\'")] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            let inner = &value[1..value.len() - 1];
            return inner.replace(escaped, &quote.to_string());
        }
    }
    value.to_owned()
}
