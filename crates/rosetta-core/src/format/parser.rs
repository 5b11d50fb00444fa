//! Bracket run-length scanner and placeholder-field scanner.
//!
//! Grounded on `offline/parse_format_string.py`: optional blocks are delimited by `[`/`]`, doubled
//! to escape (`[[` -> literal `[`), and placeholders use `{name[.attr][!conv][:spec]}` syntax
//! (doubled `{{`/`}}` to escape, standard `str.format` scanning).

use super::FormatError;

const START: char = '[';
const END: char = ']';

/// A single literal-or-placeholder fragment inside an [`Element`](super::Element).
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Literal(String),
    Placeholder {
        name: String,
        attr: Option<String>,
        conversion: Option<char>,
        spec: Option<String>,
    },
}

/// Scans a bracket-delimited block (no `[`/`]` handling left to do) for `{...}` placeholders.
///
/// Returns the ordered pieces and the placeholder names encountered, in order of appearance.
pub fn scan_placeholders(block: &str) -> Result<(Vec<Piece>, Vec<String>), FormatError> {
    let chars: Vec<char> = block.chars().collect();
    let mut pieces = Vec::new();
    let mut placeholders = Vec::new();
    let mut literal = String::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '{' if chars.get(i + 1) == Some(&'{') => {
                literal.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                literal.push('}');
                i += 2;
            }
            '{' => {
                if !literal.is_empty() {
                    pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                }
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == '}')
                    .map(|p| p + i)
                    .ok_or_else(|| FormatError::Field {
                        block: block.to_string(),
                        reason: "unterminated '{' placeholder".to_string(),
                    })?;
                let field: String = chars[i + 1..close].iter().collect();
                let (name, attr, conversion, spec) = parse_field(&field).ok_or_else(|| FormatError::Field {
                    block: block.to_string(),
                    reason: format!("could not parse placeholder field '{{{field}}}'"),
                })?;
                placeholders.push(name.clone());
                pieces.push(Piece::Placeholder {
                    name,
                    attr,
                    conversion,
                    spec,
                });
                i = close + 1;
            }
            '}' => {
                return Err(FormatError::Field {
                    block: block.to_string(),
                    reason: "unmatched '}'".to_string(),
                });
            }
            other => {
                literal.push(other);
                i += 1;
            }
        }
    }
    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok((pieces, placeholders))
}

/// Parses a single `name[.attr][!conv][:spec]` field body, returning `None` on malformed input.
fn parse_field(field: &str) -> Option<(String, Option<String>, Option<char>, Option<String>)> {
    let (name_and_attr, spec) = match field.find(':') {
        Some(idx) => (&field[..idx], Some(field[idx + 1..].to_string())),
        None => (field, None),
    };
    let (name_and_attr, conversion) = match name_and_attr.find('!') {
        Some(idx) => (&name_and_attr[..idx], name_and_attr[idx + 1..].chars().next()),
        None => (name_and_attr, None),
    };
    let (name, attr) = match name_and_attr.find('.') {
        Some(idx) => (
            name_and_attr[..idx].to_string(),
            Some(name_and_attr[idx + 1..].to_string()),
        ),
        None => (name_and_attr.to_string(), None),
    };
    if name.is_empty() {
        return None;
    }
    Some((name, attr, conversion, spec))
}

/// Splits `fmt` into raw bracket-delimited blocks using the run-length doubling rule: a delimiter
/// character repeated `k` times contributes one literal for each pair, and an odd `k` means the
/// last repetition opens/closes an optional block.
///
/// Returns a list of `(text, in_optional_block)` blocks with `[[`/`]]` left un-doubled (i.e. still
/// escaped, as in the Python original) for the placeholder scanner to finish unescaping.
pub fn split_optional_blocks(fmt: &str) -> Result<Vec<(String, bool)>, FormatError> {
    if fmt.is_empty() {
        return Ok(vec![(String::new(), false)]);
    }

    let chars: Vec<char> = fmt.chars().collect();
    let mut blocks = Vec::new();

    let mut in_optional_block = chars[0] == START;
    let mut open_idx: i64 = if in_optional_block { 0 } else { -1 };
    let mut prev_idx: usize = usize::from(in_optional_block);

    let mut same_count = 1usize;
    let start_i = usize::from(in_optional_block);
    let mut idx = start_i;
    while idx < chars.len() {
        let c = chars[idx];
        let next = chars.get(idx + 1).copied();
        let is_delim = c == START || c == END;
        if next == Some(c) && is_delim {
            same_count += 1;
        } else {
            if same_count % 2 == 1 && is_delim {
                if c == START {
                    if open_idx != -1 {
                        return Err(FormatError::BadDelimiter {
                            format_string: fmt.to_string(),
                            open_idx,
                            idx: idx as i64,
                        });
                    }
                    open_idx = idx as i64;
                } else {
                    if open_idx == -1 {
                        return Err(FormatError::BadDelimiter {
                            format_string: fmt.to_string(),
                            open_idx,
                            idx: idx as i64,
                        });
                    }
                    open_idx = -1;
                }

                if prev_idx != idx {
                    let part: String = chars[prev_idx..idx].iter().collect();
                    blocks.push((part, in_optional_block));
                }
                in_optional_block = !in_optional_block;
                prev_idx = idx + 1;
            }
            same_count = 1;
        }
        idx += 1;
    }

    if prev_idx != chars.len() {
        let part: String = chars[prev_idx..].iter().collect();
        blocks.push((part, in_optional_block));
    }

    if in_optional_block {
        return Err(FormatError::BadDelimiter {
            format_string: fmt.to_string(),
            open_idx,
            idx: -1,
        });
    }

    Ok(blocks)
}

/// Replaces doubled bracket escapes (`[[`, `]]`) with their literal single-character form.
pub fn unescape_brackets(s: &str) -> String {
    s.replace("[[", "[").replace("]]", "]")
}
