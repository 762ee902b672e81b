use super::Modifier;
use thiserror::Error;

const PREFIXES: &[char] = &['/', '.'];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("missing parameter name at {index}")]
    MissingName { index: usize },

    #[error("missing pattern at {index}")]
    MissingPattern { index: usize },

    #[error("unbalanced pattern at {index}")]
    Unbalanced { index: usize },

    #[error("capturing groups are not allowed at {index}")]
    CapturingGroup { index: usize },

    #[error("unexpected modifier '{modifier}' at {index}")]
    UnexpectedModifier { modifier: char, index: usize },

    #[error("trailing escape character")]
    TrailingEscape,

    #[error("{0}")]
    Regex(String),
}

/// One piece of a parsed path pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Part {
    Literal(String),
    Param { name: Option<String>, prefix: String, pattern: Option<String>, modifier: Modifier },
}

/// Splits a path pattern into literal text and parameters.
///
/// A `/` or `.` written directly before a parameter is moved into the parameter's
/// prefix so that optional and repeated parameters swallow their separator.
pub(crate) fn parse(source: &str) -> Result<Vec<Part>, PatternError> {
    let chars = source.char_indices().collect::<Vec<_>>();
    let mut parts = Vec::new();
    let mut literal = String::new();
    // true when the last char pushed into `literal` came from an escape
    let mut last_escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let (index, c) = chars[i];
        match c {
            '\\' => {
                let (_, escaped) = *chars.get(i + 1).ok_or(PatternError::TrailingEscape)?;
                literal.push(escaped);
                last_escaped = true;
                i += 2;
            }
            ':' => {
                let mut name = String::new();
                let mut j = i + 1;
                while let Some(&(_, ch)) = chars.get(j) {
                    if ch.is_ascii_alphanumeric() || ch == '_' {
                        name.push(ch);
                        j += 1;
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    return Err(PatternError::MissingName { index });
                }

                let mut pattern = None;
                if let Some(&(_, '(')) = chars.get(j) {
                    let (custom, next) = read_pattern(&chars, j)?;
                    pattern = Some(custom);
                    j = next;
                }
                let (modifier, next) = read_modifier(&chars, j);
                let prefix = take_prefix(&mut literal, last_escaped);
                flush(&mut parts, &mut literal);
                parts.push(Part::Param { name: Some(name), prefix, pattern, modifier });
                last_escaped = false;
                i = next;
            }
            '(' => {
                let (custom, next) = read_pattern(&chars, i)?;
                let (modifier, next) = read_modifier(&chars, next);
                let prefix = take_prefix(&mut literal, last_escaped);
                flush(&mut parts, &mut literal);
                parts.push(Part::Param { name: None, prefix, pattern: Some(custom), modifier });
                last_escaped = false;
                i = next;
            }
            '?' | '*' | '+' => return Err(PatternError::UnexpectedModifier { modifier: c, index }),
            _ => {
                literal.push(c);
                last_escaped = false;
                i += 1;
            }
        }
    }

    flush(&mut parts, &mut literal);
    Ok(parts)
}

fn flush(parts: &mut Vec<Part>, literal: &mut String) {
    if !literal.is_empty() {
        parts.push(Part::Literal(std::mem::take(literal)));
    }
}

fn take_prefix(literal: &mut String, last_escaped: bool) -> String {
    if last_escaped {
        return String::new();
    }
    match literal.chars().last() {
        Some(c) if PREFIXES.contains(&c) => {
            literal.pop();
            c.to_string()
        }
        _ => String::new(),
    }
}

fn read_modifier(chars: &[(usize, char)], at: usize) -> (Modifier, usize) {
    match chars.get(at) {
        Some(&(_, '?')) => (Modifier::Optional, at + 1),
        Some(&(_, '*')) => (Modifier::ZeroOrMore, at + 1),
        Some(&(_, '+')) => (Modifier::OneOrMore, at + 1),
        _ => (Modifier::None, at),
    }
}

/// Reads a `( ... )` custom pattern starting at `open`, returns the inner text and
/// the position after the closing paren.
fn read_pattern(chars: &[(usize, char)], open: usize) -> Result<(String, usize), PatternError> {
    let start_index = chars[open].0;
    let mut depth = 1;
    let mut pattern = String::new();
    let mut j = open + 1;

    if let Some(&(index, '?')) = chars.get(j) {
        return Err(PatternError::MissingPattern { index });
    }

    while let Some(&(index, c)) = chars.get(j) {
        match c {
            '\\' => {
                let (_, escaped) = *chars.get(j + 1).ok_or(PatternError::TrailingEscape)?;
                pattern.push('\\');
                pattern.push(escaped);
                j += 2;
                continue;
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    j += 1;
                    break;
                }
            }
            '(' => {
                depth += 1;
                if !matches!(chars.get(j + 1), Some(&(_, '?'))) {
                    return Err(PatternError::CapturingGroup { index });
                }
            }
            _ => {}
        }
        pattern.push(c);
        j += 1;
    }

    if depth != 0 {
        return Err(PatternError::Unbalanced { index: start_index });
    }
    if pattern.is_empty() {
        return Err(PatternError::MissingPattern { index: start_index });
    }
    Ok((pattern, j))
}
