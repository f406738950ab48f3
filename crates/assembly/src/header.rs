//! Function-header parsing and parameter-list substitution.
//!
//! A fragment's stored body carries its decorator, function header, and
//! code. When parameters change in metadata, only the header's parameter
//! list is rewritten: the function name and body are left untouched. The
//! parser matches the fragment's own top-level header (column 0), never a
//! nested/inner `def`.

/// The located header of a fragment body.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// Function name as written in the header.
    pub name: String,
    /// Byte range of the text between the header's parentheses.
    pub params_start: usize,
    pub params_end: usize,
}

/// Locate the body's top-level function header.
///
/// Returns `None` when no column-0 `def`/`async def` line with a balanced
/// parameter list exists.
pub fn find_header(body: &str) -> Option<Header> {
    let mut offset = 0;
    for line in body.split_inclusive('\n') {
        let header_offset = match header_token_len(line) {
            Some(len) => offset + len,
            None => {
                offset += line.len();
                continue;
            }
        };

        // Function name runs from the keyword to the opening paren.
        let after_def = &body[header_offset..];
        let open_rel = after_def.find('(')?;
        let name = after_def[..open_rel].trim();
        if name.is_empty() || !is_identifier(name) {
            return None;
        }

        let params_start = header_offset + open_rel + 1;
        let params_end = match_close_paren(body, params_start)?;
        return Some(Header { name: name.to_string(), params_start, params_end });
    }
    None
}

/// Replace the top-level header's parameter list with `signature`, leaving
/// the function name and body unchanged. `None` when no header is found.
pub fn substitute_params(body: &str, signature: &str) -> Option<String> {
    let header = find_header(body)?;
    let mut out = String::with_capacity(body.len() + signature.len());
    out.push_str(&body[..header.params_start]);
    out.push_str(signature);
    out.push_str(&body[header.params_end..]);
    Some(out)
}

/// Length of the `def ` / `async def ` prefix when `line` is a top-level
/// function header, else `None`. Indented lines never match, which is what
/// keeps nested defs out of reach.
fn header_token_len(line: &str) -> Option<usize> {
    if line.starts_with("async def ") {
        Some("async def ".len())
    } else if line.starts_with("def ") {
        Some("def ".len())
    } else {
        None
    }
}

/// Find the byte index of the `)` closing the parameter list opened just
/// before `start`. Tracks nesting depth and skips string literals so a
/// quoted `)` inside a default value does not end the scan.
fn match_close_paren(body: &str, start: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (i, ch) in body[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_')
}
