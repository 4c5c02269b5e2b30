//! Recovery of the item object from text that merely contains JSON.

use std::sync::LazyLock;

use regex::Regex;

static ITEM_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""item"\s*:\s*\{"#).expect("valid item key regex"));
static DATA_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""data"\s*:\s*\{"#).expect("valid data key regex"));

/// Locates the first `"item": {...}` object in `text`, falling back to
/// `"data": {...}`. Returns the balanced object text (braces included), or
/// the unterminated remainder when the dump was truncated.
pub(crate) fn extract_item_fragment(text: &str) -> Option<&str> {
    [&*ITEM_KEY_RE, &*DATA_KEY_RE].into_iter().find_map(|re| {
        let m = re.find(text)?;
        // The match ends right after the opening `{`.
        let start = m.end() - 1;
        let rest = &text[start..];
        Some(extract_balanced_object(rest).unwrap_or(rest))
    })
}

/// Returns the shortest prefix of `s` that forms a complete `{...}` object.
///
/// Tracks brace depth while skipping string literals and escapes. Only `}`
/// at depth 0 ends the scan, so `{42]` is never accepted.
pub(crate) fn extract_balanced_object(s: &str) -> Option<&str> {
    if !s.starts_with('{') {
        return None;
    }
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            ']' => depth -= 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
