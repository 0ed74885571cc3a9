//! Shared string helpers.

/// Escape text for inclusion in HTML text or a double-quoted attribute.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Check whether the byte at `pos` is escaped by an odd run of backslashes.
pub(crate) fn is_escaped(text: &str, pos: usize) -> bool {
    let backslashes = text.as_bytes()[..pos]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    backslashes % 2 == 1
}

/// Find the next occurrence of `pat` at or after `from` that is not
/// backslash-escaped.
pub(crate) fn find_unescaped(text: &str, pat: &str, from: usize) -> Option<usize> {
    let mut start = from;
    while let Some(offset) = text.get(start..)?.find(pat) {
        let pos = start + offset;
        if !is_escaped(text, pos) {
            return Some(pos);
        }
        start = pos + pat.len();
    }
    None
}

/// Byte ranges of HTML tags (including comments) in `html`.
///
/// Quoted attribute values are skipped, so a `>` inside `title="a > b"` does
/// not end the tag. A `<` not followed by a letter, `/` or `!` is text.
pub(crate) fn markup_ranges(html: &str) -> Vec<(usize, usize)> {
    let bytes = html.as_bytes();
    let mut ranges = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            i += 1;
            continue;
        }
        let start = i;
        let next = bytes.get(i + 1).copied().unwrap_or(b' ');

        if html[i..].starts_with("<!--") {
            let end = html[i + 4..].find("-->").map_or(bytes.len(), |p| i + 4 + p + 3);
            ranges.push((start, end));
            i = end;
            continue;
        }
        if !(next.is_ascii_alphabetic() || next == b'/' || next == b'!') {
            i += 1;
            continue;
        }

        i += 1;
        let mut quote: Option<u8> = None;
        while i < bytes.len() {
            let b = bytes[i];
            match quote {
                Some(q) if b == q => quote = None,
                Some(_) => {}
                None if b == b'"' || b == b'\'' => quote = Some(b),
                None if b == b'>' => break,
                None => {}
            }
            i += 1;
        }
        let end = (i + 1).min(bytes.len());
        ranges.push((start, end));
        i = end;
    }

    ranges
}
