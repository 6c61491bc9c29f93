//! Lenient decoding of percent escapes in captured text.
//!
//! Some capture sources hand over text with a subset of characters
//! percent-escaped. [`decode_escapes`] turns the escapes of whitespace and
//! ASCII punctuation back into characters, leaves every other `%XX` sequence
//! alone, and never touches `:url(...)` segments so style text keeps its
//! URLs intact. Unlike a strict URI decoder it cannot fail.

const URL_OPEN: &str = ":url(";

/// Decode the escapes `%09 %0A %0D` and the uppercase escapes of ASCII
/// punctuation and space.
pub fn decode_escapes(input: &str) -> String {
    if !input.contains('%') {
        return input.to_string();
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while !rest.is_empty() {
        if rest.starts_with(URL_OPEN) {
            if let Some(len) = url_segment_len(rest) {
                out.push_str(&rest[..len]);
                rest = &rest[len..];
                continue;
            }
        }
        if let Some(decoded) = decode_at(rest) {
            out.push(decoded);
            rest = &rest[3..];
            continue;
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }

    out
}

/// Length of a `:url(...)` segment at the start of `s`, if it is one.
fn url_segment_len(s: &str) -> Option<usize> {
    let body = &s[URL_OPEN.len()..];
    let close = body.find(')')?;
    if close == 0 {
        return None;
    }
    Some(URL_OPEN.len() + close + 1)
}

fn decode_at(s: &str) -> Option<char> {
    let bytes = s.as_bytes();
    if bytes.len() < 3 || bytes[0] != b'%' {
        return None;
    }
    let hi = upper_hex(bytes[1])?;
    let lo = upper_hex(bytes[2])?;
    let c = char::from(hi << 4 | lo);
    let decodable = matches!(c, '\t' | '\n' | '\r' | ' ') || c.is_ascii_punctuation();
    decodable.then_some(c)
}

fn upper_hex(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}
