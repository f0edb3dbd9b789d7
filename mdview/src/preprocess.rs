//! Source rewrites applied before parsing.

/// Insert one ASCII space after every character that takes three or more
/// bytes in UTF-8 (CJK ideographs, kana, most symbols).
///
/// Some glyph measurers cannot break lines inside runs of wide characters;
/// the inserted spaces give the layout engine a break opportunity after each
/// one. Characters of one or two bytes are copied unchanged.
pub fn inject_cjk_spaces(input: &str) -> String {
    let mut out = String::with_capacity(input.len() * 2);
    for ch in input.chars() {
        out.push(ch);
        if ch.len_utf8() >= 3 {
            out.push(' ');
        }
    }
    out
}
