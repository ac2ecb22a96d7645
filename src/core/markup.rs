//! Conversions between plain text and the rich markup families (HTML, RTF)

use std::sync::OnceLock;

use regex_lite::Regex;

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("markup pattern is valid"))
}

/// Escape text for inclusion in HTML
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        // Last, so "&amp;lt;" decodes to "&lt;" and not "<"
        .replace("&amp;", "&")
}

/// Wrap plain text in a minimal HTML document, one paragraph per line
pub fn text_to_html(text: &str) -> String {
    let mut html = String::from("<!DOCTYPE html>\n<html>\n<body>\n");
    for line in text.lines() {
        html.push_str("<p>");
        html.push_str(&escape_html(line));
        html.push_str("</p>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

/// Render HTML as plain text: block ends become newlines, tags are dropped
pub fn html_to_text(html: &str) -> String {
    static HIDDEN: OnceLock<Regex> = OnceLock::new();
    static SOURCE_BREAK: OnceLock<Regex> = OnceLock::new();
    static LINE_BREAK: OnceLock<Regex> = OnceLock::new();
    static BLOCK_END: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();

    let text = regex(
        &HIDDEN,
        r"(?is)<head\b.*?</head\s*>|<style\b.*?</style\s*>|<script\b.*?</script\s*>",
    )
    .replace_all(html, "");
    let text = regex(&SOURCE_BREAK, r"\s*\r?\n\s*").replace_all(&text, " ");
    let text = regex(&LINE_BREAK, r"(?i)<br\s*/?>").replace_all(&text, "\n");
    let text = regex(&BLOCK_END, r"(?i)</(p|div|li|tr|h[1-6])\s*>").replace_all(&text, "\n");
    let text = regex(&TAG, r"<[^>]*>").replace_all(&text, "");
    let text = decode_entities(&text);

    let lines: Vec<&str> = text.lines().map(str::trim).collect();
    lines.join("\n").trim_matches('\n').to_string()
}

/// Wrap plain text in a minimal RTF document
pub fn text_to_rtf(text: &str) -> String {
    let mut rtf = String::from("{\\rtf1\\ansi\\deff0\n");
    for line in text.lines() {
        for c in line.chars() {
            match c {
                '\\' => rtf.push_str("\\\\"),
                '{' => rtf.push_str("\\{"),
                '}' => rtf.push_str("\\}"),
                '\t' => rtf.push_str("\\tab "),
                c if c.is_ascii() => rtf.push(c),
                c => {
                    let mut units = [0u16; 2];
                    for unit in c.encode_utf16(&mut units) {
                        rtf.push_str(&format!("\\u{}?", *unit as i16));
                    }
                }
            }
        }
        rtf.push_str("\\par\n");
    }
    rtf.push('}');
    rtf
}

/// Destinations whose content is never rendered
const HIDDEN_DESTINATIONS: &[&str] = &["fonttbl", "colortbl", "stylesheet", "info", "pict"];

/// Windows-1252 characters for bytes 0x80..=0x9F; unassigned slots keep the C1 control
const CP1252_HIGH: [char; 32] = [
    '\u{20AC}', '\u{81}', '\u{201A}', '\u{192}', '\u{201E}', '\u{2026}', '\u{2020}', '\u{2021}',
    '\u{2C6}', '\u{2030}', '\u{160}', '\u{2039}', '\u{152}', '\u{8D}', '\u{17D}', '\u{8F}',
    '\u{90}', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}', '\u{2022}', '\u{2013}', '\u{2014}',
    '\u{2DC}', '\u{2122}', '\u{161}', '\u{203A}', '\u{153}', '\u{9D}', '\u{17E}', '\u{178}',
];

/// Decode a `\'hh` byte in the default `\ansi` code page
fn cp1252_char(byte: u8) -> char {
    match byte {
        0x80..=0x9F => CP1252_HIGH[usize::from(byte - 0x80)],
        _ => char::from(byte),
    }
}

/// Extract the visible text of an RTF document
pub fn rtf_to_text(rtf: &str) -> String {
    let mut out = String::new();
    // One entry per open group: whether its content is hidden
    let mut groups: Vec<bool> = Vec::new();
    let mut hidden = false;
    let mut chars = rtf.chars().peekable();
    let mut pending_surrogate: Option<u16> = None;

    while let Some(c) = chars.next() {
        match c {
            '{' => groups.push(hidden),
            '}' => hidden = groups.pop().unwrap_or(false),
            '\r' | '\n' => {}
            '\\' => match chars.peek().copied() {
                Some(escaped @ ('\\' | '{' | '}')) => {
                    chars.next();
                    if !hidden {
                        out.push(escaped);
                    }
                }
                Some('*') => {
                    chars.next();
                    hidden = true;
                }
                Some('\'') => {
                    chars.next();
                    let hex: String = chars.by_ref().take(2).collect();
                    if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                        if !hidden {
                            out.push(cp1252_char(byte));
                        }
                    }
                }
                Some(l) if l.is_ascii_alphabetic() => {
                    let mut word = String::new();
                    while let Some(&l) = chars.peek() {
                        if !l.is_ascii_alphabetic() {
                            break;
                        }
                        word.push(l);
                        chars.next();
                    }
                    let mut param = String::new();
                    if chars.peek() == Some(&'-') {
                        param.push('-');
                        chars.next();
                    }
                    while let Some(&d) = chars.peek() {
                        if !d.is_ascii_digit() {
                            break;
                        }
                        param.push(d);
                        chars.next();
                    }
                    if chars.peek() == Some(&' ') {
                        chars.next();
                    }

                    if HIDDEN_DESTINATIONS.contains(&word.as_str()) {
                        hidden = true;
                        continue;
                    }
                    if hidden {
                        continue;
                    }
                    match word.as_str() {
                        "par" | "line" => out.push('\n'),
                        "tab" => out.push('\t'),
                        "u" => {
                            // Skip the single fallback character
                            chars.next();
                            let unit = param.parse::<i16>().unwrap_or(0) as u16;
                            match pending_surrogate.take() {
                                Some(high) => {
                                    let decoded = char::decode_utf16([high, unit])
                                        .filter_map(Result::ok)
                                        .collect::<String>();
                                    out.push_str(&decoded);
                                }
                                None if (0xD800..0xDC00).contains(&unit) => {
                                    pending_surrogate = Some(unit);
                                }
                                None => {
                                    if let Some(ch) = char::from_u32(unit as u32) {
                                        out.push(ch);
                                    }
                                }
                            }
                        }
                        _ => {}
                    }
                }
                _ => {}
            },
            c if !hidden => out.push(c),
            _ => {}
        }
    }

    out.trim_end_matches('\n').to_string()
}
