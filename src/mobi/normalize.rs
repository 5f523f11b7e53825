//! HTML normalization for the MOBI container.
//!
//! The rendering engine behind this container predates modern HTML: scripted
//! and interactive elements cannot be represented at all, and a handful of
//! metadata tags have no rendering. `normalize` strips exactly those and
//! leaves every other byte alone, including malformed markup.

use memchr::memchr;

/// Elements removed together with their entire content.
const STRIP_WITH_CONTENT: &[&[u8]] = &[
    b"script", b"style", b"head", b"iframe", b"object", b"embed", b"video", b"audio", b"canvas",
    b"svg", b"form",
];

/// Tags removed while keeping their inner content.
const STRIP_TAG_ONLY: &[&[u8]] = &[
    b"link", b"meta", b"base", b"input", b"button", b"select", b"textarea", b"picture", b"source",
    b"nav",
];

/// Strip markup the container cannot represent.
///
/// Pure and total: malformed input passes through unchanged, and the
/// function is idempotent on already-normalized input.
pub fn normalize(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut pos = 0;

    while pos < raw.len() {
        let Some(lt) = memchr(b'<', &raw[pos..]) else {
            out.extend_from_slice(&raw[pos..]);
            break;
        };
        out.extend_from_slice(&raw[pos..pos + lt]);
        pos += lt;

        let Some(tag) = read_tag(raw, pos) else {
            // Not a parseable tag; the '<' is ordinary text.
            out.push(b'<');
            pos += 1;
            continue;
        };

        if in_table(STRIP_WITH_CONTENT, &tag.name) {
            if tag.is_close || tag.self_closing {
                // Stray close tag or contentless element: drop the tag alone.
                pos = tag.end;
            } else {
                pos = skip_element(raw, tag.end, &tag.name);
            }
        } else if in_table(STRIP_TAG_ONLY, &tag.name) {
            pos = tag.end;
        } else {
            out.extend_from_slice(&raw[pos..tag.end]);
            pos = tag.end;
        }
    }

    out
}

struct TagToken {
    /// Lowercased element name.
    name: Vec<u8>,
    is_close: bool,
    self_closing: bool,
    /// Byte position just past the closing '>'.
    end: usize,
}

/// Parse the tag starting at `raw[pos] == '<'`. Returns `None` when the
/// bytes do not form a complete tag, in which case the caller passes the
/// '<' through as text.
fn read_tag(raw: &[u8], pos: usize) -> Option<TagToken> {
    let mut i = pos + 1;
    let first = *raw.get(i)?;

    // Comments, doctypes and processing instructions pass through whole.
    if first == b'!' || first == b'?' {
        return None;
    }

    let is_close = first == b'/';
    if is_close {
        i += 1;
    }

    if !raw.get(i)?.is_ascii_alphabetic() {
        return None;
    }

    let name_start = i;
    while i < raw.len() && (raw[i].is_ascii_alphanumeric() || raw[i] == b'-') {
        i += 1;
    }
    let name: Vec<u8> = raw[name_start..i]
        .iter()
        .map(|b| b.to_ascii_lowercase())
        .collect();

    let gt = memchr(b'>', &raw[i..])?;
    let end = i + gt + 1;
    let self_closing = end >= 2 && raw[end - 2] == b'/';

    Some(TagToken {
        name,
        is_close,
        self_closing,
        end,
    })
}

/// Skip past the matching `</name>` close tag, discarding the element's
/// content. An unterminated element discards the rest of the input.
fn skip_element(raw: &[u8], mut pos: usize, name: &[u8]) -> usize {
    while pos < raw.len() {
        let Some(lt) = memchr(b'<', &raw[pos..]) else {
            return raw.len();
        };
        pos += lt;
        if let Some(tag) = read_tag(raw, pos) {
            if tag.is_close && tag.name == name {
                return tag.end;
            }
            pos = tag.end.max(pos + 1);
        } else {
            pos += 1;
        }
    }
    raw.len()
}

fn in_table(table: &[&[u8]], name: &[u8]) -> bool {
    table.iter().any(|entry| *entry == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize_str(s: &str) -> String {
        String::from_utf8(normalize(s.as_bytes())).unwrap()
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(normalize_str("hello world"), "hello world");
    }

    #[test]
    fn supported_markup_is_untouched() {
        let html = "<h1>Title</h1><p>Some <b>bold</b> text.</p>";
        assert_eq!(normalize_str(html), html);
    }

    #[test]
    fn script_is_removed_with_content() {
        assert_eq!(
            normalize_str("before<script>alert(1)</script>after"),
            "beforeafter"
        );
    }

    #[test]
    fn style_case_insensitive() {
        assert_eq!(normalize_str("a<STYLE>p{}</STYLE>b"), "ab");
    }

    #[test]
    fn meta_tag_dropped_content_kept() {
        assert_eq!(
            normalize_str("<meta charset=\"utf-8\"><p>kept</p>"),
            "<p>kept</p>"
        );
    }

    #[test]
    fn form_content_dropped() {
        assert_eq!(
            normalize_str("x<form action=\"/\"><input name=\"q\"></form>y"),
            "xy"
        );
    }

    #[test]
    fn self_closing_stripped_element_drops_tag_only() {
        assert_eq!(normalize_str("a<embed src=\"x\"/>b"), "ab");
    }

    #[test]
    fn unterminated_script_discards_rest() {
        assert_eq!(normalize_str("a<script>var x = 1;"), "a");
    }

    #[test]
    fn malformed_markup_passes_through() {
        let html = "<p>unclosed <b>nested <i>mess";
        assert_eq!(normalize_str(html), html);
        assert_eq!(normalize_str("2 < 3 and 5 > 4"), "2 < 3 and 5 > 4");
    }

    #[test]
    fn comments_pass_through() {
        let html = "<!-- note --><p>x</p>";
        assert_eq!(normalize_str(html), html);
    }

    #[test]
    fn idempotent() {
        let samples: &[&str] = &[
            "<h1>T</h1><script>x</script><p>body</p>",
            "<meta x><p>a</p><form><input></form>",
            "text with < stray and <unclosed",
            "<svg><circle r=\"1\"/></svg>tail",
        ];
        for s in samples {
            let once = normalize(s.as_bytes());
            let twice = normalize(&once);
            assert_eq!(once, twice, "normalize not idempotent for {s:?}");
        }
    }

    #[test]
    fn pagebreak_marker_survives() {
        assert_eq!(normalize_str("<mbp:pagebreak/>"), "<mbp:pagebreak/>");
    }
}
