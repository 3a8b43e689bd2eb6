//! One-time migration of attachment records stored by the old PHP plugin.
//!
//! Those records were kept as a PHP-serialized array in the attachment's text
//! column, e.g.
//!
//! ```text
//! a:5:{s:4:"name";s:5:"a.pdf";s:4:"path";s:38:"/var/www/usr/uploads/2024/05/123.pdf";...}
//! ```
//!
//! Image entries additionally carried `img_key` (remote id) and `img_id`
//! (MD5). New records never pass through here.
//!
//! A host migrates each old record once, through `POST /attachments/migrate`
//! in `lhl-api` or by calling [`parse_legacy_record`] directly, and stores the
//! returned JSON record in place of the blob.

use super::types::{AttachmentRecord, RemoteObject};

/// Decoded PHP value. Only what attachment arrays use is supported.
#[derive(Debug, Clone, PartialEq)]
enum PhpValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Array(Vec<(PhpValue, PhpValue)>),
}

impl PhpValue {
    fn as_text(&self) -> Option<String> {
        match self {
            Self::Str(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn as_u64(&self) -> Option<u64> {
        match self {
            Self::Int(i) => u64::try_from(*i).ok(),
            Self::Bool(b) => Some(u64::from(*b)),
            Self::Float(f) if f.is_finite() && *f >= 0.0 => Some(f.round() as u64),
            Self::Str(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Attachment records are one flat array; anything nested deeper is refused.
const MAX_ARRAY_DEPTH: usize = 1;

struct Parser<'a> {
    input: &'a [u8],
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            depth: 0,
        }
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        (self.input.get(self.pos) == Some(&byte)).then(|| self.pos += 1)
    }

    /// Read up to (and consume) `end`.
    fn until(&mut self, end: u8) -> Option<&'a str> {
        let rest = self.input.get(self.pos..)?;
        let len = rest.iter().position(|b| *b == end)?;
        self.pos += len + 1;
        std::str::from_utf8(&rest[..len]).ok()
    }

    fn value(&mut self) -> Option<PhpValue> {
        let tag = *self.input.get(self.pos)?;
        self.pos += 1;

        if tag == b'N' {
            self.expect(b';')?;
            return Some(PhpValue::Null);
        }

        self.expect(b':')?;
        match tag {
            b'b' => Some(PhpValue::Bool(self.until(b';')? == "1")),
            b'i' => self.until(b';')?.parse().ok().map(PhpValue::Int),
            b'd' => self.until(b';')?.parse().ok().map(PhpValue::Float),
            b's' => {
                let len: usize = self.until(b':')?.parse().ok()?;
                self.expect(b'"')?;
                let bytes = self.input.get(self.pos..self.pos.checked_add(len)?)?;
                let text = String::from_utf8_lossy(bytes).into_owned();
                self.pos += len;
                self.expect(b'"')?;
                self.expect(b';')?;
                Some(PhpValue::Str(text))
            }
            b'a' => {
                if self.depth >= MAX_ARRAY_DEPTH {
                    return None;
                }
                let count: usize = self.until(b':')?.parse().ok()?;
                self.expect(b'{')?;
                self.depth += 1;
                let mut entries = Vec::with_capacity(count.min(64));
                for _ in 0..count {
                    let key = self.value()?;
                    let value = self.value()?;
                    entries.push((key, value));
                }
                self.depth -= 1;
                self.expect(b'}')?;
                Some(PhpValue::Array(entries))
            }
            _ => None,
        }
    }
}

/// Rebuild a typed record from a PHP-serialized attachment blob.
///
/// Returns `None` for anything that is not an attachment array with at
/// least a `path`.
#[must_use]
pub fn parse_legacy_record(text: &str) -> Option<AttachmentRecord> {
    let PhpValue::Array(entries) = Parser::new(text).value()? else {
        return None;
    };

    let field = |name: &str| {
        entries
            .iter()
            .find(|(key, _)| matches!(key, PhpValue::Str(k) if k == name))
            .map(|(_, value)| value)
    };
    let text_field = |name: &str| field(name).and_then(PhpValue::as_text);

    let path = text_field("path")?;
    let remote = text_field("img_key")
        .filter(|id| !id.is_empty())
        .map(|remote_id| RemoteObject {
            remote_id,
            content_hash: text_field("img_id").unwrap_or_default(),
        });

    Some(AttachmentRecord {
        name: text_field("name").unwrap_or_default(),
        path,
        size: field("size").and_then(PhpValue::as_u64).unwrap_or(0),
        file_type: text_field("type").unwrap_or_default().to_ascii_lowercase(),
        mime: text_field("mime"),
        remote,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn php_str(s: &str) -> String {
        format!("s:{}:\"{}\";", s.len(), s)
    }

    fn legacy_blob(pairs: &[(&str, &str)], size: i64) -> String {
        let mut body = String::new();
        for (key, value) in pairs {
            body.push_str(&php_str(key));
            body.push_str(&php_str(value));
        }
        body.push_str(&php_str("size"));
        body.push_str(&format!("i:{size};"));
        format!("a:{}:{{{body}}}", pairs.len() + 1)
    }

    #[test]
    fn test_local_record() {
        let blob = legacy_blob(
            &[
                ("name", "季度报告.pdf"),
                ("path", "/var/www/usr/uploads/2024/05/123.pdf"),
                ("type", "pdf"),
                ("mime", "application/pdf"),
            ],
            2048,
        );

        let record = parse_legacy_record(&blob).expect("record");
        assert_eq!(record.name, "季度报告.pdf");
        assert_eq!(record.path, "/var/www/usr/uploads/2024/05/123.pdf");
        assert_eq!(record.size, 2048);
        assert_eq!(record.file_type, "pdf");
        assert_eq!(record.mime.as_deref(), Some("application/pdf"));
        assert!(!record.is_remote());
    }

    #[test]
    fn test_image_record() {
        let blob = legacy_blob(
            &[
                ("img_key", "42"),
                ("img_id", "abc"),
                ("name", "x.png"),
                ("path", "https://img.lhl.one/x.png"),
                ("type", "png"),
            ],
            10,
        );

        let record = parse_legacy_record(&blob).expect("record");
        assert_eq!(record.remote_id(), Some("42"));
        assert_eq!(
            record.remote.as_ref().map(|r| r.content_hash.as_str()),
            Some("abc")
        );
        assert_eq!(record.mime, None);
    }

    #[test]
    fn test_mime_false_and_null() {
        let blob = r#"a:3:{s:4:"path";s:5:"/a/b1";s:4:"mime";b:0;s:4:"size";N;}"#;
        let record = parse_legacy_record(blob).expect("record");
        assert_eq!(record.mime, None);
        assert_eq!(record.size, 0);
    }

    #[rstest]
    #[case::empty("")]
    #[case::plain_text("not serialized")]
    #[case::bare_string(r#"s:3:"abc";"#)]
    #[case::string_longer_than_input(r#"a:1:{s:4:"name";s:99:"short";}"#)]
    #[case::no_path(r#"a:1:{s:4:"name";s:1:"a";}"#)]
    #[case::truncated_length(r#"a:1:{s:4:"path";s:"#)]
    #[case::negative_length(r#"a:1:{s:4:"path";s:-1:"";}"#)]
    #[case::huge_length(r#"a:1:{s:4:"path";s:18446744073709551615:"x";}"#)]
    #[case::count_exceeds_entries(r#"a:9:{s:4:"path";s:2:"/a";}"#)]
    #[case::missing_close(r#"a:1:{s:4:"path";s:2:"/a";"#)]
    #[case::unknown_tag(r#"a:1:{s:4:"path";O:8:"stdClass":0:{}}"#)]
    #[case::nested_value(r#"a:1:{s:4:"path";a:0:{}}"#)]
    fn test_malformed_input(#[case] blob: &str) {
        assert_eq!(parse_legacy_record(blob), None);
    }

    #[test]
    fn test_deep_nesting_is_refused() {
        let depth = 200_000;
        let mut blob = "a:1:{i:0;".repeat(depth);
        blob.push_str("N;");
        blob.push_str(&"}".repeat(depth));

        assert_eq!(parse_legacy_record(&blob), None);
    }
}
