//! Filename sanitising and image classification.
//!
//! Upload names come straight from the client and are never trusted. The
//! sanitiser keeps only the final path segment and derives the extension from
//! it, so a name like `../../etc/passwd.png` can never steer a write outside
//! the upload directory.

/// Extensions that are routed to remote image storage.
pub const IMAGE_EXTENSIONS: [&str; 8] = ["gif", "jpg", "jpeg", "png", "bmp", "ico", "webp", "svg"];

/// Characters stripped from upload names before anything else.
const RESERVED_CHARS: [char; 3] = ['"', '<', '>'];

/// Sentinel inserted after every separator and removed from the basename.
const SENTINEL: char = 'a';

/// A sanitised upload name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeName {
    /// Final path segment of the upload name.
    pub file_name: String,
    /// Lower-cased extension, empty if the name has none.
    pub extension: String,
}

impl SafeName {
    /// Sanitise an untrusted upload name.
    ///
    /// Reserved characters are removed and backslashes become forward
    /// slashes. A sentinel character is then placed after every separator so
    /// that empty and dot-only segments still yield a well-formed basename,
    /// and stripped again from the final segment.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let cleaned: String = raw
            .chars()
            .filter(|c| !RESERVED_CHARS.contains(c))
            .map(|c| if c == '\\' { '/' } else { c })
            .collect();

        let guarded = if cleaned.contains('/') {
            cleaned.replace('/', &format!("/{SENTINEL}"))
        } else {
            format!("{SENTINEL}{cleaned}")
        };

        let basename = guarded.rsplit('/').next().unwrap_or_default();
        let extension = basename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        Self {
            file_name: basename[SENTINEL.len_utf8()..].to_string(),
            extension,
        }
    }
}

/// Sanitise an upload name and return its lower-cased extension.
#[must_use]
pub fn safe_extension(raw: &str) -> String {
    SafeName::parse(raw).extension
}

/// Whether the extension belongs to the image set (case-insensitive).
#[must_use]
pub fn is_image(ext: &str) -> bool {
    IMAGE_EXTENSIONS
        .iter()
        .any(|image| image.eq_ignore_ascii_case(ext))
}
