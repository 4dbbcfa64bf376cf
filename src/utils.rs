//! Utility functions for building file responses

/// Disposition type of a file response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Let the browser play the file
    Inline,
    /// Ask the browser to save the file
    Attachment,
}

impl Disposition {
    fn as_str(&self) -> &'static str {
        match self {
            Disposition::Inline => "inline",
            Disposition::Attachment => "attachment",
        }
    }
}

/// Build a `Content-Disposition` header value for `file_name`
///
/// Emits an ASCII-only `filename` for old clients and an RFC 5987 `filename*` carrying
/// the exact UTF-8 name.
///
/// # Examples
///
/// ```
/// use listentube::utils::{Disposition, content_disposition};
///
/// assert_eq!(
///     content_disposition(Disposition::Attachment, "Café.mp3"),
///     "attachment; filename=\"Caf_.mp3\"; filename*=UTF-8''Caf%C3%A9.mp3"
/// );
/// ```
pub fn content_disposition(disposition: Disposition, file_name: &str) -> String {
    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition.as_str(),
        ascii_fallback(file_name),
        urlencoding::encode(file_name)
    )
}

/// Replace everything that cannot appear inside a quoted ASCII header parameter
///
/// Non-ASCII characters, control characters, quotes and backslashes become `_`.
/// An empty result becomes `audio`.
pub fn ascii_fallback(file_name: &str) -> String {
    let sanitized: String = file_name
        .chars()
        .map(|c| {
            if c.is_ascii() && !c.is_ascii_control() && c != '"' && c != '\\' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.trim().is_empty() {
        "audio".to_string()
    } else {
        sanitized
    }
}
