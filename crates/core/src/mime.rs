//! MIME type guessing from filenames.

/// Guess a MIME type from a filename's extension, falling back to `default`.
pub fn guess(filename: &str, default: &str) -> String {
    mime_guess::from_path(filename)
        .first()
        .map(|m| m.essence_str().to_string())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(guess("photo.png", "application/octet-stream"), "image/png");
        assert_eq!(guess("photo.webp", "application/octet-stream"), "image/webp");
        assert_eq!(guess("doc.pdf", "application/octet-stream"), "application/pdf");
    }

    #[test]
    fn test_unknown_falls_back() {
        assert_eq!(guess("data.zzz9", "application/octet-stream"), "application/octet-stream");
        assert_eq!(guess("no-extension", "text/plain"), "text/plain");
    }
}
