//! Client-side file materialization
//!
//! Downloads arrive as octet-streams; the suggested filename comes from
//! the content-disposition header when the server supplies one.

use std::path::{Path, PathBuf};

use crate::types::{LightstreamsError, Result};

/// Pull a filename out of a content-disposition header value
///
/// Looks for a `filename=` assignment, optionally quoted; quotes are
/// stripped. Returns `None` when the header is absent or carries no
/// filename, in which case the download still completes under a
/// caller-derived name.
pub fn extract_filename(disposition: Option<&str>) -> Option<String> {
    for part in disposition?.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("filename=") {
            let name = value.trim().trim_matches(|c| c == '"' || c == '\'');
            if !name.is_empty() {
                return Some(name.to_string());
            }
        }
    }
    None
}

/// Write downloaded bytes to disk, returning the final path
///
/// The filename comes from a remote header, so only its final path
/// component is honored; a traversal attempt can never escape `dir`.
pub async fn materialize(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .filter(|n| !n.is_empty() && *n != "..")
        .ok_or_else(|| {
            LightstreamsError::BadInput(format!("Unusable download filename: {}", filename))
        })?;

    let path = dir.join(name);
    tokio::fs::write(&path, bytes).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoted_filename() {
        assert_eq!(
            extract_filename(Some(r#"attachment; filename="report.pdf""#)),
            Some("report.pdf".to_string())
        );
    }

    #[test]
    fn test_bare_filename() {
        assert_eq!(
            extract_filename(Some("attachment; filename=report.pdf")),
            Some("report.pdf".to_string())
        );
    }

    #[test]
    fn test_single_quoted_filename() {
        assert_eq!(
            extract_filename(Some("attachment; filename='report.pdf'")),
            Some("report.pdf".to_string())
        );
    }

    #[test]
    fn test_absent_header() {
        assert_eq!(extract_filename(None), None);
    }

    #[test]
    fn test_header_without_filename() {
        assert_eq!(extract_filename(Some("attachment")), None);
        assert_eq!(extract_filename(Some(r#"attachment; filename="""#)), None);
    }

    #[tokio::test]
    async fn test_materialize_writes_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = materialize(dir.path(), "report.pdf", b"content")
            .await
            .unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"content");
    }

    #[tokio::test]
    async fn test_materialize_cannot_escape_download_dir() {
        let dir = tempfile::tempdir().unwrap();

        let path = materialize(dir.path(), "../../escape.txt", b"content")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("escape.txt"));

        let path = materialize(dir.path(), r"..\..\escape.txt", b"content")
            .await
            .unwrap();
        assert_eq!(path, dir.path().join("escape.txt"));

        assert!(materialize(dir.path(), "..", b"content").await.is_err());
        assert!(materialize(dir.path(), "dir/", b"content").await.is_err());
    }
}
