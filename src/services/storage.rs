use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

use crate::config::app_config::StorageConfig;

/// Writes uploaded video bytes under `<upload_path>/videos/` and returns the
/// relative path stored on the movie row (and served under `/uploads/`).
pub async fn save_video(
    storage: &StorageConfig,
    original_name: &str,
    data: &[u8],
) -> Result<String> {
    let dir = Path::new(&storage.upload_path).join("videos");
    fs::create_dir_all(&dir)
        .await
        .context("Failed to create video directory")?;

    // Uuid prefix keeps concurrent uploads of the same file from colliding
    let stored_name = format!("{}_{}", Uuid::new_v4(), sanitize_filename(original_name));
    let dest = dir.join(&stored_name);
    fs::write(&dest, data)
        .await
        .with_context(|| format!("Failed to write {}", dest.display()))?;

    Ok(format!("videos/{stored_name}"))
}

/// Strips any path components and anything outside `[A-Za-z0-9._-]` from a
/// client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_plain_names() {
        assert_eq!(sanitize_filename("clip-01.mp4"), "clip-01.mp4");
    }

    #[test]
    fn sanitize_replaces_odd_characters() {
        assert_eq!(sanitize_filename("my movie (final).mp4"), "my_movie__final_.mp4");
    }

    #[test]
    fn sanitize_strips_path_components() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("/tmp/clip.mp4"), "clip.mp4");
    }

    #[test]
    fn sanitize_never_returns_empty() {
        assert_eq!(sanitize_filename(""), "upload");
    }

    #[tokio::test]
    async fn save_video_writes_bytes_under_videos_dir() {
        let dir = std::env::temp_dir().join(format!("movie-api-test-{}", Uuid::new_v4()));
        let storage = StorageConfig {
            upload_path: dir.to_string_lossy().into_owned(),
            max_file_size: 1024,
        };

        let relative = save_video(&storage, "clip one.mp4", b"abc").await.unwrap();
        assert!(relative.starts_with("videos/"));
        assert!(relative.ends_with("_clip_one.mp4"));

        let on_disk = dir.join(&relative);
        assert_eq!(fs::read(&on_disk).await.unwrap(), b"abc");

        fs::remove_dir_all(&dir).await.unwrap();
    }
}
