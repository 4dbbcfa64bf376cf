//! Locating the file an extraction produced

use crate::types::AudioFormat;
use std::path::{Path, PathBuf};

/// Find the audio file yt-dlp left in `dir`
///
/// The expected `<base_name>.<ext>` wins. When the tool picked another extension the
/// directory is scanned for any regular file named `<base_name>.*`, skipping partial
/// downloads. Returns `Ok(None)` when nothing matches.
pub(crate) async fn locate_output(
    dir: &Path,
    base_name: &str,
    format: AudioFormat,
) -> std::io::Result<Option<PathBuf>> {
    let expected = dir.join(format!("{base_name}.{}", format.extension()));
    if tokio::fs::metadata(&expected)
        .await
        .is_ok_and(|meta| meta.is_file())
    {
        return Ok(Some(expected));
    }

    let prefix = format!("{base_name}.");
    let mut candidates = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with(&prefix) || name.ends_with(".part") || name.ends_with(".ytdl") {
            continue;
        }
        if entry.file_type().await.is_ok_and(|t| t.is_file()) {
            candidates.push(path);
        }
    }

    candidates.sort();
    Ok(candidates.into_iter().next())
}
