//! Traits and types for audio extraction

use crate::progress::ProgressSink;
use crate::types::AudioFormat;
use async_trait::async_trait;
use std::path::PathBuf;

/// Everything an extractor needs to produce one audio file
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Source media URL
    pub url: String,
    /// Target audio format
    pub format: AudioFormat,
    /// Directory the output must be written into (already created)
    pub work_dir: PathBuf,
    /// File stem for the output; the file is expected at `<work_dir>/<base_name>.<ext>`
    pub base_name: String,
}

impl ExtractRequest {
    /// Where the output lands when the tool honours the requested extension
    pub fn expected_path(&self) -> PathBuf {
        self.work_dir
            .join(format!("{}.{}", self.base_name, self.format.extension()))
    }
}

/// Result of a successful extraction
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// The produced audio file, inside the request's work directory
    pub file_path: PathBuf,
    /// Media title, `"audio"` when the tool did not report one
    pub title: String,
}

/// Trait for turning a media URL into a local audio file
///
/// Implementations report progress through the supplied sink as they go and return
/// [`Error::Extraction`](crate::Error::Extraction) for any failure of the media tool
/// itself. Dropping the returned future must stop any work the extractor started.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Download and transcode `request.url` into `request.work_dir`
    async fn extract(
        &self,
        request: &ExtractRequest,
        sink: &dyn ProgressSink,
    ) -> crate::Result<Extracted>;

    /// Name of this implementation, for logging
    fn name(&self) -> &'static str;
}
