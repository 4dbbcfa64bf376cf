//! Extractor used when no yt-dlp binary could be found

use super::traits::{ExtractRequest, Extracted, Extractor};
use crate::progress::ProgressSink;
use async_trait::async_trait;

/// Extractor that fails every request
///
/// Lets the service start and answer status requests on hosts without yt-dlp; every
/// task ends in `error` with a message explaining what is missing.
#[derive(Debug, Clone, Default)]
pub struct UnavailableExtractor {
    reason: String,
}

impl UnavailableExtractor {
    /// Create an extractor that reports `reason` on every call
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Extractor for UnavailableExtractor {
    async fn extract(
        &self,
        _request: &ExtractRequest,
        _sink: &dyn ProgressSink,
    ) -> crate::Result<Extracted> {
        Err(crate::Error::Extraction(format!(
            "yt-dlp is not available: {}. Set extractor.ytdlp_path in the config \
             or make sure yt-dlp is in PATH.",
            self.reason
        )))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }
}
