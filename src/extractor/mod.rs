//! Audio extraction
//!
//! The lifecycle code treats extraction as a black box behind the [`Extractor`] trait:
//! given a URL, a target format and a working directory it produces one audio file and
//! streams [`ProgressEvent`](crate::progress::ProgressEvent)s into a sink on the way.
//!
//! - [`YtDlpExtractor`]: runs the external `yt-dlp` binary (with ffmpeg for transcoding)
//! - [`UnavailableExtractor`]: fails every request when no binary is available
//!
//! [`select_extractor`] picks one from configuration.

mod output;
mod parser;
mod traits;
mod unavailable;
mod ytdlp;

pub use parser::{OutputLine, parse_line, strip_ansi};
pub use traits::{ExtractRequest, Extracted, Extractor};
pub use unavailable::UnavailableExtractor;
pub use ytdlp::YtDlpExtractor;

pub(crate) use ytdlp::DEFAULT_TITLE;

use crate::config::ExtractorConfig;
use std::sync::Arc;

/// Choose the extractor implementation for `config`
///
/// An explicit `ytdlp_path` wins. Otherwise PATH is searched when `search_path` is set.
/// Without a binary the service still starts, with an extractor that fails every task.
pub fn select_extractor(config: &ExtractorConfig) -> Arc<dyn Extractor> {
    if let Some(path) = &config.ytdlp_path {
        tracing::info!(path = %path.display(), "using configured yt-dlp binary");
        return Arc::new(YtDlpExtractor::new(path.clone(), config.clone()));
    }

    if config.search_path {
        if let Some(extractor) = YtDlpExtractor::from_path(config.clone()) {
            tracing::info!(
                path = %extractor.binary_path().display(),
                "found yt-dlp in PATH"
            );
            return Arc::new(extractor);
        }
        tracing::warn!("yt-dlp not found in PATH, extraction requests will fail");
        return Arc::new(UnavailableExtractor::new("not found in PATH"));
    }

    tracing::warn!("no yt-dlp binary configured and PATH search disabled");
    Arc::new(UnavailableExtractor::new(
        "no binary configured and PATH search disabled",
    ))
}
