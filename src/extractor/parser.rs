//! Parsing of yt-dlp output lines into progress events
//!
//! yt-dlp is asked to print progress as a JSON dictionary after a `[progress]` marker
//! and the final title after a `[title]` marker. The dictionary is loosely typed (fields
//! go missing, numbers turn into null, strings carry terminal colour codes), so every
//! field is optional and anything unparseable is treated as "not reported".

use crate::progress::{ProgressEvent, ProgressUpdate, SPEED_UNKNOWN};
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::sync::LazyLock;

/// Marker preceding a JSON progress dictionary
pub(crate) const PROGRESS_MARKER: &str = "[progress]";

/// Marker preceding the media title
pub(crate) const TITLE_MARKER: &str = "[title]";

static ANSI_ESCAPE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("ANSI escape pattern is valid")
});

/// One meaningful line of yt-dlp output
#[derive(Debug, Clone, PartialEq)]
pub enum OutputLine {
    /// A progress event
    Progress(ProgressEvent),
    /// The title of the extracted media
    Title(String),
}

/// Progress dictionary as yt-dlp prints it
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawProgress {
    #[serde(default)]
    status: Option<String>,
    #[serde(default, rename = "_percent_str")]
    percent_str: Option<String>,
    #[serde(default)]
    speed_str: Option<String>,
    #[serde(default, rename = "_speed_str")]
    underscore_speed_str: Option<String>,
    #[serde(default)]
    eta: Option<serde_json::Value>,
    #[serde(default, alias = "_eta_str")]
    eta_str: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    downloaded_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    total_bytes: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    total_bytes_estimate: Option<f64>,
}

/// Accept numbers, numeric strings and null; anything else becomes `None`
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

fn value_as_f64(value: &serde_json::Value) -> Option<f64> {
    let number = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => strip_ansi(s).parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

/// Remove terminal colour sequences and surrounding whitespace
pub fn strip_ansi(text: &str) -> String {
    ANSI_ESCAPE.replace_all(text, "").trim().to_string()
}

/// Classify one line of yt-dlp output
///
/// Returns `None` for ordinary log lines and for progress dictionaries that cannot
/// be decoded at all.
pub fn parse_line(line: &str) -> Option<OutputLine> {
    let line = line.trim();

    if let Some(title) = line.strip_prefix(TITLE_MARKER) {
        let title = strip_ansi(title);
        return (!title.is_empty()).then_some(OutputLine::Title(title));
    }

    let json = line.strip_prefix(PROGRESS_MARKER)?;
    match serde_json::from_str::<RawProgress>(json) {
        Ok(raw) => normalize(raw).map(OutputLine::Progress),
        Err(e) => {
            tracing::trace!(error = %e, "ignoring undecodable progress line");
            None
        }
    }
}

/// Convert a raw dictionary into a normalized event
///
/// Percentage precedence: the explicit percent string first, the byte ratio second.
pub(crate) fn normalize(raw: RawProgress) -> Option<ProgressEvent> {
    match raw.status.as_deref() {
        Some("downloading") => {}
        Some("finished") => return Some(ProgressEvent::Finished),
        _ => return None,
    }

    let downloaded_bytes = raw.downloaded_bytes.and_then(to_u64);
    let total = raw.total_bytes.or(raw.total_bytes_estimate);

    let progress = raw
        .percent_str
        .as_deref()
        .and_then(parse_percent)
        .or_else(|| match (raw.downloaded_bytes, total) {
            (Some(done), Some(total)) if total > 0.0 => Some(done / total * 100.0),
            _ => None,
        });

    let speed = raw
        .speed_str
        .or(raw.underscore_speed_str)
        .map(|s| strip_ansi(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| SPEED_UNKNOWN.to_string());

    let eta = raw
        .eta
        .as_ref()
        .and_then(value_as_f64)
        .and_then(to_u64)
        .or_else(|| raw.eta_str.as_deref().and_then(parse_eta));

    Some(ProgressEvent::Downloading(ProgressUpdate {
        progress,
        speed: Some(speed),
        eta,
        downloaded_bytes,
        total_bytes: total.and_then(to_u64),
    }))
}

fn parse_percent(text: &str) -> Option<f64> {
    strip_ansi(text)
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
}

fn parse_eta(text: &str) -> Option<u64> {
    strip_ansi(text).parse().ok()
}

fn to_u64(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.round() as u64)
}
