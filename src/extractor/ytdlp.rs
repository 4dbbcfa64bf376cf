//! Extractor backed by the external yt-dlp binary

use super::output::locate_output;
use super::parser::{OutputLine, PROGRESS_MARKER, TITLE_MARKER, parse_line};
use super::traits::{ExtractRequest, Extracted, Extractor};
use crate::config::ExtractorConfig;
use crate::error::Error;
use crate::progress::ProgressSink;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

/// Title used when yt-dlp never printed one
pub(crate) const DEFAULT_TITLE: &str = "audio";

/// Number of stderr lines kept for error messages
const STDERR_TAIL_LINES: usize = 20;

/// yt-dlp based extractor
///
/// Runs yt-dlp as a child process that transcodes to the requested format through
/// ffmpeg. The child is killed if the extraction future is dropped, which is how the
/// optional extraction timeout stops a stuck download.
///
/// # Examples
///
/// ```no_run
/// use listentube::config::ExtractorConfig;
/// use listentube::extractor::YtDlpExtractor;
///
/// let extractor = YtDlpExtractor::from_path(ExtractorConfig::default())
///     .expect("yt-dlp not found in PATH");
/// println!("using {}", extractor.binary_path().display());
/// ```
#[derive(Debug, Clone)]
pub struct YtDlpExtractor {
    binary_path: PathBuf,
    options: ExtractorConfig,
}

impl YtDlpExtractor {
    /// Create an extractor with an explicit binary path
    pub fn new(binary_path: PathBuf, options: ExtractorConfig) -> Self {
        Self {
            binary_path,
            options,
        }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path(options: ExtractorConfig) -> Option<Self> {
        which::which("yt-dlp")
            .ok()
            .map(|path| Self::new(path, options))
    }

    /// Binary this extractor runs
    pub fn binary_path(&self) -> &std::path::Path {
        &self.binary_path
    }

    /// Command line for one request, without the binary itself
    pub(crate) fn build_args(&self, request: &ExtractRequest) -> Vec<OsString> {
        let opts = &self.options;
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |arg: &str| args.push(arg.into());

        push("-f");
        push(&opts.format_selector);
        push("-x");
        push("--audio-format");
        push(request.format.extension());
        push("--audio-quality");
        push(&opts.audio_quality);
        push("--no-playlist");

        push("--newline");
        push("--progress");
        push("--progress-template");
        push(&format!("download:{PROGRESS_MARKER}%(progress)j"));
        push("--print");
        push(&format!("after_move:{TITLE_MARKER}%(title)s"));

        let retries = opts.retries.to_string();
        for flag in [
            "--retries",
            "--fragment-retries",
            "--extractor-retries",
            "--file-access-retries",
        ] {
            push(flag);
            push(&retries);
        }

        if let Some(min) = opts.sleep_interval {
            push("--sleep-interval");
            push(&min.to_string());
        }
        if let Some(max) = opts.max_sleep_interval {
            push("--max-sleep-interval");
            push(&max.to_string());
        }
        if let Some(agent) = &opts.user_agent {
            push("--user-agent");
            push(agent);
        }
        for header in &opts.headers {
            push("--add-header");
            push(header);
        }
        if opts.no_check_certificate {
            push("--no-check-certificate");
        }
        for extractor_args in &opts.extractor_args {
            push("--extractor-args");
            push(extractor_args);
        }

        if let Some(cookies) = &opts.cookies_file
            && cookies.is_file()
        {
            args.push("--cookies".into());
            args.push(cookies.as_os_str().to_owned());
        }

        let template = request
            .work_dir
            .join(format!("{}.%(ext)s", request.base_name));
        args.push("-o".into());
        args.push(template.into_os_string());

        args.push("--".into());
        args.push(request.url.as_str().into());
        args
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    async fn extract(
        &self,
        request: &ExtractRequest,
        sink: &dyn ProgressSink,
    ) -> crate::Result<Extracted> {
        let mut child = Command::new(&self.binary_path)
            .args(self.build_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::ExternalTool(format!("failed to execute yt-dlp: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::ExternalTool("yt-dlp stdout was not captured".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::ExternalTool("yt-dlp stderr was not captured".into()))?;

        let mut stdout_lines = BufReader::new(stdout).lines();
        let mut stderr_lines = BufReader::new(stderr).lines();
        let mut stdout_open = true;
        let mut stderr_open = true;
        let mut title: Option<String> = None;
        let mut stderr_tail: VecDeque<String> = VecDeque::with_capacity(STDERR_TAIL_LINES);

        while stdout_open || stderr_open {
            tokio::select! {
                line = stdout_lines.next_line(), if stdout_open => match line {
                    Ok(Some(line)) => {
                        handle_line(&line, sink, &mut title);
                    }
                    _ => stdout_open = false,
                },
                line = stderr_lines.next_line(), if stderr_open => match line {
                    Ok(Some(line)) => {
                        if !handle_line(&line, sink, &mut title) && !line.trim().is_empty() {
                            if stderr_tail.len() == STDERR_TAIL_LINES {
                                stderr_tail.pop_front();
                            }
                            stderr_tail.push_back(line);
                        }
                    }
                    _ => stderr_open = false,
                },
            }
        }

        let status = child
            .wait()
            .await
            .map_err(|e| Error::ExternalTool(format!("failed to wait for yt-dlp: {e}")))?;

        if !status.success() {
            return Err(Error::Extraction(failure_message(&stderr_tail, status)));
        }

        let file_path = locate_output(&request.work_dir, &request.base_name, request.format)
            .await?
            .ok_or_else(|| Error::Extraction("audio file not found after processing".into()))?;

        Ok(Extracted {
            file_path,
            title: title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        })
    }

    fn name(&self) -> &'static str {
        "yt-dlp"
    }
}

/// Forward a recognized line; returns whether the line was one of ours
fn handle_line(line: &str, sink: &dyn ProgressSink, title: &mut Option<String>) -> bool {
    match parse_line(line) {
        Some(OutputLine::Progress(event)) => {
            sink.report(event);
            true
        }
        Some(OutputLine::Title(t)) => {
            *title = Some(t);
            true
        }
        None => false,
    }
}

/// Summarize a failed run, preferring yt-dlp's own `ERROR:` lines
fn failure_message(stderr_tail: &VecDeque<String>, status: std::process::ExitStatus) -> String {
    let errors: Vec<&str> = stderr_tail
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.starts_with("ERROR:"))
        .collect();

    if !errors.is_empty() {
        return errors.join("\n");
    }

    match stderr_tail.back() {
        Some(last) => last.trim().to_string(),
        None => format!("yt-dlp exited with {status}"),
    }
}
