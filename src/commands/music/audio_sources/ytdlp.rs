//! Runs `yt-dlp` as a subprocess and parses its single-document JSON output.

use serenity::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::{ExtractError, ExtractRequest, ExtractedInfo, ExtractionBackend};

/// Prefer Opus-in-WebM, which the transcoder can pass through cheaply.
const AUDIO_FORMAT: &str = "bestaudio[ext=webm][acodec=opus]/bestaudio/best";

pub struct YtDlpBackend {
    program: String,
}

impl YtDlpBackend {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Command-line arguments for one request.
    pub fn args(request: &ExtractRequest) -> Vec<String> {
        let mut args: Vec<String> = [
            "-J",
            "--no-warnings",
            "--no-playlist",
            "--force-ipv4",
            "-f",
            AUDIO_FORMAT,
        ]
        .into_iter()
        .map(String::from)
        .collect();

        if request.flat {
            args.push("--flat-playlist".to_string());
        }
        if let Some(mode) = request.default_search {
            args.push("--default-search".to_string());
            args.push(mode.to_string());
        }
        if let Some(profile) = &request.profile {
            args.push("--extractor-args".to_string());
            args.push(format!("youtube:player_client={profile}"));
        }

        args.push("--".to_string());
        args.push(request.target.clone());
        args
    }
}

#[async_trait]
impl ExtractionBackend for YtDlpBackend {
    async fn extract(&self, request: &ExtractRequest) -> Result<ExtractedInfo, ExtractError> {
        debug!("Running {} for '{}'", self.program, request.target);

        let mut command = Command::new(&self.program);
        command
            .args(Self::args(request))
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Dropping the output future on timeout kills the child.
        let output = tokio::time::timeout(request.timeout, command.output())
            .await
            .map_err(|_| ExtractError::Timeout)?
            .map_err(|e| ExtractError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("no error output")
                .to_string();
            return Err(ExtractError::Failed(reason));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| ExtractError::Malformed(e.to_string()))
    }
}
