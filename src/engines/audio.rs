//! Audio transcoding through an external `ffmpeg` executable.

use std::{
    path::{Path, PathBuf},
    process::Stdio,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, error, info};

use crate::{
    error::EngineError, formats::Category, formats::FormatType, traits::Engine,
    types::TransformRequest,
};

/// Longest stderr excerpt kept in errors.
const STDERR_LIMIT: usize = 2000;

/// Transcodes between MP3, WAV and Ogg by running `ffmpeg`.
#[derive(Debug, Clone)]
pub struct AudioEngine {
    program: PathBuf,
}

impl AudioEngine {
    /// Creates an engine that runs `program` (a path or a name on `PATH`).
    pub fn new(program: PathBuf) -> Self {
        AudioEngine { program }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }

    fn spawn_error(&self, err: std::io::Error) -> EngineError {
        if err.kind() == std::io::ErrorKind::NotFound {
            EngineError::Unavailable(format!("`{}` was not found", self.program_name()))
        } else {
            EngineError::Io(err)
        }
    }
}

/// Arguments transcoding `input` into `output`; the container follows the
/// output extension.
pub fn transcode_args(input: &Path, output: &Path) -> Vec<String> {
    vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
        "-y".to_string(),
        "-i".to_string(),
        input.to_string_lossy().into_owned(),
        output.to_string_lossy().into_owned(),
    ]
}

fn is_audio(format: FormatType) -> bool {
    matches!(format, FormatType::Mp3 | FormatType::Wav | FormatType::Ogg)
}

#[async_trait]
impl Engine for AudioEngine {
    fn category(&self) -> Category {
        Category::Audio
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn initialize(&self) -> Result<(), EngineError> {
        let output = self
            .command()
            .arg("-version")
            .output()
            .await
            .map_err(|err| self.spawn_error(err))?;
        if !output.status.success() {
            return Err(EngineError::Unavailable(format!(
                "`{} -version` exited with {}",
                self.program_name(),
                output.status
            )));
        }
        let version = String::from_utf8_lossy(&output.stdout);
        info!(
            program = %self.program.display(),
            version = version.lines().next().unwrap_or_default(),
            "found ffmpeg"
        );
        Ok(())
    }

    async fn transform(&self, request: TransformRequest) -> Result<Vec<u8>, EngineError> {
        if !is_audio(request.input) || !is_audio(request.output) {
            return Err(EngineError::Unsupported(format!(
                "ffmpeg cannot convert `{}` to `{}`",
                request.input, request.output
            )));
        }

        let workdir = tempfile::tempdir()?;
        let input_path = workdir.path().join(format!("input.{}", request.input.extension()));
        let output_path = workdir.path().join(format!("output.{}", request.output.extension()));
        tokio::fs::write(&input_path, &request.bytes).await?;

        let args = transcode_args(&input_path, &output_path);
        debug!(program = %self.program.display(), ?args, "running ffmpeg");

        let output = self
            .command()
            .args(&args)
            .output()
            .await
            .map_err(|err| self.spawn_error(err))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let code = output.status.code().unwrap_or(-1);
            error!(code, stderr = %stderr.trim(), "ffmpeg transcode failed");
            return Err(EngineError::Process {
                program: self.program_name(),
                code,
                stderr: stderr.trim().chars().take(STDERR_LIMIT).collect(),
            });
        }

        Ok(tokio::fs::read(&output_path).await?)
    }
}
