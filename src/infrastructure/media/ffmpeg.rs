use super::{MediaError, MediaToolkit};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::Path;
use tokio::process::Command;

/// Output parameters shared by every fragment and the final render.
#[derive(Debug, Clone)]
pub struct AudioFormat {
    pub bitrate: String,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self {
            bitrate: "128k".to_string(),
            sample_rate: 44_100,
            channels: 1,
        }
    }
}

/// [`MediaToolkit`] backed by the `ffmpeg` and `ffprobe` binaries.
pub struct FfmpegToolkit {
    ffmpeg_path: String,
    ffprobe_path: String,
    format: AudioFormat,
}

impl FfmpegToolkit {
    pub fn new(ffmpeg_path: String, ffprobe_path: String, format: AudioFormat) -> Self {
        Self {
            ffmpeg_path,
            ffprobe_path,
            format,
        }
    }

    fn channel_layout(&self) -> &'static str {
        if self.format.channels == 1 {
            "mono"
        } else {
            "stereo"
        }
    }

    /// Run a tool to completion and return its stdout.
    async fn run(&self, tool: &str, args: Vec<OsString>) -> Result<Vec<u8>, MediaError> {
        let start_time = std::time::Instant::now();
        let output = Command::new(tool)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| MediaError::Spawn {
                tool: tool.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::error!(
                tool = tool,
                status = %output.status,
                stderr = %stderr,
                "Media subprocess failed"
            );
            return Err(MediaError::Failed {
                tool: tool.to_string(),
                status: output.status.to_string(),
                stderr,
            });
        }

        tracing::debug!(
            tool = tool,
            latency_ms = start_time.elapsed().as_millis(),
            "Media subprocess finished"
        );

        Ok(output.stdout)
    }
}

fn args<I, S>(items: I) -> Vec<OsString>
where
    I: IntoIterator<Item = S>,
    S: Into<OsString>,
{
    items.into_iter().map(Into::into).collect()
}

/// Parse ffprobe's bare `duration` output (seconds) into milliseconds.
pub fn parse_probe_output(stdout: &str) -> Option<u64> {
    let seconds = stdout.trim().lines().next()?.trim().parse::<f64>().ok()?;
    if seconds.is_finite() && seconds >= 0.0 {
        Some((seconds * 1000.0).round() as u64)
    } else {
        None
    }
}

#[async_trait]
impl MediaToolkit for FfmpegToolkit {
    async fn probe_duration_ms(&self, path: &Path) -> Result<u64, MediaError> {
        let stdout = self
            .run(
                &self.ffprobe_path,
                vec![
                    "-v".into(),
                    "error".into(),
                    "-show_entries".into(),
                    "format=duration".into(),
                    "-of".into(),
                    "default=noprint_wrappers=1:nokey=1".into(),
                    path.as_os_str().to_os_string(),
                ],
            )
            .await?;

        let text = String::from_utf8_lossy(&stdout);
        parse_probe_output(&text).ok_or_else(|| MediaError::Probe {
            path: path.to_path_buf(),
            message: format!("unexpected ffprobe output {:?}", text.trim()),
        })
    }

    async fn normalize(&self, input: &Path, output: &Path) -> Result<(), MediaError> {
        let mut command = args(["-hide_banner", "-loglevel", "error", "-y", "-i"]);
        command.push(input.as_os_str().to_os_string());
        command.extend(args([
            "-ar".to_string(),
            self.format.sample_rate.to_string(),
            "-ac".to_string(),
            self.format.channels.to_string(),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
        ]));
        command.push(output.as_os_str().to_os_string());

        self.run(&self.ffmpeg_path, command).await.map(|_| ())
    }

    async fn render_silence(&self, duration_ms: u64, output: &Path) -> Result<(), MediaError> {
        let mut command = args([
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
            "-y".to_string(),
            "-f".to_string(),
            "lavfi".to_string(),
            "-i".to_string(),
            format!(
                "anullsrc=r={}:cl={}",
                self.format.sample_rate,
                self.channel_layout()
            ),
            "-t".to_string(),
            format!("{:.3}", duration_ms as f64 / 1000.0),
            "-c:a".to_string(),
            "pcm_s16le".to_string(),
        ]);
        command.push(output.as_os_str().to_os_string());

        self.run(&self.ffmpeg_path, command).await.map(|_| ())
    }

    async fn concat(&self, list_file: &Path, output: &Path) -> Result<(), MediaError> {
        let mut command = args([
            "-hide_banner", "-loglevel", "error", "-y", "-f", "concat", "-safe", "0", "-i",
        ]);
        command.push(list_file.as_os_str().to_os_string());
        command.extend(args([
            "-c:a".to_string(),
            "libmp3lame".to_string(),
            "-b:a".to_string(),
            self.format.bitrate.clone(),
            "-ar".to_string(),
            self.format.sample_rate.to_string(),
            "-ac".to_string(),
            self.format.channels.to_string(),
        ]));
        command.push(output.as_os_str().to_os_string());

        self.run(&self.ffmpeg_path, command).await.map(|_| ())
    }
}
