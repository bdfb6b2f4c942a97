//! Video to animated GIF with ffmpeg.
//!
//! The clip's presentation timestamps are divided by the speed factor
//! (`setpts=PTS/<speed>`), so a factor of 10 plays ten times faster. The GIF
//! loops forever. ffmpeg writes into a temporary file next to the output,
//! which replaces the output only when ffmpeg succeeded.

use crate::core::config::GifConfig;
use crate::core::io::{temp_output_file, validate_input_file};
use crate::subprocess::{RunError, Tool, run_with_timeout, stderr_tail};
use crate::{FolioError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const FFMPEG_PATH_ENV: &str = "FOLIO_FFMPEG_PATH";

const FFMPEG: Tool = Tool {
    name: "ffmpeg",
    env_var: FFMPEG_PATH_ENV,
    binaries: &["ffmpeg", "ffmpeg.exe"],
    install_hint: "Install: macOS: 'brew install ffmpeg', Linux: 'apt install ffmpeg', \
Windows: 'winget install ffmpeg'.",
};

/// Find the ffmpeg executable.
pub fn locate_ffmpeg(explicit: Option<&Path>) -> Result<PathBuf> {
    FFMPEG.locate(explicit)
}

/// The `-vf` filter chain for a configuration.
pub fn filter_chain(config: &GifConfig) -> String {
    let mut filters = vec![format!("setpts=PTS/{}", config.speed)];
    if let Some(fps) = config.fps {
        filters.push(format!("fps={}", fps));
    }
    if let Some(width) = config.width {
        filters.push(format!("scale={}:-1", width));
    }
    filters.join(",")
}

/// ffmpeg arguments converting `input` into a GIF at `output`.
pub fn build_ffmpeg_args(config: &GifConfig, input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = ["-hide_banner", "-y", "-i"].into_iter().map(OsString::from).collect();
    args.push(input.as_os_str().to_owned());
    args.push(OsString::from("-vf"));
    args.push(OsString::from(filter_chain(config)));
    args.extend(["-loop", "0", "-f", "gif"].into_iter().map(OsString::from));
    args.push(output.as_os_str().to_owned());
    args
}

/// Convert a video into an animated GIF.
///
/// # Errors
///
/// - `FolioError::Validation` for a bad configuration
/// - `FolioError::Io` if the input is missing or the output directory is not writable
/// - `FolioError::MissingDependency` if ffmpeg is not found
/// - `FolioError::Processing` if ffmpeg fails or times out
pub async fn convert_to_gif(config: &GifConfig) -> Result<()> {
    config.validate()?;
    validate_input_file(&config.input)?;
    let ffmpeg = locate_ffmpeg(config.ffmpeg_path.as_deref())?;

    let temp = temp_output_file(&config.output, ".gif")?;
    let args = build_ffmpeg_args(config, &config.input, temp.path());

    tracing::debug!("Running {} {:?}", ffmpeg.display(), args);
    let output = run_with_timeout(&ffmpeg, &args, None, config.timeout_secs)
        .await
        .map_err(|e| match e {
            RunError::TimedOut(secs) => FolioError::processing(format!(
                "ffmpeg timed out after {} seconds converting {}",
                secs,
                config.input.display()
            )),
            other => FolioError::processing(format!("Failed to run ffmpeg: {}", other)),
        })?;

    if !output.status.success() {
        return Err(FolioError::processing(format!(
            "ffmpeg exited with status {} converting {}: {}",
            output.status.code().unwrap_or(-1),
            config.input.display(),
            stderr_tail(&output)
        )));
    }

    let size = temp.as_file().metadata()?.len();
    if size == 0 {
        return Err(FolioError::processing("ffmpeg produced an empty GIF"));
    }
    temp.persist(&config.output).map_err(|e| FolioError::Io(e.error))?;

    tracing::info!(
        "Wrote {} ({} bytes, speed x{})",
        config.output.display(),
        size,
        config.speed
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config() -> GifConfig {
        GifConfig {
            input: PathBuf::from("velocity.mpeg"),
            output: PathBuf::from("velocity.gif"),
            ..Default::default()
        }
    }

    #[test]
    fn test_filter_chain_defaults_to_speed_only() {
        assert_eq!(filter_chain(&config()), "setpts=PTS/10");
    }

    #[test]
    fn test_filter_chain_with_fps_and_width() {
        let config = GifConfig {
            speed: 2.5,
            fps: Some(12),
            width: Some(480),
            ..config()
        };
        assert_eq!(filter_chain(&config), "setpts=PTS/2.5,fps=12,scale=480:-1");
    }

    #[test]
    fn test_build_ffmpeg_args() {
        let args = build_ffmpeg_args(&config(), Path::new("in.mpeg"), Path::new("out.gif"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "-hide_banner",
                "-y",
                "-i",
                "in.mpeg",
                "-vf",
                "setpts=PTS/10",
                "-loop",
                "0",
                "-f",
                "gif",
                "out.gif"
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_input_is_io_error() {
        let dir = tempdir().unwrap();
        let config = GifConfig {
            input: dir.path().join("missing.mpeg"),
            output: dir.path().join("out.gif"),
            ..Default::default()
        };
        assert!(matches!(convert_to_gif(&config).await.unwrap_err(), FolioError::Io(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_ffmpeg_leaves_no_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("clip.mpeg");
        std::fs::write(&input, b"not a video").unwrap();

        let config = GifConfig {
            input,
            output: dir.path().join("clip.gif"),
            ffmpeg_path: Some(PathBuf::from("/bin/false")),
            ..Default::default()
        };
        let err = convert_to_gif(&config).await.unwrap_err();
        assert!(matches!(err, FolioError::Processing { .. }));
        assert!(!config.output.exists());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1);
    }
}
