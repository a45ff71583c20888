use std::path::Path;
use std::process::Output;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, DubError};
use super::filters;

/// Abstract media processing command representation
#[derive(Debug, Clone)]
pub struct MediaCommand {
    pub binary_path: String,
    pub args: Vec<String>,
    pub description: String,
    failure: fn(String) -> DubError,
}

impl MediaCommand {
    /// Create a new media processing command; failures surface as transcode errors
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, description: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            args: Vec::new(),
            description: description.into(),
            failure: DubError::Transcode,
        }
    }

    /// Choose the error variant reported when the command fails
    pub fn on_failure(mut self, failure: fn(String) -> DubError) -> Self {
        self.failure = failure;
        self
    }

    /// Add an argument
    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Add multiple arguments
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(|s| s.into()));
        self
    }

    /// Add input file
    pub fn input<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg("-i").arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Add output file
    pub fn output<P: AsRef<Path>>(self, path: P) -> Self {
        self.arg(path.as_ref().to_string_lossy().to_string())
    }

    /// Force overwrite output
    pub fn overwrite(self) -> Self {
        self.arg("-y")
    }

    /// Set video codec
    pub fn video_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:v").arg(codec)
    }

    /// Set audio codec
    pub fn audio_codec<S: Into<String>>(self, codec: S) -> Self {
        self.arg("-c:a").arg(codec)
    }

    /// Disable video
    pub fn no_video(self) -> Self {
        self.arg("-vn")
    }

    /// Set audio sample rate
    pub fn audio_sample_rate(self, rate: u32) -> Self {
        self.arg("-ar").arg(rate.to_string())
    }

    /// Set audio channels
    pub fn audio_channels(self, channels: u32) -> Self {
        self.arg("-ac").arg(channels.to_string())
    }

    /// Add audio filter
    pub fn audio_filter<S: Into<String>>(self, filter: S) -> Self {
        self.arg("-af").arg(filter)
    }

    /// Add a complex filter graph
    pub fn filter_complex<S: Into<String>>(self, graph: S) -> Self {
        self.arg("-filter_complex").arg(graph)
    }

    /// Map an input stream or filter label into the output
    pub fn map<S: Into<String>>(self, spec: S) -> Self {
        self.arg("-map").arg(spec)
    }

    /// Limit output duration (seconds)
    pub fn duration(self, seconds: f64) -> Self {
        self.arg("-t").arg(filters::format_seconds(seconds))
    }

    /// Spawn the command and collect its output without judging the exit status
    pub async fn run_raw(&self) -> std::io::Result<Output> {
        debug!("Executing media processing command: {} {:?}", self.binary_path, self.args);
        debug!("Description: {}", self.description);

        Command::new(&self.binary_path)
            .args(&self.args)
            .kill_on_drop(true)
            .output()
            .await
    }

    /// Execute the command and return its stdout
    pub async fn run(&self) -> Result<Vec<u8>> {
        let output = self.run_raw().await.map_err(|e| {
            (self.failure)(format!("Failed to execute {}: {}", self.binary_path, e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err((self.failure)(format!(
                "{} failed: {}",
                self.description,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }

    /// Execute the command
    pub async fn execute(&self) -> Result<()> {
        self.run().await.map(|_| ())
    }
}

/// Builder for the media operations the dubbing workflow needs
pub struct MediaCommandBuilder {
    binary_path: String,
    probe_path: String,
}

impl MediaCommandBuilder {
    /// Create a new command builder
    pub fn new<S1: Into<String>, S2: Into<String>>(binary_path: S1, probe_path: S2) -> Self {
        Self {
            binary_path: binary_path.into(),
            probe_path: probe_path.into(),
        }
    }

    /// Build ffprobe command printing format and streams as JSON
    pub fn probe<P: AsRef<Path>>(&self, path: P) -> MediaCommand {
        MediaCommand::new(&self.probe_path, "Media probe")
            .on_failure(DubError::Asset)
            .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
            .output(path)
    }

    /// Build audio extraction command producing mono PCM for transcription
    pub fn extract_audio<P: AsRef<Path>>(
        &self,
        video_path: P,
        audio_path: P,
        sample_rate: u32,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, "Audio extraction")
            .on_failure(DubError::Asset)
            .overwrite()
            .input(video_path)
            .no_video()
            .audio_codec("pcm_s16le")
            .audio_sample_rate(sample_rate)
            .audio_channels(1)
            .output(audio_path)
    }

    /// Build tempo change command (pitch preserved)
    pub fn change_tempo<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: P,
        factor: f64,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, format!("Tempo change by {:.3}x", factor))
            .overwrite()
            .input(input_path)
            .no_video()
            .audio_filter(filters::atempo_filter(factor))
            .output(output_path)
    }

    /// Build clip-to-length command for audio
    pub fn trim_audio<P: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: P,
        duration: f64,
    ) -> MediaCommand {
        MediaCommand::new(&self.binary_path, format!("Audio trim to {:.3}s", duration))
            .overwrite()
            .input(input_path)
            .no_video()
            .duration(duration)
            .output(output_path)
    }

    /// Build the final mux: source video stream plus the mixed audio
    pub fn mux_dub(
        &self,
        video_path: &Path,
        dub_path: &Path,
        output_path: &Path,
        duration: f64,
        original_volume: Option<f64>,
        codecs: &MuxCodecs,
    ) -> MediaCommand {
        let mut cmd = MediaCommand::new(&self.binary_path, "Dub mux")
            .on_failure(DubError::Asset)
            .overwrite()
            .input(video_path)
            .input(dub_path)
            .filter_complex(filters::mix_filter_graph(duration, original_volume))
            .map("0:v:0")
            .map(format!("[{}]", filters::MIX_OUTPUT_LABEL))
            .video_codec(codecs.video_codec.clone())
            .audio_codec(codecs.audio_codec.clone())
            .arg("-b:a")
            .arg(codecs.audio_bitrate.clone());

        for option in &codecs.encoding_options {
            cmd = cmd.arg(option);
        }

        cmd.duration(duration).output(output_path)
    }
}

/// Fixed encoding settings of the final mux
#[derive(Debug, Clone)]
pub struct MuxCodecs {
    pub video_codec: String,
    pub audio_codec: String,
    pub audio_bitrate: String,
    pub encoding_options: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn builder() -> MediaCommandBuilder {
        MediaCommandBuilder::new("ffmpeg", "ffprobe")
    }

    fn codecs() -> MuxCodecs {
        MuxCodecs {
            video_codec: "copy".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            encoding_options: vec!["-movflags".to_string(), "+faststart".to_string()],
        }
    }

    #[test]
    fn test_extract_audio_args() {
        let cmd = builder().extract_audio("in.mp4", "out.wav", 16000);
        assert_eq!(
            cmd.args,
            vec!["-y", "-i", "in.mp4", "-vn", "-c:a", "pcm_s16le", "-ar", "16000", "-ac", "1", "out.wav"]
        );
    }

    #[test]
    fn test_trim_audio_limits_duration() {
        let cmd = builder().trim_audio("dub.mp3", "trimmed.mp3", 20.0);
        let t = cmd.args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(cmd.args[t + 1], "20.000");
        assert_eq!(cmd.args.last().unwrap(), "trimmed.mp3");
    }

    #[test]
    fn test_mux_copies_video_and_places_options_before_output() {
        let cmd = builder().mux_dub(
            &PathBuf::from("video.mp4"),
            &PathBuf::from("dub.mp3"),
            &PathBuf::from("out.mp4"),
            30.0,
            Some(0.1),
            &codecs(),
        );

        let args = cmd.args.join(" ");
        assert!(args.contains("-map 0:v:0"));
        assert!(args.contains("-map [aout]"));
        assert!(args.contains("-c:v copy"));
        assert!(args.contains("-c:a aac -b:a 192k -movflags +faststart -t 30.000 out.mp4"));
    }

    #[tokio::test]
    async fn test_missing_binary_reports_configured_failure() {
        let cmd = MediaCommand::new("globaldub-no-such-binary", "Tempo change").arg("-version");
        let err = cmd.execute().await.unwrap_err();
        assert!(matches!(err, DubError::Transcode(_)));

        let cmd = cmd.on_failure(DubError::Asset);
        assert!(matches!(cmd.execute().await, Err(DubError::Asset(_))));
    }
}
