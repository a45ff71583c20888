use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use crate::error::{Result, DubError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub media: MediaConfig,
    #[serde(default)]
    pub acquire: AcquireConfig,
    #[serde(default)]
    pub trending: TrendingConfig,
    #[serde(default)]
    pub transcriber: TranscriberConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub synthesize: SynthesizeConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory receiving finished videos
    pub output_dir: PathBuf,
    /// Root under which every job gets its own scratch directory
    pub temp_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    /// Path to ffmpeg binary
    pub binary_path: String,
    /// Path to ffprobe binary
    pub probe_path: String,
    /// Video codec for the final mux; "copy" keeps the source stream untouched
    pub video_codec: String,
    /// Audio codec for the final mux
    pub audio_codec: String,
    /// Audio bitrate for the final mux
    pub audio_bitrate: String,
    /// Additional output options appended to the final mux command
    /// Common options when re-encoding video: ["-preset", "ultrafast", "-crf", "23"]
    pub encoding_options: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcquireConfig {
    /// Path to yt-dlp binary
    pub binary_path: String,
    /// yt-dlp format selector
    pub format: String,
    /// Socket timeout passed to yt-dlp (seconds)
    pub socket_timeout: u32,
    /// Download retries passed to yt-dlp
    pub retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendingConfig {
    /// Searches used to discover popular shorts
    pub queries: Vec<String>,
    /// Queries searched per run; the selection rotates daily
    pub queries_per_fetch: usize,
    /// Hits requested per query
    pub results_per_query: usize,
    /// Locators written when no count is given
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriberConfig {
    /// Path to the whisper CLI
    pub binary_path: String,
    /// Whisper model name
    pub model: String,
    /// Spoken language of the source videos
    pub source_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TranslationBackendKind {
    /// Local Ollama server
    Ollama,
    /// Public Google Translate web endpoint
    Google,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Which translation service to use
    pub backend: TranslationBackendKind,
    /// Service endpoint URL
    pub endpoint: String,
    /// LLM model to use with the Ollama backend
    pub model: String,
    /// Texts longer than this many characters are split at sentence boundaries
    pub chunk_threshold: usize,
    /// Maximum retries for a failed request
    pub max_retries: u32,
    /// HTTP timeout (seconds)
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesizeConfig {
    /// Path to the edge-tts CLI
    pub binary_path: String,
    /// Voice used when no mapping matches the target language
    pub default_voice: String,
    /// Language code to voice identifier
    pub voices: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Linear gain applied to the original audio bed (0 = silent, 1 = unchanged)
    pub original_volume: f64,
    /// Maximum speed-up applied to a dub longer than the video
    pub max_scale: f64,
    /// Accepted deviation (seconds) between a truncated dub and its target length
    pub duration_tolerance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Upload endpoint of the YouTube Data API
    pub endpoint: String,
    /// OAuth access token; falls back to the YOUTUBE_ACCESS_TOKEN environment variable
    pub access_token: Option<String>,
    /// Upload chunk size in bytes (multiple of 256 KiB)
    pub chunk_size: usize,
    /// Default privacy status: private, unlisted or public
    pub privacy: String,
    /// YouTube category id
    pub category_id: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./output"),
            temp_dir: PathBuf::from("./temp"),
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            binary_path: "ffmpeg".to_string(),
            probe_path: "ffprobe".to_string(),
            video_codec: "copy".to_string(),
            audio_codec: "aac".to_string(),
            audio_bitrate: "192k".to_string(),
            encoding_options: Vec::new(),
        }
    }
}

impl Default for AcquireConfig {
    fn default() -> Self {
        Self {
            binary_path: "yt-dlp".to_string(),
            format: "bestvideo[height<=1080][ext=mp4]+bestaudio[ext=m4a]/best[height<=1080][ext=mp4]/best".to_string(),
            socket_timeout: 30,
            retries: 3,
        }
    }
}

impl Default for TrendingConfig {
    fn default() -> Self {
        let queries = [
            "viral shorts today",
            "trending shorts",
            "funny shorts viral",
            "satisfying shorts",
            "life hacks shorts",
            "facts you didn't know shorts",
            "amazing shorts",
            "motivational shorts",
            "cooking shorts viral",
            "pet shorts funny",
        ];

        Self {
            queries: queries.iter().map(|q| q.to_string()).collect(),
            queries_per_fetch: 3,
            results_per_query: 5,
            count: 3,
        }
    }
}

impl Default for TranscriberConfig {
    fn default() -> Self {
        Self {
            binary_path: "whisper".to_string(),
            model: "base".to_string(),
            source_language: "en".to_string(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            backend: TranslationBackendKind::Google,
            endpoint: "https://translate.googleapis.com".to_string(),
            model: "llama3.2:3b".to_string(),
            chunk_threshold: 4500,
            max_retries: 3,
            timeout_secs: 120,
        }
    }
}

impl Default for SynthesizeConfig {
    fn default() -> Self {
        let voices = [
            ("es", "es-MX-DaliaNeural"),
            ("es-f", "es-MX-DaliaNeural"),
            ("es-m", "es-MX-JorgeNeural"),
            ("pt", "pt-BR-FranciscaNeural"),
            ("fr", "fr-FR-DeniseNeural"),
            ("de", "de-DE-KatjaNeural"),
            ("it", "it-IT-ElsaNeural"),
            ("ja", "ja-JP-NanamiNeural"),
            ("ko", "ko-KR-SunHiNeural"),
            ("zh", "zh-CN-XiaoxiaoNeural"),
            ("ar", "ar-SA-ZariyahNeural"),
            ("hi", "hi-IN-SwaraNeural"),
            ("ru", "ru-RU-SvetlanaNeural"),
        ]
        .into_iter()
        .map(|(lang, voice)| (lang.to_string(), voice.to_string()))
        .collect();

        Self {
            binary_path: "edge-tts".to_string(),
            default_voice: "es-MX-DaliaNeural".to_string(),
            voices,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            original_volume: 0.1,
            max_scale: 1.25,
            duration_tolerance: 0.05,
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/upload/youtube/v3/videos".to_string(),
            access_token: None,
            chunk_size: 8 * 1024 * 1024,
            privacy: "private".to_string(),
            category_id: "22".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            media: MediaConfig::default(),
            acquire: AcquireConfig::default(),
            trending: TrendingConfig::default(),
            transcriber: TranscriberConfig::default(),
            translate: TranslateConfig::default(),
            synthesize: SynthesizeConfig::default(),
            sync: SyncConfig::default(),
            publish: PublishConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DubError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| DubError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DubError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DubError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Reject values the synchronization stage cannot honor
    pub fn validate(&self) -> Result<()> {
        let sync = &self.sync;
        if !(0.0..=1.0).contains(&sync.original_volume) {
            return Err(DubError::Config(format!(
                "sync.original_volume must be within [0, 1], got {}",
                sync.original_volume
            )));
        }
        if !sync.max_scale.is_finite() || sync.max_scale <= 1.0 {
            return Err(DubError::Config(format!(
                "sync.max_scale must be greater than 1, got {}",
                sync.max_scale
            )));
        }
        if !sync.duration_tolerance.is_finite() || sync.duration_tolerance < 0.0 {
            return Err(DubError::Config(format!(
                "sync.duration_tolerance must be non-negative, got {}",
                sync.duration_tolerance
            )));
        }
        if self.trending.queries_per_fetch == 0 || self.trending.results_per_query == 0 {
            return Err(DubError::Config(
                "trending.queries_per_fetch and trending.results_per_query must be positive".to_string(),
            ));
        }
        if self.translate.chunk_threshold == 0 {
            return Err(DubError::Config("translate.chunk_threshold must be positive".to_string()));
        }
        if self.publish.chunk_size == 0 || self.publish.chunk_size % (256 * 1024) != 0 {
            return Err(DubError::Config(
                "publish.chunk_size must be a positive multiple of 262144".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sync.max_scale, 1.25);
        assert_eq!(config.sync.original_volume, 0.1);
        assert_eq!(config.translate.chunk_threshold, 4500);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.sync.original_volume = 0.25;
        config.save_to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.sync.original_volume, 0.25);
        assert_eq!(loaded.synthesize.voices.get("ja").map(String::as_str), Some("ja-JP-NanamiNeural"));
    }

    #[test]
    fn test_partial_file_uses_section_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[sync]\noriginal_volume = 0.0\nmax_scale = 1.5\nduration_tolerance = 0.1\n",
        )
        .unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.sync.max_scale, 1.5);
        assert_eq!(loaded.media.binary_path, "ffmpeg");
    }

    #[test]
    fn test_rejects_out_of_range_volume() {
        let mut config = Config::default();
        config.sync.original_volume = 1.5;
        assert!(matches!(config.validate(), Err(DubError::Config(_))));
    }

    #[test]
    fn test_rejects_max_scale_not_above_one() {
        let mut config = Config::default();
        config.sync.max_scale = 1.0;
        assert!(matches!(config.validate(), Err(DubError::Config(_))));
    }
}
