use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Dub a single video (URL or local file)
    Dub {
        /// Video URL or local path
        locator: String,

        /// Target language code
        #[arg(short, long, default_value = "es")]
        lang: String,

        /// Output file name (default: dubbed_<id>_<lang>.mp4)
        #[arg(short, long)]
        output: Option<String>,

        /// Output directory for dubbed videos
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Keep the job's temporary files
        #[arg(long)]
        keep_temp: bool,
    },

    /// Dub every video listed in a file or found in a directory
    Batch {
        /// Locator list (one per line, `#` comments) or directory of videos
        source: PathBuf,

        /// Target language code
        #[arg(short, long, default_value = "es")]
        lang: String,

        /// Output directory for dubbed videos
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Keep each job's temporary files
        #[arg(long)]
        keep_temp: bool,

        /// Write a JSON report of the batch
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Fit an existing dub track to a video and mix it over the original audio
    Mix {
        /// Input video file
        #[arg(long)]
        video: PathBuf,

        /// Dub audio file
        #[arg(long)]
        dub: PathBuf,

        /// Output video file
        #[arg(short, long)]
        output: PathBuf,

        /// Gain of the original audio (0-1)
        #[arg(long)]
        volume: Option<f64>,

        /// Maximum speed-up applied to a long dub
        #[arg(long)]
        max_scale: Option<f64>,
    },

    /// Search for popular shorts and write them as a batch list
    Trending {
        /// Number of locators to write (default: trending.count)
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Destination list file
        #[arg(short, long, default_value = "urls_to_dub.txt")]
        output: PathBuf,
    },

    /// List supported languages and their voices
    Langs,

    /// Check that the external tools are installed
    Check,

    /// Write a configuration file with default values
    InitConfig {
        /// Destination path
        path: PathBuf,
    },

    /// Upload a video to YouTube
    Upload {
        /// Video file to upload
        #[arg(long)]
        video: PathBuf,

        /// Video title; with --source-url, the original video's title
        #[arg(long)]
        title: String,

        /// URL of the original video; generates the dub title, description and tags
        #[arg(long, requires = "lang")]
        source_url: Option<String>,

        /// Language of the dub (with --source-url)
        #[arg(short, long, requires = "source_url")]
        lang: Option<String>,

        /// Video description
        #[arg(long)]
        description: Option<String>,

        /// Tags (comma-separated)
        #[arg(long)]
        tags: Option<String>,

        /// Privacy status: private, unlisted or public
        #[arg(long)]
        privacy: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dub_defaults() {
        let args = Args::try_parse_from(["globaldub", "dub", "https://youtube.com/shorts/abc"]).unwrap();
        match args.command {
            Commands::Dub { locator, lang, output, keep_temp, .. } => {
                assert_eq!(locator, "https://youtube.com/shorts/abc");
                assert_eq!(lang, "es");
                assert!(output.is_none());
                assert!(!keep_temp);
            }
            _ => panic!("expected dub"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = Args::try_parse_from(["globaldub", "check", "-v", "-c", "my.toml"]).unwrap();
        assert!(args.verbose);
        assert_eq!(args.config, Some(PathBuf::from("my.toml")));
    }

    #[test]
    fn test_mix_requires_inputs() {
        assert!(Args::try_parse_from(["globaldub", "mix", "--video", "v.mp4"]).is_err());

        let args = Args::try_parse_from([
            "globaldub", "mix", "--video", "v.mp4", "--dub", "d.mp3", "-o", "out.mp4", "--volume", "0",
        ])
        .unwrap();
        match args.command {
            Commands::Mix { volume, max_scale, .. } => {
                assert_eq!(volume, Some(0.0));
                assert!(max_scale.is_none());
            }
            _ => panic!("expected mix"),
        }
    }

    #[test]
    fn test_trending_defaults() {
        let args = Args::try_parse_from(["globaldub", "trending", "-n", "5"]).unwrap();
        match args.command {
            Commands::Trending { count, output } => {
                assert_eq!(count, Some(5));
                assert_eq!(output, PathBuf::from("urls_to_dub.txt"));
            }
            _ => panic!("expected trending"),
        }
    }

    #[test]
    fn test_upload_source_and_language_go_together() {
        let args = Args::try_parse_from([
            "globaldub", "upload", "--video", "d.mp4", "--title", "Cat", "--source-url",
            "https://youtube.com/shorts/abc", "-l", "pt",
        ])
        .unwrap();
        match args.command {
            Commands::Upload { source_url, lang, .. } => {
                assert_eq!(source_url.as_deref(), Some("https://youtube.com/shorts/abc"));
                assert_eq!(lang.as_deref(), Some("pt"));
            }
            _ => panic!("expected upload"),
        }

        assert!(Args::try_parse_from([
            "globaldub", "upload", "--video", "d.mp4", "--title", "Cat", "--source-url", "https://x",
        ])
        .is_err());
    }
}
