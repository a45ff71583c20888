//! globaldub - Automated video dubbing workflow
//!
//! Entry point for the command line tool: downloads a short video, transcribes
//! and translates its speech, synthesizes a dub and mixes it back over the
//! original audio using yt-dlp, whisper, edge-tts and ffmpeg.

use anyhow::{bail, Result};
use clap::Parser;
use std::path::Path;
use tracing::{info, warn, Level};
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use globaldub::acquire::trending::{save_locator_list, TrendingFetcher};
use globaldub::batch::{load_locators, BatchRunner};
use globaldub::cli::{Args, Commands};
use globaldub::config::Config;
use globaldub::job::{Job, MediaAsset};
use globaldub::media::MediaProcessorFactory;
use globaldub::pipeline::{JobOutcome, JobReport, Pipeline};
use globaldub::publish::{PublisherFactory, UploadRequest};
use globaldub::setup::{preflight, DependencyChecker};
use globaldub::synthesize::VoiceProfile;
use globaldub::sync::{DubPlan, TrackMixer};
use globaldub::translate::{language_name, TranslatorFactory};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging to both console and file
    setup_logging(args.verbose)?;

    let mut config = match &args.config {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    match args.command {
        Commands::Dub { locator, lang, output, output_dir, keep_temp } => {
            if let Some(dir) = output_dir {
                config.paths.output_dir = dir;
            }
            preflight(&config).await?;

            let job = Job::new(locator, lang)?
                .with_output_name(output)
                .keep_temp(keep_temp);
            let pipeline = Pipeline::new(&config)?.with_progress(true);

            let report = pipeline.run(&job).await;
            print_report(&report);
            if !report.is_success() {
                bail!("dubbing failed");
            }
        }
        Commands::Batch { source, lang, output_dir, keep_temp, report } => {
            if let Some(dir) = output_dir {
                config.paths.output_dir = dir;
            }

            let locators = load_locators(&source)?;
            if locators.is_empty() {
                warn!("No videos found in {}", source.display());
                return Ok(());
            }
            preflight(&config).await?;
            let jobs = locators
                .into_iter()
                .map(|locator| Job::new(locator, lang.as_str()).map(|job| job.keep_temp(keep_temp)))
                .collect::<globaldub::error::Result<Vec<_>>>()?;

            let runner = BatchRunner::new(Pipeline::new(&config)?).with_progress(true);
            let batch = runner.run(&jobs).await;

            println!();
            for result in &batch.results {
                print_report(result);
            }
            println!(
                "\n{} succeeded, {} failed, {} total",
                batch.succeeded(),
                batch.failed(),
                batch.results.len()
            );

            if let Some(path) = report {
                batch.save_json(&path)?;
            }
            if !batch.all_succeeded() {
                bail!("{} of {} jobs failed", batch.failed(), batch.results.len());
            }
        }
        Commands::Mix { video, dub, output, volume, max_scale } => {
            let volume = volume.unwrap_or(config.sync.original_volume);
            let max_scale = max_scale.unwrap_or(config.sync.max_scale);
            info!("Mixing {} over {}", dub.display(), video.display());

            let media = MediaProcessorFactory::create_processor(config.media.clone());
            let video_probe = media.probe(&video).await?;
            let dub_probe = media.probe(&dub).await?;

            let plan = DubPlan::build(
                MediaAsset::video(&video, video_probe.duration),
                MediaAsset::audio(&dub, dub_probe.duration),
                max_scale,
            )?;
            info!("Plan: {} (ratio {:.3})", plan.action.name(), plan.required_ratio);

            let scratch = tempfile::tempdir()?;
            let mixer = TrackMixer::new(media, &config.sync);
            let mixed = mixer.mix(&plan, volume, &output, scratch.path()).await?;
            println!("Created {} ({:.2}s, {})", mixed.path.display(), mixed.duration, plan.action.name());
        }
        Commands::Trending { count, output } => {
            let count = count.unwrap_or(config.trending.count);
            let fetcher = TrendingFetcher::new(config.acquire.clone(), config.trending.clone());
            let shorts = fetcher.fetch(count).await?;
            if shorts.is_empty() {
                bail!("no shorts found");
            }

            for short in &shorts {
                println!("  {}  {}", short.url, short.title.chars().take(50).collect::<String>());
            }
            save_locator_list(&shorts, &output)?;
            println!("\nSaved {} locators. Dub them with:", shorts.len());
            println!("  globaldub batch {} -l es", output.display());
        }
        Commands::Langs => {
            let voices = VoiceProfile::from_config(&config.synthesize);
            println!("\n{:<8} {:<14} {:<30}", "Code", "Language", "Voice");
            println!("{}", "-".repeat(52));
            for (code, voice) in voices.entries() {
                println!("{:<8} {:<14} {:<30}", code, language_name(code), voice);
            }
            println!("\nDefault voice: {}", voices.default_voice());
        }
        Commands::Check => {
            let checker = DependencyChecker::from_config(&config);
            let statuses = checker.check_all().await;

            println!("\n{:<10} {:<8} {:<50}", "Tool", "Status", "Details");
            println!("{}", "-".repeat(70));
            for status in &statuses {
                let (label, detail) = if status.available {
                    ("ok", status.detail.as_str())
                } else {
                    ("MISSING", status.install_hint.as_str())
                };
                println!("{:<10} {:<8} {:<50}", status.name, label, detail);
            }

            match TranslatorFactory::create_backend(&config.translate) {
                Ok(backend) => {
                    if let Err(e) = backend.check_availability().await {
                        warn!("Translation backend not reachable: {}", e);
                    }
                }
                Err(e) => warn!("Cannot create translation backend: {}", e),
            }

            let missing = statuses.iter().filter(|s| !s.available).count();
            if missing > 0 {
                bail!("{} required tool(s) missing", missing);
            }
            println!("\nAll tools available");
        }
        Commands::InitConfig { path } => {
            if path.exists() {
                bail!("{} already exists", path.display());
            }
            Config::default().save_to_file(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
        Commands::Upload { video, title, source_url, lang, description, tags, privacy } => {
            let request = UploadRequest {
                title,
                source: source_url.zip(lang),
                description,
                tags,
                privacy,
            };
            let metadata = request.metadata(&config.publish);
            info!("Uploading {} as \"{}\"", video.display(), metadata.title);

            let publisher = PublisherFactory::create_default(config.publish.clone())?;
            let id = publisher.publish(&video, &metadata).await?;
            println!("Uploaded: https://youtube.com/shorts/{}", id);
        }
    }

    Ok(())
}

fn print_report(report: &JobReport) {
    match &report.outcome {
        JobOutcome::Done { output, plan } => {
            println!(
                "OK     {} -> {} ({}, ratio {:.2})",
                report.job.locator,
                output.display(),
                plan.action.name(),
                plan.required_ratio
            );
        }
        JobOutcome::Failed { stage, message, .. } => {
            println!("FAILED {} while {}: {}", report.job.locator, stage, message);
        }
    }
    if let Some(kept) = &report.kept_workspace {
        println!("       temporary files kept in {}", kept.display());
    }
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<()> {
    let log_dir = std::env::current_dir()?.join(".globaldub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "globaldub.log");
    let (non_blocking_file, _guard) = non_blocking(file_appender);
    // Keep the guard alive for the duration of the program
    std::mem::forget(_guard);

    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(console_layer)
        .with(file_layer);

    subscriber.try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!("Logging initialized - console: {}, file: {}",
          log_level, log_dir.join("globaldub.log").display());

    Ok(())
}
