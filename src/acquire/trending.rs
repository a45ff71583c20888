use chrono::{Datelike, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::{AcquireConfig, TrendingConfig};
use crate::error::{DubError, Result};

/// A search hit that looks like a YouTube short
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingShort {
    pub id: String,
    pub title: String,
    pub url: String,
}

impl TrendingShort {
    fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://youtube.com/shorts/{}", id),
        }
    }
}

/// YouTube video ids are 11 characters of the URL-safe base64 alphabet
fn is_video_id(value: &str) -> bool {
    value.len() == 11
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Parse `--get-title --get-id` output: a title line followed by an id line per hit
pub fn parse_search_output(stdout: &str) -> Vec<TrendingShort> {
    let lines: Vec<&str> = stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    lines
        .chunks_exact(2)
        .filter(|pair| is_video_id(pair[1]))
        .map(|pair| TrendingShort::new(pair[1], pair[0]))
        .collect()
}

/// `count` queries starting at a position derived from `seed`, wrapping around
pub fn select_queries(queries: &[String], count: usize, seed: usize) -> Vec<&str> {
    if queries.is_empty() {
        return Vec::new();
    }
    let start = seed.wrapping_mul(count) % queries.len();
    queries
        .iter()
        .cycle()
        .skip(start)
        .take(count.min(queries.len()))
        .map(String::as_str)
        .collect()
}

/// Take one hit from each query in turn, skipping ids already seen
fn interleave_unique(results: Vec<Vec<TrendingShort>>, limit: usize) -> Vec<TrendingShort> {
    let mut seen = HashSet::new();
    let mut picked = Vec::new();
    let longest = results.iter().map(Vec::len).max().unwrap_or(0);

    for idx in 0..longest {
        for hits in &results {
            if picked.len() == limit {
                return picked;
            }
            if let Some(hit) = hits.get(idx) {
                if seen.insert(hit.id.clone()) {
                    picked.push(hit.clone());
                }
            }
        }
    }
    picked
}

/// Finds popular shorts through yt-dlp's search, without an API key
pub struct TrendingFetcher {
    acquire: AcquireConfig,
    config: TrendingConfig,
}

impl TrendingFetcher {
    pub fn new(acquire: AcquireConfig, config: TrendingConfig) -> Self {
        Self { acquire, config }
    }

    /// yt-dlp arguments listing the first `max_results` hits for `query`
    pub fn search_args(&self, query: &str, max_results: usize) -> Vec<String> {
        vec![
            format!("ytsearch{}:{}", max_results, query),
            "--get-title".to_string(),
            "--get-id".to_string(),
            "--no-download".to_string(),
            "--flat-playlist".to_string(),
            "--socket-timeout".to_string(),
            self.acquire.socket_timeout.to_string(),
        ]
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<TrendingShort>> {
        let args = self.search_args(query, max_results);
        debug!("Executing {} {:?}", self.acquire.binary_path, args);

        let output = Command::new(&self.acquire.binary_path)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| DubError::Acquisition(format!("Failed to execute {}: {}", self.acquire.binary_path, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DubError::Acquisition(format!("search '{}' failed: {}", query, stderr.trim())));
        }

        Ok(parse_search_output(&String::from_utf8_lossy(&output.stdout)))
    }

    /// Up to `count` distinct shorts from today's share of the configured queries
    pub async fn fetch(&self, count: usize) -> Result<Vec<TrendingShort>> {
        let seed = Utc::now().ordinal0() as usize;
        let queries = select_queries(&self.config.queries, self.config.queries_per_fetch, seed);
        if queries.is_empty() {
            return Err(DubError::Config("trending.queries is empty".to_string()));
        }

        let mut results = Vec::with_capacity(queries.len());
        let mut failures = Vec::new();
        for query in &queries {
            info!("Searching: {}", query);
            match self.search(query, self.config.results_per_query).await {
                Ok(hits) => results.push(hits),
                Err(e) => {
                    warn!("{}", e);
                    failures.push(e.to_string());
                }
            }
        }

        if results.is_empty() {
            return Err(DubError::Acquisition(failures.join("; ")));
        }

        let picked = interleave_unique(results, count);
        info!("Found {} shorts to dub", picked.len());
        Ok(picked)
    }
}

/// Write `shorts` as a batch locator list with a timestamped header comment
pub fn save_locator_list<P: AsRef<Path>>(shorts: &[TrendingShort], path: P) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut content = format!("# Trending shorts fetched {}\n", Utc::now().to_rfc3339());
    for short in shorts {
        content.push_str(&format!("# {}\n{}\n", short.title, short.url));
    }
    std::fs::write(path, content)?;

    info!("Saved {} locators to {}", shorts.len(), path.display());
    Ok(())
}
