//! Pure builders for the ffmpeg filter expressions used by the sync stage.

use crate::error::DubError;

/// Label of the mixed audio produced by [`mix_filter_graph`]
pub const MIX_OUTPUT_LABEL: &str = "aout";

/// Range a single `atempo` instance accepts on every ffmpeg release
const ATEMPO_MIN: f64 = 0.5;
const ATEMPO_MAX: f64 = 2.0;

/// Format seconds the way every command line in this crate does
pub fn format_seconds(seconds: f64) -> String {
    format!("{:.3}", seconds)
}

/// Split a tempo factor into stages that each stay within `[0.5, 2.0]`.
///
/// The product of the returned stages equals `factor`.
pub fn atempo_chain(factor: f64) -> Vec<f64> {
    let mut remaining = factor;
    let mut stages = Vec::new();

    while remaining > ATEMPO_MAX {
        stages.push(ATEMPO_MAX);
        remaining /= ATEMPO_MAX;
    }
    while remaining < ATEMPO_MIN {
        stages.push(ATEMPO_MIN);
        remaining /= ATEMPO_MIN;
    }
    stages.push(remaining);
    stages
}

/// `-af` expression changing tempo by `factor`
pub fn atempo_filter(factor: f64) -> String {
    atempo_chain(factor)
        .iter()
        .map(|stage| format!("atempo={:.6}", stage))
        .collect::<Vec<_>>()
        .join(",")
}

/// Filter graph summing the attenuated original bed (input 0) with the dub (input 1).
///
/// Both tracks are cut and padded to exactly `duration` seconds. With
/// `original_volume == None` the source has no audio and the dub is used alone.
pub fn mix_filter_graph(duration: f64, original_volume: Option<f64>) -> String {
    let d = format_seconds(duration);
    let dub = format!("[1:a]atrim=duration={d},asetpts=PTS-STARTPTS,apad=whole_dur={d}");

    match original_volume {
        Some(volume) => format!(
            "[0:a]volume={volume:.3},atrim=duration={d},asetpts=PTS-STARTPTS,apad=whole_dur={d}[bed];\
             {dub}[dub];\
             [bed][dub]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[{MIX_OUTPUT_LABEL}]"
        ),
        None => format!("{dub}[{MIX_OUTPUT_LABEL}]"),
    }
}

/// Classify a failed mux: problems writing the output are IO errors, the rest
/// point at an unreadable input.
pub fn classify_mux_failure(stderr: &str) -> DubError {
    const WRITE_FAILURES: [&str; 4] = [
        "No space left on device",
        "Permission denied",
        "Read-only file system",
        "Disk quota exceeded",
    ];

    let message = stderr.trim().to_string();
    if WRITE_FAILURES.iter().any(|marker| stderr.contains(marker)) {
        DubError::Io(std::io::Error::other(message))
    } else {
        DubError::Asset(message)
    }
}
