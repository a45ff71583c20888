use serde::{Deserialize, Serialize};

use crate::error::{Result, DubError};
use crate::job::MediaAsset;

/// What the mixer does to the dub before laying it over the video
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum DubAction {
    /// The dub already fits; use it unmodified
    PassThrough,
    /// Speed the dub up by `factor` (tempo only)
    Scaled { factor: f64 },
    /// Cut the dub to `target` seconds, no tempo change
    Truncated { target: f64 },
}

impl DubAction {
    /// Tempo factor actually applied to the dub
    pub fn applied_factor(&self) -> f64 {
        match self {
            Self::Scaled { factor } => *factor,
            Self::PassThrough | Self::Truncated { .. } => 1.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PassThrough => "pass-through",
            Self::Scaled { .. } => "scaled",
            Self::Truncated { .. } => "truncated",
        }
    }
}

/// Outcome of [`reconcile`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub action: DubAction,
    /// `dub / video`, unbounded; kept for diagnostics
    pub required_ratio: f64,
}

/// Decide how a dub of `dub_duration` seconds fits a video of `video_duration` seconds.
///
/// A shorter dub passes through untouched, a longer one is sped up while the
/// ratio stays within `max_scale`, otherwise it is truncated.
pub fn reconcile(video_duration: f64, dub_duration: f64, max_scale: f64) -> Result<Reconciliation> {
    if !video_duration.is_finite() || video_duration <= 0.0 {
        return Err(DubError::InvalidInput(format!(
            "video duration must be positive, got {}",
            video_duration
        )));
    }
    if !dub_duration.is_finite() || dub_duration < 0.0 {
        return Err(DubError::InvalidInput(format!(
            "dub duration must be non-negative, got {}",
            dub_duration
        )));
    }
    if !max_scale.is_finite() || max_scale <= 1.0 {
        return Err(DubError::InvalidInput(format!(
            "max scale must be greater than 1, got {}",
            max_scale
        )));
    }

    let required_ratio = dub_duration / video_duration;

    let action = if dub_duration <= video_duration {
        DubAction::PassThrough
    } else if required_ratio <= max_scale {
        DubAction::Scaled { factor: required_ratio }
    } else {
        DubAction::Truncated { target: video_duration }
    };

    Ok(Reconciliation { action, required_ratio })
}

/// Full description of how one job's dub is fitted to its video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DubPlan {
    pub dub: MediaAsset,
    pub video: MediaAsset,
    pub action: DubAction,
    pub required_ratio: f64,
}

impl DubPlan {
    /// Reconcile the two assets' durations into a plan
    pub fn build(video: MediaAsset, dub: MediaAsset, max_scale: f64) -> Result<Self> {
        let Reconciliation { action, required_ratio } =
            reconcile(video.duration, dub.duration, max_scale)?;

        Ok(Self { dub, video, action, required_ratio })
    }

    pub fn factor(&self) -> f64 {
        self.action.applied_factor()
    }
}
