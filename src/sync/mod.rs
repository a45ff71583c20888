// Synchronization of the dub with the source video:
// - Reconcile: pure duration decision (pass-through, scale, truncate)
// - Scaler: tempo-only time scaling
// - Mixer: applies the decision and muxes dub + attenuated original bed

pub mod mixer;
pub mod reconcile;
pub mod scaler;

pub use mixer::TrackMixer;
pub use reconcile::{reconcile, DubAction, DubPlan, Reconciliation};
pub use scaler::AudioTimeScaler;
