// Speech synthesis
//
// Turns the translated text into a single dub track in the job workspace.

pub mod edge_tts;
pub mod voice;

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::config::SynthesizeConfig;
use crate::error::Result;
use crate::job::MediaAsset;
use crate::media::MediaProcessorTrait;

pub use voice::VoiceProfile;

/// Main trait for text-to-speech
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speak `text` with `voice` into `output`; the returned asset carries the probed duration
    async fn synthesize(&self, text: &str, voice: &str, output: &Path) -> Result<MediaAsset>;
}

/// Factory for creating synthesizer instances
pub struct SynthesizerFactory;

impl SynthesizerFactory {
    pub fn create_default(config: SynthesizeConfig, media: Arc<dyn MediaProcessorTrait>) -> Box<dyn Synthesizer> {
        Box::new(edge_tts::EdgeTtsSynthesizer::new(config, media))
    }
}
