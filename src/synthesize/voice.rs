use std::collections::BTreeMap;

use crate::config::SynthesizeConfig;

/// Language to voice mapping for speech synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceProfile {
    voices: BTreeMap<String, String>,
    default_voice: String,
}

impl VoiceProfile {
    pub fn new(voices: BTreeMap<String, String>, default_voice: impl Into<String>) -> Self {
        let voices = voices
            .into_iter()
            .map(|(lang, voice)| (lang.to_lowercase(), voice))
            .collect();
        Self { voices, default_voice: default_voice.into() }
    }

    pub fn from_config(config: &SynthesizeConfig) -> Self {
        Self::new(config.voices.clone(), config.default_voice.clone())
    }

    /// Voice for `language`: exact code, then its two-letter prefix, then the default
    pub fn voice_for(&self, language: &str) -> &str {
        let language = language.to_lowercase();
        if let Some(voice) = self.voices.get(&language) {
            return voice;
        }
        let base = language.split(['-', '_']).next().unwrap_or(&language);
        self.voices
            .get(base)
            .map(String::as_str)
            .unwrap_or(self.default_voice.as_str())
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.voices.iter().map(|(lang, voice)| (lang.as_str(), voice.as_str()))
    }

    pub fn default_voice(&self) -> &str {
        &self.default_voice
    }
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self::from_config(&SynthesizeConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_wins() {
        let profile = VoiceProfile::default();
        assert_eq!(profile.voice_for("es-m"), "es-MX-JorgeNeural");
        assert_eq!(profile.voice_for("FR"), "fr-FR-DeniseNeural");
    }

    #[test]
    fn test_region_falls_back_to_base_language() {
        let profile = VoiceProfile::default();
        assert_eq!(profile.voice_for("pt-PT"), "pt-BR-FranciscaNeural");
        assert_eq!(profile.voice_for("zh_TW"), "zh-CN-XiaoxiaoNeural");
    }

    #[test]
    fn test_unknown_language_uses_default() {
        let voices = BTreeMap::from([("de".to_string(), "de-DE-KatjaNeural".to_string())]);
        let profile = VoiceProfile::new(voices, "en-US-AriaNeural");
        assert_eq!(profile.voice_for("sw"), "en-US-AriaNeural");
        assert_eq!(profile.default_voice(), "en-US-AriaNeural");
    }

    #[test]
    fn test_entries_are_sorted() {
        let profile = VoiceProfile::default();
        let langs: Vec<&str> = profile.entries().map(|(lang, _)| lang).collect();
        let mut sorted = langs.clone();
        sorted.sort();
        assert_eq!(langs, sorted);
        assert_eq!(langs.len(), 13);
    }
}
