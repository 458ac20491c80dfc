//! Catalog of AI models a room may be created with.

use serde::Serialize;

/// Public description of a supported model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    /// Identifier sent with room creation and forwarded to the generator.
    pub id: &'static str,
    /// Vendor serving the model.
    pub provider: &'static str,
    /// Name shown in the room setup screen.
    pub display_name: &'static str,
    /// One-line description.
    pub description: &'static str,
}

const CATALOG: &[ModelInfo] = &[
    ModelInfo {
        id: "gemini-2.5-pro",
        provider: "google",
        display_name: "Gemini 2.5 Pro",
        description: "Google DeepMind's flagship Gemini model with multimodal reasoning support.",
    },
    ModelInfo {
        id: "gpt-5",
        provider: "openai",
        display_name: "GPT-5",
        description: "OpenAI's latest GPT release, tuned for problem solving and dialogue.",
    },
    ModelInfo {
        id: "claude-opus-4.1",
        provider: "anthropic",
        display_name: "Claude Opus 4.1",
        description: "Anthropic's top-tier Claude model for careful analysis.",
    },
    ModelInfo {
        id: "grok-4",
        provider: "xai",
        display_name: "Grok 4",
        description: "xAI's Grok model focused on long-context reasoning and code.",
    },
];

/// Every supported model, in display order.
#[must_use]
pub fn list_models() -> &'static [ModelInfo] {
    CATALOG
}

/// Looks up a supported model by id.
#[must_use]
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    CATALOG.iter().find(|m| m.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lists_the_four_supported_models() {
        let ids: Vec<&str> = list_models().iter().map(|m| m.id).collect();

        assert_eq!(ids, vec!["gemini-2.5-pro", "gpt-5", "claude-opus-4.1", "grok-4"]);
        assert!(list_models().iter().all(|m| !m.display_name.is_empty()));
    }

    #[test]
    fn test_find_model_is_exact() {
        assert_eq!(find_model("grok-4").map(|m| m.provider), Some("xai"));
        assert!(find_model("GPT-5").is_none());
        assert!(find_model("claude-haiku").is_none());
    }

    #[test]
    fn test_default_model_is_in_the_catalog() {
        let settings = crate::settings::GameSettings::default();

        assert!(find_model(&settings.default_model_id).is_some());
    }
}
