//! Per-provider defaults: endpoints, credentials, widget names and model preferences.

use super::profile::ProviderType;
use super::CompletionOptions;

/// Static facts about one hosted provider.
#[derive(Debug)]
pub struct ProviderCatalog {
    pub default_endpoint: &'static str,
    /// Conventional environment variable holding the API key.
    pub api_key_env: Option<&'static str>,
    pub widget_name: &'static str,
    pub structured_payload: bool,
    /// Substrings ranked best-first; unknown models sort last.
    pub priority: &'static [&'static str],
    /// Used when listing models fails.
    pub fallback_models: &'static [&'static str],
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: Option<u32>,
    pub max_output_tokens: u32,
}

/// Model families that cannot generate code.
pub const EXCLUDED_MODEL_FAMILIES: [&str; 5] = ["guard", "whisper", "tts", "embed", "rerank"];

/// Cap on candidates probed by `initialize`.
pub const MAX_PROBED_MODELS: usize = 5;

const GEMINI: ProviderCatalog = ProviderCatalog {
    default_endpoint: "https://generativelanguage.googleapis.com/v1beta",
    api_key_env: Some("GEMINI_API_KEY"),
    widget_name: "GeminiGeneratedWidget",
    structured_payload: true,
    priority: &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-1.0-pro", "gemini-pro"],
    fallback_models: &["gemini-1.5-flash", "gemini-1.5-pro", "gemini-1.0-pro", "gemini-pro"],
    temperature: 0.7,
    top_p: 0.8,
    top_k: Some(40),
    max_output_tokens: 8192,
};

const GROQ: ProviderCatalog = ProviderCatalog {
    default_endpoint: "https://api.groq.com/openai/v1",
    api_key_env: Some("GROQ_API_KEY"),
    widget_name: "GroqGeneratedWidget",
    structured_payload: true,
    priority: &[
        "llama-3.3-70b-versatile",
        "llama-3.1-70b-versatile",
        "mixtral-8x7b-32768",
        "llama-3.1-8b-instant",
        "gemma2-9b-it",
        "qwen/qwen3-32b",
        "openai/gpt-oss-120b",
        "openai/gpt-oss-20b",
        "moonshotai/kimi-k2-instruct",
        "meta-llama/llama-4-maverick-17b-128e-instruct",
        "meta-llama/llama-4-scout-17b-16e-instruct",
    ],
    fallback_models: &[
        "llama-3.3-70b-versatile",
        "llama-3.1-70b-versatile",
        "mixtral-8x7b-32768",
        "llama-3.1-8b-instant",
        "gemma2-9b-it",
    ],
    temperature: 0.4,
    top_p: 0.8,
    top_k: None,
    max_output_tokens: 8192,
};

const COHERE: ProviderCatalog = ProviderCatalog {
    default_endpoint: "https://api.cohere.com",
    api_key_env: Some("COHERE_API_KEY"),
    widget_name: "CohereGeneratedWidget",
    structured_payload: true,
    priority: &[
        "command-r-plus-08-2024",
        "command-r-08-2024",
        "command-r-plus",
        "command-r",
        "command",
        "command-light",
    ],
    fallback_models: &["command-r-plus", "command-r", "command"],
    temperature: 0.4,
    top_p: 0.8,
    top_k: Some(40),
    max_output_tokens: 4096,
};

const HUGGING_FACE: ProviderCatalog = ProviderCatalog {
    default_endpoint: "https://router.huggingface.co/v1",
    api_key_env: Some("HUGGINGFACE_API_KEY"),
    widget_name: "HuggingFaceGeneratedWidget",
    structured_payload: false,
    priority: &[
        "deepseek-ai/deepseek-coder-7b-instruct",
        "Qwen/Qwen2.5-Coder-7B-Instruct",
        "mistralai/Mistral-7B-Instruct-v0.3",
        "teknium/OpenHermes-2.5-Mistral-7B",
        "HuggingFaceH4/zephyr-7b-beta",
        "meta-llama/Llama-2-7b-chat-hf",
    ],
    fallback_models: &[
        "deepseek-ai/deepseek-coder-7b-instruct",
        "Qwen/Qwen2.5-Coder-7B-Instruct",
        "mistralai/Mistral-7B-Instruct-v0.3",
        "teknium/OpenHermes-2.5-Mistral-7B",
        "HuggingFaceH4/zephyr-7b-beta",
        "meta-llama/Llama-2-7b-chat-hf",
    ],
    temperature: 0.6,
    top_p: 0.9,
    top_k: None,
    max_output_tokens: 3000,
};

const OPEN_ROUTER: ProviderCatalog = ProviderCatalog {
    default_endpoint: "https://openrouter.ai/api/v1",
    api_key_env: Some("OPENROUTER_API_KEY"),
    widget_name: "OpenRouterGeneratedWidget",
    structured_payload: true,
    priority: &[
        "meta-llama/llama-3.3-70b-instruct",
        "mistralai/mistral-large-2",
        "meta-llama/llama-3.1-405b-instruct",
        "qwen/qwen-2.5-72b-instruct",
        "meta-llama/llama-3.1-70b-instruct",
        "mistralai/mistral-small-24b-instruct-2501",
        "google/gemma-2-9b-it",
        "mistralai/mistral-nemo",
        "meta-llama/llama-3.2-3b-instruct",
    ],
    fallback_models: &["meta-llama/llama-3.3-70b-instruct", "mistralai/mistral-large-2"],
    temperature: 0.3,
    top_p: 0.9,
    top_k: None,
    max_output_tokens: 4096,
};

const OPENAI: ProviderCatalog = ProviderCatalog {
    default_endpoint: "https://api.openai.com/v1",
    api_key_env: Some("OPENAI_API_KEY"),
    widget_name: "ChatGPTGeneratedWidget",
    structured_payload: true,
    priority: &["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-4", "gpt-3.5-turbo"],
    fallback_models: &["gpt-4o-mini", "gpt-4o", "gpt-3.5-turbo"],
    temperature: 0.3,
    top_p: 0.9,
    top_k: None,
    max_output_tokens: 4096,
};

const OLLAMA: ProviderCatalog = ProviderCatalog {
    default_endpoint: "http://localhost:11434/v1",
    api_key_env: None,
    widget_name: "OllamaGeneratedWidget",
    structured_payload: false,
    priority: &["qwen2.5-coder", "deepseek-coder", "codellama", "llama3"],
    fallback_models: &["qwen2.5-coder", "llama3"],
    temperature: 0.3,
    top_p: 0.9,
    top_k: None,
    max_output_tokens: 4096,
};

impl ProviderCatalog {
    pub fn for_type(provider_type: ProviderType) -> &'static ProviderCatalog {
        match provider_type {
            ProviderType::Gemini => &GEMINI,
            ProviderType::Groq => &GROQ,
            ProviderType::Cohere => &COHERE,
            ProviderType::HuggingFace => &HUGGING_FACE,
            ProviderType::OpenRouter => &OPEN_ROUTER,
            ProviderType::OpenAI => &OPENAI,
            ProviderType::Ollama => &OLLAMA,
        }
    }

    pub fn default_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: Some(self.temperature),
            top_p: Some(self.top_p),
            top_k: self.top_k,
            max_tokens: Some(self.max_output_tokens),
        }
    }

    /// Position in the priority list; unknown models rank after every known one.
    pub fn priority_of(&self, model: &str) -> usize {
        self.priority
            .iter()
            .position(|preferred| model.contains(preferred))
            .unwrap_or(self.priority.len())
    }

    /// Drop excluded families and order by priority, keeping listing order among equals.
    pub fn rank_models(&self, models: Vec<String>) -> Vec<String> {
        let mut usable: Vec<String> = models
            .into_iter()
            .filter(|model| !is_excluded(model))
            .collect();
        usable.sort_by_key(|model| self.priority_of(model));
        usable
    }
}

pub fn is_excluded(model: &str) -> bool {
    let lowered = model.to_lowercase();
    EXCLUDED_MODEL_FAMILIES
        .iter()
        .any(|family| lowered.contains(family))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rank_filters_and_orders() {
        let catalog = ProviderCatalog::for_type(ProviderType::Groq);
        let ranked = catalog.rank_models(vec![
            "some-new-model".to_string(),
            "whisper-large-v3".to_string(),
            "llama-3.1-8b-instant".to_string(),
            "meta-llama/llama-prompt-guard-2-86m".to_string(),
            "llama-3.3-70b-versatile".to_string(),
            "playai-tts".to_string(),
            "another-new-model".to_string(),
        ]);
        assert_eq!(
            ranked,
            vec![
                "llama-3.3-70b-versatile",
                "llama-3.1-8b-instant",
                "some-new-model",
                "another-new-model",
            ]
        );
    }

    #[test]
    fn test_widget_names_and_payload_defaults() {
        assert_eq!(
            ProviderCatalog::for_type(ProviderType::OpenAI).widget_name,
            "ChatGPTGeneratedWidget"
        );
        assert!(!ProviderCatalog::for_type(ProviderType::HuggingFace).structured_payload);
        assert!(!ProviderCatalog::for_type(ProviderType::Ollama).structured_payload);
        assert!(ProviderCatalog::for_type(ProviderType::Cohere).structured_payload);
    }
}
