//! Editor AI assist
//!
//! The rich-text editor sends a selection and an action ("fix grammar",
//! "summarize"...). A prompt is built for the action and handed to the
//! configured providers in order; the first non-empty answer wins. When every
//! provider fails, an offline mock rewrites the text with plain string
//! replacements so the buttons keep working without an API key.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

use super::html::{html_to_paragraphs, markdown_to_html, strip_tags};
use crate::config::{AiConfig, AiProviderConfig, AiProviderKind};

/// What to do with the selected text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistAction {
    Improve,
    FixGrammar,
    Expand,
    Summarize,
    Shorten,
    Formalize,
    Continue,
    GenerateTitle,
}

impl AssistAction {
    pub const ALL: [AssistAction; 8] = [
        AssistAction::Improve,
        AssistAction::FixGrammar,
        AssistAction::Expand,
        AssistAction::Summarize,
        AssistAction::Shorten,
        AssistAction::Formalize,
        AssistAction::Continue,
        AssistAction::GenerateTitle,
    ];

    fn instruction(&self) -> &'static str {
        match self {
            AssistAction::Improve => {
                "Improve the clarity and flow of the text below while keeping its meaning."
            }
            AssistAction::FixGrammar => {
                "Fix spelling, punctuation and grammar in the text below. Do not change its meaning or tone."
            }
            AssistAction::Expand => {
                "Expand the text below with more detail and supporting sentences in the same style."
            }
            AssistAction::Summarize => "Summarize the text below in two or three sentences.",
            AssistAction::Shorten => "Make the text below shorter while keeping the key information.",
            AssistAction::Formalize => {
                "Rewrite the text below in formal language suitable for an official village announcement."
            }
            AssistAction::Continue => {
                "Continue the text below with one or two paragraphs that follow naturally."
            }
            AssistAction::GenerateTitle => {
                "Write one short, engaging news headline for the text below. Answer with the headline only."
            }
        }
    }

    /// Titles are plain text; every other answer goes back into the editor
    fn produces_html(&self) -> bool {
        !matches!(self, AssistAction::GenerateTitle)
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistRequest {
    pub action: AssistAction,
    /// Selected text; HTML is reduced to plain text before prompting
    pub text: String,
    /// Surrounding content, e.g. the article title
    #[serde(default)]
    pub context: Option<String>,
    /// Render the answer as HTML for the editor
    #[serde(default = "default_true")]
    pub html: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AssistResponse {
    pub action: AssistAction,
    pub result: String,
    /// Name of the provider that answered
    pub provider: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    #[error("AI assist is disabled")]
    Disabled,

    #[error("Text cannot be empty")]
    EmptyInput,

    #[error("Text is too long (maximum {max} characters)")]
    InputTooLong { max: usize },

    #[error("No AI provider could answer the request")]
    Unavailable,
}

/// Build the prompt sent to a provider
pub fn build_prompt(action: AssistAction, text: &str, context: Option<&str>) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are an editor for the official website of Desa Banyuanyar, a village in Indonesia. \
         Answer in Bahasa Indonesia unless the text is in another language.\n",
    );
    prompt.push_str(action.instruction());
    prompt.push('\n');
    if action.produces_html() {
        prompt.push_str("Use Markdown for formatting. Return only the rewritten text without explanations.\n");
    }
    if let Some(context) = context.map(str::trim).filter(|c| !c.is_empty()) {
        prompt.push_str("\nContext:\n");
        prompt.push_str(context);
        prompt.push('\n');
    }
    prompt.push_str("\nText:\n");
    prompt.push_str(text.trim());
    prompt
}

/// Clean a raw provider answer: drop code fences and wrapping quotes
pub fn postprocess(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // skip the language tag line
        let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        text = body.trim_end().strip_suffix("```").unwrap_or(body).trim();
    }

    for (open, close) in [('"', '"'), ('\u{201C}', '\u{201D}'), ('\'', '\'')] {
        if text.chars().count() >= 2 && text.starts_with(open) && text.ends_with(close) {
            let inner = &text[open.len_utf8()..text.len() - close.len_utf8()];
            if !inner.contains(open) && !inner.contains(close) {
                text = inner.trim();
            }
            break;
        }
    }

    text.to_string()
}

/// A generative text backend
#[async_trait]
pub trait TextProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}

/// Google Gemini `generateContent`
pub struct GeminiProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://generativelanguage.googleapis.com/v1beta";

    pub fn new(client: reqwest::Client, model: &str, api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or(Self::DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn extract(body: &serde_json::Value) -> Option<String> {
        let parts = body.pointer("/candidates/0/content/parts")?.as_array()?;
        let text: String = parts.iter().filter_map(|p| p.get("text")?.as_str()).collect();
        Some(text)
    }
}

#[async_trait]
impl TextProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = json!({ "contents": [{ "parts": [{ "text": prompt }] }] });

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Gemini returned {}", status);
        }

        let value: serde_json::Value = response.json().await?;
        Self::extract(&value).ok_or_else(|| anyhow::anyhow!("Gemini response had no text"))
    }
}

/// Any OpenAI compatible `chat/completions` endpoint
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl OpenAiCompatibleProvider {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";

    pub fn new(client: reqwest::Client, model: &str, api_key: &str, base_url: Option<&str>) -> Self {
        Self {
            client,
            base_url: base_url.unwrap_or(Self::DEFAULT_BASE_URL).trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn extract(body: &serde_json::Value) -> Option<String> {
        body.pointer("/choices/0/message/content")?
            .as_str()
            .map(str::to_string)
    }
}

#[async_trait]
impl TextProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn generate(&self, prompt: &str) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0.4,
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Chat completion returned {}", status);
        }

        let value: serde_json::Value = response.json().await?;
        Self::extract(&value).ok_or_else(|| anyhow::anyhow!("Chat completion had no content"))
    }
}

/// Offline rewriter used when no provider answers
pub struct MockProvider;

const INFORMAL_WORDS: [(&str, &str); 12] = [
    ("gak", "tidak"),
    ("nggak", "tidak"),
    ("enggak", "tidak"),
    ("tdk", "tidak"),
    ("udah", "sudah"),
    ("aja", "saja"),
    ("bikin", "membuat"),
    ("yg", "yang"),
    ("dgn", "dengan"),
    ("krn", "karena"),
    ("utk", "untuk"),
    ("dr", "dari"),
];

impl MockProvider {
    pub fn rewrite(action: AssistAction, text: &str) -> String {
        let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
        match action {
            AssistAction::FixGrammar => fix_punctuation(&text),
            AssistAction::Formalize => fix_punctuation(&replace_informal(&text)),
            AssistAction::Improve => fix_punctuation(&replace_informal(&text)),
            AssistAction::Expand => format!(
                "{} Kegiatan ini diharapkan memberi manfaat bagi seluruh warga Desa Banyuanyar.",
                fix_punctuation(&text)
            ),
            AssistAction::Continue => format!(
                "{}\n\nInformasi lebih lanjut dapat diperoleh di kantor Desa Banyuanyar.",
                fix_punctuation(&text)
            ),
            AssistAction::Summarize => first_sentences(&text, 2),
            AssistAction::Shorten => {
                let words: Vec<&str> = text.split(' ').collect();
                let keep = (words.len() / 2).max(1).min(words.len());
                fix_punctuation(&words[..keep].join(" "))
            }
            AssistAction::GenerateTitle => {
                let first = first_sentences(&text, 1);
                first
                    .trim_end_matches(['.', '!', '?'])
                    .split(' ')
                    .take(8)
                    .map(capitalize)
                    .collect::<Vec<_>>()
                    .join(" ")
            }
        }
    }
}

fn replace_informal(text: &str) -> String {
    text.split(' ')
        .map(|word| {
            let core = word.trim_end_matches(|c: char| c.is_ascii_punctuation());
            let tail = &word[core.len()..];
            match INFORMAL_WORDS.iter().find(|(from, _)| core.eq_ignore_ascii_case(from)) {
                Some((_, to)) => format!("{}{}", to, tail),
                None => word.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn fix_punctuation(text: &str) -> String {
    let mut fixed = text
        .replace(" ,", ",")
        .replace(" .", ".")
        .replace(",,", ",")
        .replace("..", ".");
    fixed = capitalize(fixed.trim());
    if !fixed.is_empty() && !fixed.ends_with(['.', '!', '?']) {
        fixed.push('.');
    }
    fixed
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn first_sentences(text: &str, count: usize) -> String {
    let mut out = String::new();
    let mut seen = 0;
    for c in text.chars() {
        out.push(c);
        if matches!(c, '.' | '!' | '?') {
            seen += 1;
            if seen == count {
                break;
            }
        }
    }
    fix_punctuation(&out)
}

/// Provider chain for the editor's assist buttons
pub struct AiAssistService {
    enabled: bool,
    providers: Vec<Box<dyn TextProvider>>,
    mock_fallback: bool,
    max_input_chars: usize,
}

impl AiAssistService {
    pub fn new(config: &AiConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("Banyuanyar-CMS/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(config.timeout_seconds.max(1)))
            .build()?;

        let providers = config
            .providers
            .iter()
            .filter_map(|p| build_provider(&client, p))
            .collect::<Vec<_>>();
        tracing::info!(
            providers = providers.len(),
            mock_fallback = config.mock_fallback,
            "AI assist configured"
        );

        Ok(Self::with_providers(config, providers))
    }

    pub fn with_providers(config: &AiConfig, providers: Vec<Box<dyn TextProvider>>) -> Self {
        Self {
            enabled: config.enabled,
            providers,
            mock_fallback: config.mock_fallback,
            max_input_chars: config.max_input_chars,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub async fn assist(&self, request: &AssistRequest) -> Result<AssistResponse, AssistError> {
        if !self.enabled {
            return Err(AssistError::Disabled);
        }

        let text = strip_tags(&request.text);
        if text.is_empty() {
            return Err(AssistError::EmptyInput);
        }
        if text.chars().count() > self.max_input_chars {
            return Err(AssistError::InputTooLong {
                max: self.max_input_chars,
            });
        }

        let prompt = build_prompt(request.action, &text, request.context.as_deref());
        let (raw, provider) = match self.ask_providers(&prompt).await {
            Some(answer) => answer,
            None if self.mock_fallback => (MockProvider::rewrite(request.action, &text), "mock".to_string()),
            None => return Err(AssistError::Unavailable),
        };

        let answer = postprocess(&raw);
        let is_html = answer.trim_start().starts_with('<');
        let result = if request.html && request.action.produces_html() {
            // Provider markup never reaches the editor as-is
            if is_html {
                markdown_to_html(&html_to_paragraphs(&answer))
            } else {
                markdown_to_html(&answer)
            }
        } else if is_html {
            strip_tags(&answer)
        } else {
            answer
        };

        Ok(AssistResponse {
            action: request.action,
            result,
            provider,
        })
    }

    async fn ask_providers(&self, prompt: &str) -> Option<(String, String)> {
        for provider in &self.providers {
            match provider.generate(prompt).await {
                Ok(answer) if !answer.trim().is_empty() => {
                    tracing::debug!(provider = provider.name(), "AI provider answered");
                    return Some((answer, provider.name().to_string()));
                }
                Ok(_) => tracing::warn!(provider = provider.name(), "AI provider returned an empty answer"),
                Err(e) => tracing::warn!(provider = provider.name(), error = %e, "AI provider failed"),
            }
        }
        None
    }
}

fn build_provider(client: &reqwest::Client, config: &AiProviderConfig) -> Option<Box<dyn TextProvider>> {
    let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
        tracing::warn!(model = %config.model, "Skipping AI provider without API key");
        return None;
    };
    let base_url = config.base_url.as_deref();
    Some(match config.kind {
        AiProviderKind::Gemini => Box::new(GeminiProvider::new(client.clone(), &config.model, api_key, base_url)),
        AiProviderKind::OpenaiCompatible => Box::new(OpenAiCompatibleProvider::new(
            client.clone(),
            &config.model,
            api_key,
            base_url,
        )),
    })
}
