//! services/translation.rs
//! Translation into English through an ordered chain of remote services.
//!
//! Chain order: HuggingFace Inference API → self-hosted endpoint → Google
//! free endpoint → MyMemory. A result is accepted when it is non-empty and
//! differs (case-insensitively) from the input.

use anyhow::Result;
use reqwest::blocking::Client;
use serde_json::{Value, json};

use crate::config::CoreConfig;
use crate::services::audit::Logbook;
use crate::services::remote::{InferenceEndpoint, build_client, decode};
use crate::services::resolver::{Chain, Resolution, Strategy, StrategyError, StrategyResult, resolve};

/// Source-language marker meaning "let the service detect it".
pub const AUTO: &str = "auto";

/// Source languages with a dedicated `Helsinki-NLP/opus-mt-{src}-en` model.
const PAIR_MODEL_SOURCES: &[&str] = &[
    "hi", "bn", "te", "ta", "mr", "gu", "kn", "ml", "pa", "ur", "ne", "si", "zh", "ja", "ko",
    "ar", "fa", "tr", "ru", "de", "fr", "es", "pt", "it", "nl", "sv", "no", "da", "fi", "pl",
    "cs", "hu", "ro", "bg", "hr", "sr", "sk", "sl", "et", "lv", "lt",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    pub source: String,
    pub target: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Accept only non-empty output that is not just the input echoed back.
pub fn translation_acceptable(req: &TranslationRequest, out: &String) -> bool {
    let out = out.trim();
    !out.is_empty() && out.to_lowercase() != req.text.trim().to_lowercase()
}

// ---------------- strategies ----------------

/// Model id for a language pair; unknown pairs use the multilingual model.
pub fn pair_model(source: &str, target: &str, fallback: &str) -> String {
    if target == "en" && PAIR_MODEL_SOURCES.contains(&source) {
        format!("Helsinki-NLP/opus-mt-{source}-en")
    } else {
        fallback.to_string()
    }
}

/// `[{"translation_text": "..."}]`
fn parse_translation_text(v: &Value) -> StrategyResult<String> {
    let first = v
        .as_array()
        .and_then(|items| items.first())
        .ok_or(StrategyError::NoResult)?;
    first
        .get("translation_text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| StrategyError::Decode("missing translation_text".into()))
}

pub struct HuggingFaceTranslate {
    endpoint: Option<InferenceEndpoint>,
    fallback_model: String,
}

impl HuggingFaceTranslate {
    pub fn new(endpoint: Option<InferenceEndpoint>, fallback_model: impl Into<String>) -> Self {
        Self {
            endpoint,
            fallback_model: fallback_model.into(),
        }
    }
}

impl Strategy<TranslationRequest, String> for HuggingFaceTranslate {
    fn name(&self) -> &str {
        "huggingface_api"
    }

    fn attempt(&self, req: &TranslationRequest) -> StrategyResult<String> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or(StrategyError::NotConfigured("huggingface api key"))?;
        let model = pair_model(&req.source, &req.target, &self.fallback_model);
        let v = endpoint.call(&model, &json!({ "inputs": req.text }))?;
        parse_translation_text(&v)
    }
}

/// Self-hosted model server speaking the same request shape.
pub struct LocalTranslate {
    endpoint: Option<InferenceEndpoint>,
    model: String,
}

impl LocalTranslate {
    pub fn new(endpoint: Option<InferenceEndpoint>, model: impl Into<String>) -> Self {
        Self {
            endpoint,
            model: model.into(),
        }
    }
}

impl Strategy<TranslationRequest, String> for LocalTranslate {
    fn name(&self) -> &str {
        "local_model"
    }

    fn attempt(&self, req: &TranslationRequest) -> StrategyResult<String> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or(StrategyError::NotConfigured("local endpoint"))?;
        let v = endpoint.call(
            &self.model,
            &json!({ "inputs": req.text, "parameters": { "max_length": 512 } }),
        )?;
        parse_translation_text(&v)
    }
}

/// `[[["translated","original",..],..],..]`: concatenate the first element of each segment.
fn parse_google(v: &Value) -> StrategyResult<String> {
    let segments = v
        .get(0)
        .and_then(Value::as_array)
        .ok_or_else(|| StrategyError::Decode("expected segment array".into()))?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();
    if text.is_empty() {
        return Err(StrategyError::NoResult);
    }
    Ok(text)
}

pub struct GoogleTranslate {
    client: Option<Client>,
    url: String,
}

impl GoogleTranslate {
    pub fn new(client: Option<Client>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Strategy<TranslationRequest, String> for GoogleTranslate {
    fn name(&self) -> &str {
        "google"
    }

    fn attempt(&self, req: &TranslationRequest) -> StrategyResult<String> {
        let client = self
            .client
            .as_ref()
            .ok_or(StrategyError::NotConfigured("google disabled"))?;
        let resp = client
            .get(&self.url)
            .query(&[
                ("client", "gtx"),
                ("sl", req.source.as_str()),
                ("tl", req.target.as_str()),
                ("dt", "t"),
                ("q", req.text.as_str()),
            ])
            .send()?;
        let v: Value = decode(resp)?;
        parse_google(&v)
    }
}

/// `{"responseData": {"translatedText": "..."}}`
fn parse_mymemory(v: &Value) -> StrategyResult<String> {
    v.pointer("/responseData/translatedText")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StrategyError::NoResult)
}

pub struct MyMemoryTranslate {
    client: Option<Client>,
    url: String,
}

impl MyMemoryTranslate {
    pub fn new(client: Option<Client>, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

impl Strategy<TranslationRequest, String> for MyMemoryTranslate {
    fn name(&self) -> &str {
        "mymemory"
    }

    fn attempt(&self, req: &TranslationRequest) -> StrategyResult<String> {
        if req.source == AUTO {
            return Err(StrategyError::Unsupported("mymemory needs an explicit source language".into()));
        }
        let client = self
            .client
            .as_ref()
            .ok_or(StrategyError::NotConfigured("mymemory disabled"))?;
        let langpair = format!("{}|{}", req.source, req.target);
        let resp = client
            .get(&self.url)
            .query(&[("q", req.text.as_str()), ("langpair", langpair.as_str())])
            .send()?;
        let v: Value = decode(resp)?;
        parse_mymemory(&v)
    }
}

// ---------------- service ----------------

pub struct Translator {
    chain: Chain<TranslationRequest, String>,
    logbook: Logbook,
}

impl Translator {
    /// The four-stage remote chain built from `[remote]`.
    pub fn from_config(cfg: &CoreConfig, logbook: Logbook) -> Result<Self> {
        let remote = &cfg.remote;
        let client = build_client(remote)?;
        let hf = remote
            .huggingface_api_key
            .clone()
            .map(|key| InferenceEndpoint::new(client.clone(), remote.huggingface_url.clone(), Some(key)));
        let local = remote
            .local_endpoint
            .clone()
            .map(|url| InferenceEndpoint::new(client.clone(), url, None));

        let chain: Chain<TranslationRequest, String> = vec![
            Box::new(HuggingFaceTranslate::new(hf, remote.translation_model.clone())),
            Box::new(LocalTranslate::new(local, remote.translation_model.clone())),
            Box::new(GoogleTranslate::new(
                remote.google_enabled.then(|| client.clone()),
                remote.google_url.clone(),
            )),
            Box::new(MyMemoryTranslate::new(
                remote.mymemory_enabled.then(|| client.clone()),
                remote.mymemory_url.clone(),
            )),
        ];
        Ok(Self::with_chain(chain, logbook))
    }

    pub fn with_chain(chain: Chain<TranslationRequest, String>, logbook: Logbook) -> Self {
        Self { chain, logbook }
    }

    pub fn strategy_names(&self) -> Vec<&str> {
        self.chain.iter().map(|s| s.name()).collect()
    }

    /// Full resolution with the per-strategy trace.
    pub fn translate_detailed(&self, req: &TranslationRequest) -> Resolution<String> {
        if req.text.trim().is_empty() {
            return Resolution {
                value: None,
                strategy: None,
                attempts: Vec::new(),
            };
        }
        let res = resolve("translation", req, &self.chain, translation_acceptable);
        self.logbook
            .record_resolution("translation", &req.text, res.strategy.as_deref(), &res.attempts);
        res
    }

    /// Translated text, or `None` when the input is empty or every service failed.
    pub fn translate(&self, text: &str, source: &str, target: &str) -> Option<String> {
        let req = TranslationRequest::new(text, source, target);
        self.translate_detailed(&req).value.map(|s| s.trim().to_string())
    }

    /// Translate each text; failed items keep their original text.
    pub fn batch_translate<S: AsRef<str>>(&self, texts: &[S], source: &str, target: &str) -> Vec<String> {
        texts
            .iter()
            .map(|t| {
                let t = t.as_ref();
                self.translate(t, source, target).unwrap_or_else(|| t.to_string())
            })
            .collect()
    }
}

// ---------------- quality heuristics ----------------

/// Heuristic confidence in `[0, 1]` for a translation.
pub fn translation_confidence(original: &str, translated: &str) -> f32 {
    if original.is_empty() || translated.is_empty() {
        return 0.0;
    }
    let mut confidence = 1.0_f32;
    if original.to_lowercase() == translated.to_lowercase() {
        confidence *= 0.3;
    }
    let translated_len = translated.chars().count() as f32;
    let length_ratio = translated_len / original.chars().count() as f32;
    if !(0.3..=3.0).contains(&length_ratio) {
        confidence *= 0.5;
    }
    let alpha = translated.chars().filter(|c| c.is_alphabetic()).count() as f32;
    if alpha / translated_len < 0.5 {
        confidence *= 0.7;
    }
    confidence.min(1.0)
}

pub fn suggest_improvements(original: &str, translated: &str) -> Vec<String> {
    let mut out = Vec::new();
    if translated.trim().is_empty() {
        out.push("Translation appears to be empty. Try a different translation service.".to_string());
    }
    if original.to_lowercase() == translated.to_lowercase() {
        out.push("Translation is identical to original. Check if the source language is correct.".to_string());
    }
    if translation_confidence(original, translated) < 0.5 {
        out.push("Translation confidence is low. Consider manual review or alternative translation.".to_string());
    }
    let original_words = original.split_whitespace().count() as f32;
    let translated_words = translated.split_whitespace().count() as f32;
    if translated_words < original_words * 0.3 {
        out.push("Translation seems too short. Some meaning might be lost.".to_string());
    }
    if translated_words > original_words * 3.0 {
        out.push("Translation seems too long. It might be overly verbose.".to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_model_prefers_dedicated_model() {
        assert_eq!(pair_model("hi", "en", "Helsinki-NLP/opus-mt-mul-en"), "Helsinki-NLP/opus-mt-hi-en");
        assert_eq!(pair_model("as", "en", "Helsinki-NLP/opus-mt-mul-en"), "Helsinki-NLP/opus-mt-mul-en");
        assert_eq!(pair_model("auto", "en", "fallback"), "fallback");
    }

    #[test]
    fn acceptance_rejects_echo_and_blank() {
        let req = TranslationRequest::new("Namaste", "hi", "en");
        assert!(!translation_acceptable(&req, &"  ".to_string()));
        assert!(!translation_acceptable(&req, &"NAMASTE".to_string()));
        assert!(translation_acceptable(&req, &"Greetings".to_string()));
    }

    #[test]
    fn parses_service_payloads() {
        let hf = json!([{ "translation_text": "Hello" }]);
        assert_eq!(parse_translation_text(&hf).unwrap(), "Hello");
        assert!(matches!(parse_translation_text(&json!([])), Err(StrategyError::NoResult)));

        let google = json!([[["Slow and ", "dheere", null], ["steady", "dheere", null]], null, "hi"]);
        assert_eq!(parse_google(&google).unwrap(), "Slow and steady");

        let mm = json!({ "responseData": { "translatedText": "Water is life" }, "responseStatus": 200 });
        assert_eq!(parse_mymemory(&mm).unwrap(), "Water is life");
    }

    #[test]
    fn default_chain_order() {
        let t = Translator::from_config(&CoreConfig::default(), Logbook::disabled()).unwrap();
        assert_eq!(t.strategy_names(), vec!["huggingface_api", "local_model", "google", "mymemory"]);
    }

    #[test]
    fn mymemory_declines_auto_source_without_network() {
        let s = MyMemoryTranslate::new(None, "http://unused");
        let err = s.attempt(&TranslationRequest::new("x", AUTO, "en")).unwrap_err();
        assert!(matches!(err, StrategyError::Unsupported(_)));
    }

    #[test]
    fn unconfigured_remote_strategies_are_unavailable() {
        let req = TranslationRequest::new("x", "hi", "en");
        assert!(matches!(
            HuggingFaceTranslate::new(None, "m").attempt(&req),
            Err(StrategyError::NotConfigured(_))
        ));
        assert!(matches!(
            LocalTranslate::new(None, "m").attempt(&req),
            Err(StrategyError::NotConfigured(_))
        ));
    }

    #[test]
    fn confidence_penalties_compound() {
        assert_eq!(translation_confidence("", "x"), 0.0);
        assert!((translation_confidence("hello there", "hello there") - 0.3).abs() < 1e-6);
        assert!((translation_confidence("a long sentence here", "ok") - 0.5).abs() < 1e-6);
        assert!((translation_confidence("1234 5678", "12 34 56 7") - 0.7).abs() < 1e-6);
        assert!((translation_confidence("pani", "water") - 1.0).abs() < 1e-6);
    }

    #[test]
    fn improvements_flag_identical_translation() {
        let tips = suggest_improvements("Same words", "same words");
        assert!(tips.iter().any(|t| t.contains("identical")));
        assert!(tips.iter().any(|t| t.contains("confidence is low")));
        assert!(suggest_improvements("pani", "water").is_empty());
    }
}
