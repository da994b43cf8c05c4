//! services/categorization.rs
//! Category assignment through an ordered chain: zero-shot classification
//! (HuggingFace API, then a self-hosted endpoint), the keyword scorer, the
//! rule heuristics. When all of them come up empty the default category is used.

use anyhow::Result;
use serde_json::{Value, json};
use std::sync::Arc;
use taxonomy::{Category, ContentType, KeywordTable};

use crate::config::CoreConfig;
use crate::services::audit::Logbook;
use crate::services::remote::{InferenceEndpoint, build_client};
use crate::services::resolver::{Chain, Strategy, StrategyError, StrategyResult, resolve};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorizationRequest {
    pub content: String,
    pub content_type: Option<ContentType>,
}

impl CategorizationRequest {
    pub fn new(content: impl Into<String>, content_type: Option<ContentType>) -> Self {
        Self {
            content: content.into(),
            content_type,
        }
    }
}

/// Strategies answer with a label; only the 12 known labels are accepted.
pub fn label_acceptable(_req: &CategorizationRequest, label: &String) -> bool {
    Category::from_label(label.trim()).is_some()
}

/// Final answer of the chain. `strategy` is `None` when the default was used.
#[derive(Debug, Clone, PartialEq)]
pub struct Categorization {
    pub category: Category,
    pub strategy: Option<String>,
}

impl Categorization {
    pub fn is_default(&self) -> bool {
        self.strategy.is_none()
    }
}

// ---------------- strategies ----------------

/// `{"labels": [..], "scores": [..]}` sorted by score; take the top label.
fn parse_zero_shot(v: &Value) -> StrategyResult<String> {
    v.get("labels")
        .and_then(Value::as_array)
        .and_then(|labels| labels.first())
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(StrategyError::NoResult)
}

fn zero_shot_payload(content: &str) -> Value {
    json!({
        "inputs": content,
        "parameters": { "candidate_labels": Category::labels() }
    })
}

pub struct ZeroShotCategorize {
    name: &'static str,
    endpoint: Option<InferenceEndpoint>,
    model: String,
}

impl ZeroShotCategorize {
    pub fn huggingface(endpoint: Option<InferenceEndpoint>, model: impl Into<String>) -> Self {
        Self {
            name: "huggingface_api",
            endpoint,
            model: model.into(),
        }
    }

    pub fn local(endpoint: Option<InferenceEndpoint>, model: impl Into<String>) -> Self {
        Self {
            name: "local_model",
            endpoint,
            model: model.into(),
        }
    }
}

impl Strategy<CategorizationRequest, String> for ZeroShotCategorize {
    fn name(&self) -> &str {
        self.name
    }

    fn attempt(&self, req: &CategorizationRequest) -> StrategyResult<String> {
        let endpoint = self
            .endpoint
            .as_ref()
            .ok_or(StrategyError::NotConfigured(self.name))?;
        let v = endpoint.call(&self.model, &zero_shot_payload(&req.content))?;
        parse_zero_shot(&v)
    }
}

pub struct KeywordCategorize {
    table: Arc<KeywordTable>,
}

impl KeywordCategorize {
    pub fn new(table: Arc<KeywordTable>) -> Self {
        Self { table }
    }
}

impl Strategy<CategorizationRequest, String> for KeywordCategorize {
    fn name(&self) -> &str {
        "keywords"
    }

    fn attempt(&self, req: &CategorizationRequest) -> StrategyResult<String> {
        taxonomy::best_by_keywords(&req.content, &self.table)
            .map(|s| s.category.label().to_string())
            .ok_or(StrategyError::NoResult)
    }
}

pub struct RuleCategorize;

impl Strategy<CategorizationRequest, String> for RuleCategorize {
    fn name(&self) -> &str {
        "rules"
    }

    fn attempt(&self, req: &CategorizationRequest) -> StrategyResult<String> {
        taxonomy::categorize_by_rules(&req.content, req.content_type)
            .map(|c| c.label().to_string())
            .ok_or(StrategyError::NoResult)
    }
}

/// Keyword table from `taxonomy.keywords_path`, or the embedded copy when the
/// file is missing or does not parse.
pub fn load_keyword_table(cfg: &CoreConfig) -> Arc<KeywordTable> {
    let path = &cfg.taxonomy.keywords_path;
    let parsed = taxonomy::assets::read_or_embedded(path, taxonomy::assets::KEYWORDS_TOML_NAME)
        .map_err(|e| e.to_string())
        .and_then(|text| KeywordTable::parse(&text).map_err(|e| e.to_string()));
    match parsed {
        Ok(table) => Arc::new(table),
        Err(err) => {
            tracing::warn!(path = %path.display(), error = %err, "keyword table unusable; using embedded copy");
            Arc::new(KeywordTable::embedded().clone())
        }
    }
}

// ---------------- service ----------------

pub struct Categorizer {
    chain: Chain<CategorizationRequest, String>,
    table: Arc<KeywordTable>,
    logbook: Logbook,
}

impl Categorizer {
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
        let table = load_keyword_table(cfg);

        let chain: Chain<CategorizationRequest, String> = vec![
            Box::new(ZeroShotCategorize::huggingface(hf, remote.categorization_model.clone())),
            Box::new(ZeroShotCategorize::local(local, remote.categorization_model.clone())),
            Box::new(KeywordCategorize::new(table.clone())),
            Box::new(RuleCategorize),
        ];
        Ok(Self::with_chain(chain, table, logbook))
    }

    /// Offline chain: keyword scorer then rules.
    pub fn offline(table: Arc<KeywordTable>, logbook: Logbook) -> Self {
        let chain: Chain<CategorizationRequest, String> =
            vec![Box::new(KeywordCategorize::new(table.clone())), Box::new(RuleCategorize)];
        Self::with_chain(chain, table, logbook)
    }

    pub fn with_chain(
        chain: Chain<CategorizationRequest, String>,
        table: Arc<KeywordTable>,
        logbook: Logbook,
    ) -> Self {
        Self { chain, table, logbook }
    }

    pub fn table(&self) -> &KeywordTable {
        &self.table
    }

    pub fn categorize_detailed(&self, content: &str, content_type: Option<ContentType>) -> Categorization {
        if content.trim().is_empty() {
            return Categorization {
                category: Category::DEFAULT,
                strategy: None,
            };
        }
        let req = CategorizationRequest::new(content, content_type);
        let res = resolve("categorization", &req, &self.chain, label_acceptable);
        self.logbook
            .record_resolution("categorization", content, res.strategy.as_deref(), &res.attempts);
        match res.value.as_deref().and_then(|l| Category::from_label(l.trim())) {
            Some(category) => Categorization {
                category,
                strategy: res.strategy,
            },
            None => Categorization {
                category: Category::DEFAULT,
                strategy: None,
            },
        }
    }

    /// Always yields a category; exhausting the chain gives [`Category::DEFAULT`].
    pub fn categorize(&self, content: &str, content_type: Option<ContentType>) -> Category {
        self.categorize_detailed(content, content_type).category
    }

    pub fn batch_categorize<S: AsRef<str>>(
        &self,
        contents: &[S],
        content_types: &[Option<ContentType>],
    ) -> Vec<Category> {
        contents
            .iter()
            .enumerate()
            .map(|(i, c)| self.categorize(c.as_ref(), content_types.get(i).copied().flatten()))
            .collect()
    }

    pub fn confidence(&self, content: &str, category: Category) -> f32 {
        taxonomy::category_confidence(content, category, &self.table)
    }

    pub fn alternatives(&self, content: &str, current: Category) -> Vec<Category> {
        taxonomy::suggest_alternatives(content, current, &self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> Categorizer {
        Categorizer::offline(Arc::new(KeywordTable::embedded().clone()), Logbook::disabled())
    }

    #[test]
    fn zero_shot_response_top_label() {
        let v = json!({ "labels": ["Nature & Environment", "Wisdom & Life Lessons"], "scores": [0.8, 0.1] });
        assert_eq!(parse_zero_shot(&v).unwrap(), "Nature & Environment");
        assert!(parse_zero_shot(&json!({ "labels": [] })).is_err());
    }

    #[test]
    fn unknown_labels_are_not_accepted() {
        let req = CategorizationRequest::new("x", None);
        assert!(!label_acceptable(&req, &"Sports".to_string()));
        assert!(label_acceptable(&req, &"Humor & Wit".to_string()));
    }

    #[test]
    fn keyword_strategy_wins_before_rules() {
        let c = offline().categorize_detailed("The wise elder shared wisdom and knowledge", Some(ContentType::Proverb));
        assert_eq!(c.category, Category::Wisdom);
        assert_eq!(c.strategy.as_deref(), Some("keywords"));
    }

    #[test]
    fn rules_apply_when_keywords_find_nothing() {
        let c = offline().categorize_detailed("xyzzy plugh", Some(ContentType::ChildrensTale));
        assert_eq!(c.category, Category::ChildrensTales);
        assert_eq!(c.strategy.as_deref(), Some("rules"));
    }

    #[test]
    fn empty_content_gets_default() {
        let c = offline().categorize_detailed("   ", None);
        assert_eq!(c.category, Category::DEFAULT);
        assert!(c.is_default());
    }

    #[test]
    fn batch_pairs_content_types_by_position() {
        let out = offline().batch_categorize(
            &["xyzzy plugh", "xyzzy plugh"],
            &[Some(ContentType::ChildrensTale)],
        );
        assert_eq!(out[0], Category::ChildrensTales);
        // short content rule
        assert_eq!(out[1], Category::Wisdom);
    }
}
