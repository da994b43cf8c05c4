// tests/resolver_tests.rs
// Fallback chains: short-circuit, exhaustion defaults, attempt traces.

use std::rc::Rc;
use std::cell::Cell;
use std::sync::Arc;

use taxonomy::KeywordTable;
use voices_core::services::audit::Logbook;
use voices_core::services::categorization::{CategorizationRequest, Categorizer, KeywordCategorize, RuleCategorize};
use voices_core::services::resolver::{Chain, Outcome, Strategy, StrategyError, StrategyResult, resolve};
use voices_core::services::translation::{TranslationRequest, Translator, translation_acceptable};
use voices_core::{Category, ContentType};

/// Answers with a fixed value (or fails) and counts how often it was asked.
struct Counting<T: Clone> {
    name: &'static str,
    answer: Option<T>,
    calls: Rc<Cell<usize>>,
}

impl<T: Clone> Counting<T> {
    fn new(name: &'static str, answer: Option<T>) -> (Self, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (
            Self {
                name,
                answer,
                calls: calls.clone(),
            },
            calls,
        )
    }
}

impl<I: ?Sized, T: Clone> Strategy<I, T> for Counting<T> {
    fn name(&self) -> &str {
        self.name
    }
    fn attempt(&self, _input: &I) -> StrategyResult<T> {
        self.calls.set(self.calls.get() + 1);
        self.answer.clone().ok_or(StrategyError::NotConfigured("test"))
    }
}

fn req(text: &str) -> TranslationRequest {
    TranslationRequest::new(text, "hi", "en")
}

#[test]
fn test_first_acceptable_result_short_circuits() {
    let (a, a_calls) = Counting::new("a", None);
    let (b, b_calls) = Counting::new("b", Some("Water is life".to_string()));
    let (c, c_calls) = Counting::new("c", Some("never used".to_string()));
    let chain: Chain<TranslationRequest, String> = vec![Box::new(a), Box::new(b), Box::new(c)];

    let res = resolve("translation", &req("Jal hi jeevan hai"), &chain, translation_acceptable);

    assert_eq!(res.value.as_deref(), Some("Water is life"));
    assert_eq!(res.strategy.as_deref(), Some("b"));
    assert_eq!(a_calls.get(), 1);
    assert_eq!(b_calls.get(), 1);
    assert_eq!(c_calls.get(), 0, "strategies after the winner must not run");
    assert_eq!(res.attempts.len(), 2);
}

#[test]
fn test_echoed_translation_is_rejected_and_chain_continues() {
    let (a, _) = Counting::new("echo", Some("jal hi jeevan hai".to_string()));
    let (b, b_calls) = Counting::new("real", Some("Water is life".to_string()));
    let chain: Chain<TranslationRequest, String> = vec![Box::new(a), Box::new(b)];

    let res = resolve("translation", &req("Jal hi jeevan hai"), &chain, translation_acceptable);
    assert_eq!(res.strategy.as_deref(), Some("real"));
    assert_eq!(res.attempts[0].outcome, Outcome::Rejected);
    assert_eq!(b_calls.get(), 1);
}

#[test]
fn test_translation_is_none_when_every_strategy_fails() {
    let (a, a_calls) = Counting::<String>::new("a", None);
    let (b, b_calls) = Counting::new("b", Some("   ".to_string()));
    let translator = Translator::with_chain(vec![Box::new(a), Box::new(b)], Logbook::disabled());

    assert_eq!(translator.translate("Jal hi jeevan hai", "hi", "en"), None);
    assert_eq!(a_calls.get(), 1);
    assert_eq!(b_calls.get(), 1);
}

#[test]
fn test_empty_text_never_reaches_strategies() {
    let (a, a_calls) = Counting::new("a", Some("x".to_string()));
    let translator = Translator::with_chain(vec![Box::new(a)], Logbook::disabled());
    assert_eq!(translator.translate("  ", "hi", "en"), None);
    assert_eq!(a_calls.get(), 0);
}

#[test]
fn test_batch_translate_keeps_original_on_failure() {
    let (a, _) = Counting::<String>::new("a", None);
    let translator = Translator::with_chain(vec![Box::new(a)], Logbook::disabled());
    let out = translator.batch_translate(&["ek", "do"], "hi", "en");
    assert_eq!(out, vec!["ek".to_string(), "do".to_string()]);
}

#[test]
fn test_categorization_defaults_when_exhausted() {
    let (remote, remote_calls) = Counting::<String>::new("remote", None);
    let (bogus, _) = Counting::new("bogus", Some("Sports & Games".to_string()));
    let chain: Chain<CategorizationRequest, String> = vec![Box::new(remote), Box::new(bogus)];
    let table = Arc::new(KeywordTable::embedded().clone());
    let categorizer = Categorizer::with_chain(chain, table, Logbook::disabled());

    let c = categorizer.categorize_detailed("xyzzy plugh", None);
    assert_eq!(c.category, Category::DEFAULT);
    assert_eq!(c.category, Category::Tradition);
    assert!(c.is_default());
    assert_eq!(remote_calls.get(), 1);

    assert_eq!(categorizer.categorize("", None), Category::Tradition);
}

#[test]
fn test_offline_chain_defaults_on_long_unmatched_content() {
    // 22 words: too long for the short-saying rule, and nothing matches a keyword or pattern.
    let content = vec!["xyzzy plugh"; 11].join(" ");
    let categorizer = Categorizer::offline(Arc::new(KeywordTable::embedded().clone()), Logbook::disabled());

    let c = categorizer.categorize_detailed(&content, Some(ContentType::ShortStory));
    assert_eq!(c.category, Category::Tradition);
    assert!(c.is_default());
    assert_eq!(categorizer.categorize(&content, None), Category::Tradition);
}

#[test]
fn test_remote_label_wins_before_keywords() {
    let (remote, _) = Counting::new("remote", Some("Humor & Wit".to_string()));
    let table = Arc::new(KeywordTable::embedded().clone());
    let chain: Chain<CategorizationRequest, String> = vec![
        Box::new(remote),
        Box::new(KeywordCategorize::new(table.clone())),
        Box::new(RuleCategorize),
    ];
    let categorizer = Categorizer::with_chain(chain, table, Logbook::disabled());
    let c = categorizer.categorize_detailed("The wise man learns from mistakes", Some(ContentType::Proverb));
    assert_eq!(c.category, Category::Humor);
    assert_eq!(c.strategy.as_deref(), Some("remote"));
}

#[test]
fn test_keyword_categorizer_on_wisdom_sentence() {
    let categorizer = Categorizer::offline(Arc::new(KeywordTable::embedded().clone()), Logbook::disabled());
    let got = categorizer.categorize(
        "The wise man learns from mistakes, wisdom guides the fool",
        Some(ContentType::Proverb),
    );
    assert_eq!(got, Category::Wisdom);
    assert_eq!(got.label(), "Wisdom & Life Lessons");
}

#[test]
fn test_resolutions_are_written_to_the_logbook() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = voices_core::CoreConfig::default();
    cfg.logbook.dir = dir.path().join("logbook");
    let logbook = Logbook::from_config(&cfg);

    let (a, _) = Counting::<String>::new("a", None);
    let (b, _) = Counting::new("b", Some("Water is life".to_string()));
    let translator = Translator::with_chain(vec![Box::new(a), Box::new(b)], logbook.clone());
    translator.translate("Jal hi jeevan hai", "hi", "en");

    let text = std::fs::read_to_string(logbook.resolutions_path()).unwrap();
    let line: serde_json::Value = serde_json::from_str(text.lines().last().unwrap()).unwrap();
    assert_eq!(line["task"], "translation");
    assert_eq!(line["winner"], "b");
    assert_eq!(line["attempts"].as_array().unwrap().len(), 2);
    assert_eq!(line["attempts"][0]["outcome"], "unavailable");
}
