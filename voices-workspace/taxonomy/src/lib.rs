// Public modules so voices-core can use them
pub mod assets;
pub mod confidence;
pub mod evaluator;
pub mod normalize;
pub mod rules;
pub mod table;
pub mod types;

pub use assets::{default_asset_text, write_default_assets};
pub use confidence::{category_confidence, label_confidence, suggest_alternatives};
pub use evaluator::{best_by_keywords, score_categories, CategoryScore};
pub use rules::categorize_by_rules;
pub use table::{KeywordTable, TableError};
pub use types::{Category, ContentType, Language, UnknownLabel};
pub use normalize::fold as normalize_for_search;
