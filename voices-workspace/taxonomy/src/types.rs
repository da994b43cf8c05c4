use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Raised when a label or code does not name a known vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind}: {value:?}")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownLabel {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

// ----------------- Category -----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Wisdom & Life Lessons")]
    Wisdom,
    #[serde(rename = "Love & Relationships")]
    Love,
    #[serde(rename = "Family & Community")]
    Family,
    #[serde(rename = "Nature & Environment")]
    Nature,
    #[serde(rename = "Courage & Heroism")]
    Courage,
    #[serde(rename = "Morality & Ethics")]
    Morality,
    #[serde(rename = "Spirituality & Faith")]
    Spirituality,
    #[serde(rename = "Work & Perseverance")]
    Work,
    #[serde(rename = "Humor & Wit")]
    Humor,
    #[serde(rename = "Tradition & Culture")]
    Tradition,
    #[serde(rename = "Children's Tales")]
    ChildrensTales,
    #[serde(rename = "Historical Stories")]
    Historical,
}

impl Category {
    /// Enumeration order. Keyword-score ties resolve to the earliest entry.
    pub const ALL: [Category; 12] = [
        Category::Wisdom,
        Category::Love,
        Category::Family,
        Category::Nature,
        Category::Courage,
        Category::Morality,
        Category::Spirituality,
        Category::Work,
        Category::Humor,
        Category::Tradition,
        Category::ChildrensTales,
        Category::Historical,
    ];

    /// Returned when every categorization strategy comes up empty.
    pub const DEFAULT: Category = Category::Tradition;

    pub fn label(&self) -> &'static str {
        match self {
            Category::Wisdom => "Wisdom & Life Lessons",
            Category::Love => "Love & Relationships",
            Category::Family => "Family & Community",
            Category::Nature => "Nature & Environment",
            Category::Courage => "Courage & Heroism",
            Category::Morality => "Morality & Ethics",
            Category::Spirituality => "Spirituality & Faith",
            Category::Work => "Work & Perseverance",
            Category::Humor => "Humor & Wit",
            Category::Tradition => "Tradition & Culture",
            Category::ChildrensTales => "Children's Tales",
            Category::Historical => "Historical Stories",
        }
    }

    /// Exact label lookup, tolerant of surrounding whitespace and case.
    pub fn from_label(label: &str) -> Option<Category> {
        let wanted = label.trim();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
    }

    pub fn labels() -> Vec<&'static str> {
        Category::ALL.iter().map(|c| c.label()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = UnknownLabel;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::from_label(s).ok_or_else(|| UnknownLabel::new("category", s))
    }
}

// ----------------- ContentType -----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentType {
    Proverb,
    #[serde(rename = "Folk Tale")]
    FolkTale,
    Saying,
    #[serde(rename = "Short Story")]
    ShortStory,
    Poem,
    Song,
    Riddle,
    Legend,
    #[serde(rename = "Children's Tale")]
    ChildrensTale,
}

impl ContentType {
    pub const ALL: [ContentType; 9] = [
        ContentType::Proverb,
        ContentType::FolkTale,
        ContentType::Saying,
        ContentType::ShortStory,
        ContentType::Poem,
        ContentType::Song,
        ContentType::Riddle,
        ContentType::Legend,
        ContentType::ChildrensTale,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ContentType::Proverb => "Proverb",
            ContentType::FolkTale => "Folk Tale",
            ContentType::Saying => "Saying",
            ContentType::ShortStory => "Short Story",
            ContentType::Poem => "Poem",
            ContentType::Song => "Song",
            ContentType::Riddle => "Riddle",
            ContentType::Legend => "Legend",
            ContentType::ChildrensTale => "Children's Tale",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ContentType {
    type Err = UnknownLabel;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ContentType::ALL
            .iter()
            .copied()
            .find(|t| t.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLabel::new("content type", s))
    }
}

// ----------------- Language -----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Hindi,
    Bengali,
    Telugu,
    Tamil,
    Marathi,
    Gujarati,
    Kannada,
    Malayalam,
    Punjabi,
    Urdu,
    Odia,
    Assamese,
    Nepali,
    Sinhala,
}

impl Language {
    pub const ALL: [Language; 15] = [
        Language::English,
        Language::Hindi,
        Language::Bengali,
        Language::Telugu,
        Language::Tamil,
        Language::Marathi,
        Language::Gujarati,
        Language::Kannada,
        Language::Malayalam,
        Language::Punjabi,
        Language::Urdu,
        Language::Odia,
        Language::Assamese,
        Language::Nepali,
        Language::Sinhala,
    ];

    /// ISO 639-1 code.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Bengali => "bn",
            Language::Telugu => "te",
            Language::Tamil => "ta",
            Language::Marathi => "mr",
            Language::Gujarati => "gu",
            Language::Kannada => "kn",
            Language::Malayalam => "ml",
            Language::Punjabi => "pa",
            Language::Urdu => "ur",
            Language::Odia => "or",
            Language::Assamese => "as",
            Language::Nepali => "ne",
            Language::Sinhala => "si",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "Hindi",
            Language::Bengali => "Bengali",
            Language::Telugu => "Telugu",
            Language::Tamil => "Tamil",
            Language::Marathi => "Marathi",
            Language::Gujarati => "Gujarati",
            Language::Kannada => "Kannada",
            Language::Malayalam => "Malayalam",
            Language::Punjabi => "Punjabi",
            Language::Urdu => "Urdu",
            Language::Odia => "Odia",
            Language::Assamese => "Assamese",
            Language::Nepali => "Nepali",
            Language::Sinhala => "Sinhala",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        let wanted = code.trim();
        Language::ALL
            .iter()
            .copied()
            .find(|l| l.code().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = UnknownLabel;
    /// Accepts either the ISO code ("hi") or the display name ("Hindi").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(lang) = Language::from_code(s) {
            return Ok(lang);
        }
        let wanted = s.trim();
        Language::ALL
            .iter()
            .copied()
            .find(|l| l.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownLabel::new("language", s))
    }
}
