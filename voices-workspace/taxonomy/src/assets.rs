use anyhow::{Context, Result};
use std::{
    borrow::Cow,
    fs,
    path::Path,
};

/// === Embedded keyword tables ===
pub const KEYWORDS_TOML_NAME: &str = "keywords.toml";
pub const KEYWORDS_TOML: &str = include_str!("../assets/keywords.toml");

/// Return the embedded text for a known asset, if any.
pub fn default_asset_text(name: &str) -> Option<&'static str> {
    match name {
        KEYWORDS_TOML_NAME => Some(KEYWORDS_TOML),
        _ => None,
    }
}

/// Seed missing default assets into a destination directory (idempotent).
/// Returns the file names that were created.
pub fn write_default_assets(dir: impl AsRef<Path>) -> Result<Vec<String>> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).with_context(|| format!("create_dir_all({:?})", dir))?;

    let mut created = Vec::new();
    for (name, text) in [(KEYWORDS_TOML_NAME, KEYWORDS_TOML)] {
        let path = dir.join(name);
        if !path.exists() {
            fs::write(&path, text).with_context(|| format!("write {:?}", path))?;
            created.push(name.to_string());
        }
    }
    Ok(created)
}

/// Read an asset from disk, falling back to the embedded copy.
///
/// - `path` exists → its contents (local edits are honored).
/// - `path` missing and `name` has an embedded copy → the embedded text.
/// - neither → empty string.
pub fn read_or_embedded(path: &Path, name: &str) -> Result<Cow<'static, str>> {
    if path.exists() {
        let text = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
        return Ok(Cow::Owned(text));
    }
    Ok(default_asset_text(name)
        .map(Cow::Borrowed)
        .unwrap_or(Cow::Owned(String::new())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_embedded() {
        let dir = std::env::temp_dir().join("taxonomy_assets_missing_probe");
        let text = read_or_embedded(&dir.join("nope.toml"), KEYWORDS_TOML_NAME).unwrap();
        assert!(text.contains("Wisdom & Life Lessons"));
    }

    #[test]
    fn unknown_asset_has_no_embedded_copy() {
        assert!(default_asset_text("other.toml").is_none());
    }
}
