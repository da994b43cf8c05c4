// voices-core/src/commands/init.rs

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::CoreConfig;

#[derive(Debug, Clone)]
pub struct InitReport {
    pub root: PathBuf,
    pub created: Vec<String>,
    pub existed: Vec<String>,
    pub config: CoreConfig,
}

/// Resolve the data root. `VOICES_ROOT` overrides the default `.voices`.
pub fn voices_root() -> PathBuf {
    std::env::var_os("VOICES_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".voices"))
}

/// Initialize under [`voices_root`]. Idempotent.
pub fn ensure_initialized() -> Result<InitReport> {
    ensure_initialized_at(&voices_root())
}

/// Lay out `root` (directories, default config, keyword tables, logbook files)
/// and load the resulting config. Existing files are left untouched.
pub fn ensure_initialized_at(root: &Path) -> Result<InitReport> {
    let root = root.to_path_buf();
    let mut created = Vec::new();
    let mut existed = Vec::new();

    ensure_dir(&root, "", &mut created, &mut existed)?;
    ensure_dir(&root, "data", &mut created, &mut existed)?;
    ensure_dir(&root, "taxonomy", &mut created, &mut existed)?;

    ensure_file(
        &root,
        "config.toml",
        Some(DEFAULT_CONFIG_TOML),
        &mut created,
        &mut existed,
    )?;

    let config = CoreConfig::load(&root)?;

    for name in taxonomy::write_default_assets(root.join("taxonomy"))
        .context("seeding keyword tables")?
    {
        created.push(format!("taxonomy/{name}"));
    }

    initialize_logbook_files(&config, &mut created, &mut existed)?;

    tracing::debug!(root = %root.display(), created = created.len(), "voices root ready");
    Ok(InitReport {
        root,
        created,
        existed,
        config,
    })
}

fn ensure_dir(
    base: &Path,
    rel: &str,
    created: &mut Vec<String>,
    existed: &mut Vec<String>,
) -> Result<()> {
    let p = if rel.is_empty() { base.to_path_buf() } else { base.join(rel) };
    let label = if rel.is_empty() { ".".to_string() } else { rel.to_string() };
    if p.exists() {
        existed.push(label);
        return Ok(());
    }
    fs::create_dir_all(&p).with_context(|| format!("create_dir_all({:?})", p))?;
    created.push(label);
    Ok(())
}

fn ensure_file(
    base: &Path,
    rel_file: &str,
    content_if_absent: Option<&str>,
    created: &mut Vec<String>,
    existed: &mut Vec<String>,
) -> Result<()> {
    let p = base.join(rel_file);
    if p.exists() {
        existed.push(rel_file.to_string());
        return Ok(());
    }
    write_atomic(&p, content_if_absent.unwrap_or("").as_bytes())?;
    created.push(rel_file.to_string());
    Ok(())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create_dir_all({:?})", parent))?;
    }
    let tmp = path.with_extension("tmp");
    {
        let mut f = OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&tmp)
            .with_context(|| format!("open temp file {:?}", tmp))?;
        f.write_all(bytes)?;
        f.flush()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
    Ok(())
}

fn ensure_seeded_jsonl(
    path: &Path,
    init_line: &str,
    created: &mut Vec<String>,
    existed: &mut Vec<String>,
) -> Result<()> {
    let label = path.display().to_string();
    if !path.exists() {
        write_atomic(path, format!("{init_line}\n").as_bytes())?;
        created.push(label);
        return Ok(());
    }
    existed.push(label);
    if fs::metadata(path)?.len() == 0 {
        let mut f = OpenOptions::new().append(true).open(path)?;
        f.write_all(init_line.as_bytes())?;
        f.write_all(b"\n")?;
    }
    Ok(())
}

fn initialize_logbook_files(
    config: &CoreConfig,
    created: &mut Vec<String>,
    existed: &mut Vec<String>,
) -> Result<()> {
    if !config.services.audit_enabled {
        return Ok(());
    }
    let init_event = serde_json::json!({
        "timestamp": Utc::now().to_rfc3339(),
        "event": "system_init",
        "agent": "system",
        "details": { "name": config.system.name, "version": config.system.version },
    })
    .to_string();

    fs::create_dir_all(&config.logbook.dir)
        .with_context(|| format!("create_dir_all({:?})", config.logbook.dir))?;
    // resolutions.jsonl holds only ResolutionRecord lines; the logbook creates it on first write.
    ensure_seeded_jsonl(&config.logbook.actions_path(), &init_event, created, existed)?;
    Ok(())
}

// ---------- defaults ----------

pub(crate) const DEFAULT_CONFIG_TOML: &str = r#"[system]
name = "Bharat Voices"
version = "1.0.0"

[store]
db_path = "data/voices.db"

[logbook]
dir = "logbook"
actions = "actions.jsonl"
resolutions = "resolutions.jsonl"
preview_len = 120

[services]
translation_enabled = true
categorization_enabled = true
audit_enabled = true

[remote]
# huggingface_api_key = "hf_..."   (or HUGGINGFACE_API_KEY)
# local_endpoint = "http://localhost:8000"   (or VOICES_LOCAL_ENDPOINT)
huggingface_url = "https://api-inference.huggingface.co/models/"
translation_model = "Helsinki-NLP/opus-mt-mul-en"
categorization_model = "facebook/bart-large-mnli"
google_enabled = true
mymemory_enabled = true
timeout_secs = 30

[taxonomy]
keywords_path = "taxonomy/keywords.toml"

[content]
max_title_len = 100
max_text_len = 5000
max_audio_secs = 300.0

[gamification]
collection_target = 1000
daily_target = 10
leaderboard_size = 100
# Badge definitions default to the built-in set. Overriding replaces the whole list:
# [[gamification.badges]]
# key = "first_story"
# name = "First Steps"
# description = "Submitted your first story"
# icon = "🌱"
# requirement = { kind = "submissions", count = 1 }
"#;
