use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::export::{DEFAULT_COLUMNS, Layout};

pub const DEFAULT_LANGUAGE: &str = "java";
pub const PUBLIC_SEARCH_URI: &str = "https://sonarqube.com/api/rules/search";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    pub search: SearchConfig,
    pub export: ExportConfig,
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchConfig {
    pub uri: String,
    pub language: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub columns: Vec<String>,
    pub layout: Layout,
}

impl Default for EffectiveConfig {
    fn default() -> Self {
        Self {
            search: SearchConfig {
                uri: PUBLIC_SEARCH_URI.to_string(),
                language: DEFAULT_LANGUAGE.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            export: ExportConfig {
                columns: DEFAULT_COLUMNS.iter().map(|s| s.to_string()).collect(),
                layout: Layout::Plain,
            },
            config_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    search: Option<RawSearchConfig>,
    export: Option<RawExportConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSearchConfig {
    uri: Option<String>,
    language: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExportConfig {
    columns: Option<Vec<String>>,
    layout: Option<Layout>,
}

pub fn default_config_path(home_dir: &Path) -> PathBuf {
    home_dir.join(".config/rules-extract/config.toml")
}

pub fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

pub fn load(config_path: Option<&Path>, home_dir: Option<&Path>) -> Result<EffectiveConfig> {
    load_with_env(config_path, home_dir, |key| std::env::var(key).ok())
}

pub fn load_with_env(
    config_path: Option<&Path>,
    home_dir: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<EffectiveConfig> {
    let mut cfg = EffectiveConfig::default();

    let path = match config_path {
        Some(p) => {
            if !p.exists() {
                return Err(anyhow::anyhow!(
                    "設定ファイルが見つかりません: {}",
                    p.display()
                ));
            }
            Some(p.to_path_buf())
        }
        None => home_dir.map(default_config_path).filter(|p| p.exists()),
    };

    if let Some(path) = path {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("設定ファイルの読み取りに失敗しました: {}", path.display()))?;
        let raw: RawConfig =
            toml::from_str(&s).context("設定ファイル(TOML)の解析に失敗しました")?;
        apply_raw_config(&mut cfg, raw);
        cfg.config_path = Some(path.display().to_string());
    }

    apply_env_overrides(&mut cfg, env)?;

    Ok(cfg)
}

fn apply_raw_config(cfg: &mut EffectiveConfig, raw: RawConfig) {
    if let Some(search) = raw.search {
        if let Some(uri) = search.uri {
            cfg.search.uri = uri;
        }
        if let Some(language) = search.language {
            cfg.search.language = language;
        }
        if let Some(timeout_secs) = search.timeout_secs {
            cfg.search.timeout_secs = timeout_secs;
        }
    }

    if let Some(export) = raw.export {
        if let Some(columns) = export.columns {
            if !columns.is_empty() {
                cfg.export.columns = columns;
            }
        }
        if let Some(layout) = export.layout {
            cfg.export.layout = layout;
        }
    }
}

fn apply_env_overrides(
    cfg: &mut EffectiveConfig,
    env: impl Fn(&str) -> Option<String>,
) -> Result<()> {
    if let Some(v) = env("RULES_EXTRACT_SEARCH_URI") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.search.uri = v.to_string();
        }
    }
    if let Some(v) = env("RULES_EXTRACT_LANGUAGE") {
        let v = v.trim();
        if !v.is_empty() {
            cfg.search.language = v.to_string();
        }
    }
    if let Some(v) = env("RULES_EXTRACT_TIMEOUT_SECS") {
        cfg.search.timeout_secs = v
            .trim()
            .parse::<u64>()
            .with_context(|| "RULES_EXTRACT_TIMEOUT_SECS")?;
    }
    if let Some(v) = env("RULES_EXTRACT_COLUMNS") {
        let parts = split_list(&v);
        if !parts.is_empty() {
            cfg.export.columns = parts;
        }
    }
    if let Some(v) = env("RULES_EXTRACT_LAYOUT") {
        cfg.export.layout = v
            .parse::<Layout>()
            .map_err(anyhow::Error::msg)
            .with_context(|| "RULES_EXTRACT_LAYOUT")?;
    }

    Ok(())
}

pub fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
