//! Synonym tables — data-driven lemma mapping for the tokenizer
//!
//! A table maps `language code → surface form → canonical lemma`, separately
//! for actions and entities, plus a per-language stopword set. Tables are
//! plain data: the built-in rows below, or JSON loaded at startup and merged
//! on top. Adding a language never touches tokenizer control flow.
//!
//! All maps are ordered (`BTreeMap`/`BTreeSet`) so lookup fallback order and
//! serialization are deterministic.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::tokenizer::is_cjk;
use crate::{Error, Result};

// ── Built-in rows ─────────────────────────────────────────

/// (language, canonical, surfaces)
type Row = (&'static str, &'static str, &'static [&'static str]);

const BUILTIN_ACTIONS: &[Row] = &[
    ("en", "create", &["create", "add", "new", "insert", "make"]),
    ("zh", "create", &["創建", "创建", "建立", "新增", "添加", "新建"]),
    ("en", "read", &["read", "get", "fetch", "view", "show", "query", "list"]),
    ("zh", "read", &["讀取", "读取", "查詢", "查询", "查看", "獲取", "获取"]),
    ("en", "update", &["update", "modify", "change", "edit", "set"]),
    ("zh", "update", &["更新", "修改", "變更", "变更", "編輯", "编辑"]),
    ("en", "delete", &["delete", "remove", "drop", "destroy", "erase"]),
    ("zh", "delete", &["刪除", "删除", "移除"]),
    ("en", "validate", &["validate", "verify", "check"]),
    ("zh", "validate", &["驗證", "验证", "校驗", "校验", "檢查", "检查"]),
    ("en", "approve", &["approve", "accept", "allow"]),
    ("zh", "approve", &["批准", "核准", "同意"]),
    ("en", "reject", &["reject", "deny", "refuse"]),
    ("zh", "reject", &["拒絕", "拒绝", "駁回", "驳回"]),
    ("en", "deploy", &["deploy", "release", "publish"]),
    ("zh", "deploy", &["部署", "發布", "发布"]),
    ("en", "enforce", &["enforce", "require", "mandate"]),
    ("zh", "enforce", &["執行", "执行", "強制", "强制"]),
];

const BUILTIN_ENTITIES: &[Row] = &[
    ("en", "user", &["user", "users", "account", "accounts"]),
    ("zh", "user", &["用戶", "用户", "使用者", "帳戶", "账户"]),
    ("en", "role", &["role", "roles"]),
    ("zh", "role", &["角色"]),
    ("en", "permission", &["permission", "permissions", "access"]),
    ("zh", "permission", &["權限", "权限"]),
    ("en", "policy", &["policy", "policies", "rule", "rules"]),
    ("zh", "policy", &["策略", "政策", "規則", "规则"]),
    ("en", "file", &["file", "files", "document", "documents"]),
    ("zh", "file", &["文件", "檔案", "档案"]),
    ("en", "config", &["config", "configuration", "settings"]),
    ("zh", "config", &["配置", "設定", "设定"]),
    ("en", "service", &["service", "services"]),
    ("zh", "service", &["服務", "服务"]),
    ("en", "resource", &["resource", "resources"]),
    ("zh", "resource", &["資源", "资源"]),
    ("en", "record", &["record", "records", "entry", "entries"]),
    ("zh", "record", &["記錄", "记录"]),
];

const BUILTIN_STOPWORDS: &[(&str, &[&str])] = &[
    ("en", &["a", "an", "the"]),
    ("zh", &["的", "一個", "一个"]),
];

// ── Types ─────────────────────────────────────────────────

/// Synonyms and stopwords for one language
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageTable {
    /// surface → canonical action lemma
    #[serde(default)]
    pub actions: BTreeMap<String, String>,
    /// surface → canonical entity lemma
    #[serde(default)]
    pub entities: BTreeMap<String, String>,
    /// surfaces dropped during tokenization
    #[serde(default)]
    pub stopwords: BTreeSet<String>,
}

/// Language-keyed synonym configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymTable {
    pub languages: BTreeMap<String, LanguageTable>,
}

impl SynonymTable {
    /// The built-in English and Chinese tables
    pub fn builtin() -> Self {
        let mut table = SynonymTable::default();
        for (lang, canonical, surfaces) in BUILTIN_ACTIONS {
            let entry = table.languages.entry(lang.to_string()).or_default();
            for surface in *surfaces {
                entry.actions.insert(surface.to_string(), canonical.to_string());
            }
        }
        for (lang, canonical, surfaces) in BUILTIN_ENTITIES {
            let entry = table.languages.entry(lang.to_string()).or_default();
            for surface in *surfaces {
                entry.entities.insert(surface.to_string(), canonical.to_string());
            }
        }
        for (lang, words) in BUILTIN_STOPWORDS {
            let entry = table.languages.entry(lang.to_string()).or_default();
            entry.stopwords.extend(words.iter().map(|w| w.to_string()));
        }
        table
    }

    /// Parse a table from JSON of the shape produced by [`SynonymTable::to_json`]
    ///
    /// Surfaces and lemmas are trimmed and lower-cased so they match the
    /// tokenizer's normalized words.
    ///
    /// # Errors
    /// `ConfigError` for malformed JSON or empty surfaces/lemmas.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: SynonymTable = serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("invalid synonym table: {}", e)))?;

        let mut table = SynonymTable::default();
        for (code, lang) in raw.languages {
            let code = code.trim().to_lowercase();
            if code.is_empty() {
                return Err(Error::ConfigError("empty language code".into()));
            }
            let entry = table.languages.entry(code.clone()).or_default();
            for (surface, canonical) in lang.actions {
                let (s, c) = normalize_pair(&code, &surface, &canonical)?;
                entry.actions.insert(s, c);
            }
            for (surface, canonical) in lang.entities {
                let (s, c) = normalize_pair(&code, &surface, &canonical)?;
                entry.entities.insert(s, c);
            }
            for word in lang.stopwords {
                let word = word.trim().to_lowercase();
                if word.is_empty() {
                    return Err(Error::ConfigError(format!(
                        "empty stopword in language '{}'",
                        code
                    )));
                }
                entry.stopwords.insert(word);
            }
        }
        debug!(languages = table.languages.len(), "Loaded synonym table");
        Ok(table)
    }

    /// Read and parse a JSON table from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Overlay `other` on top of this table; entries in `other` win
    pub fn merge(&mut self, other: SynonymTable) {
        for (code, lang) in other.languages {
            let entry = self.languages.entry(code.clone()).or_default();
            for (surface, canonical) in lang.actions {
                if let Some(prev) = entry.actions.insert(surface.clone(), canonical.clone()) {
                    if prev != canonical {
                        warn!(language = %code, %surface, %prev, %canonical, "Action synonym overridden");
                    }
                }
            }
            for (surface, canonical) in lang.entities {
                if let Some(prev) = entry.entities.insert(surface.clone(), canonical.clone()) {
                    if prev != canonical {
                        warn!(language = %code, %surface, %prev, %canonical, "Entity synonym overridden");
                    }
                }
            }
            entry.stopwords.extend(lang.stopwords);
        }
    }

    /// Canonical action lemma for `surface`, hinted language first
    pub fn lookup_action(&self, language: &str, surface: &str) -> Option<&str> {
        self.search_order(language)
            .into_iter()
            .find_map(|t| t.actions.get(surface))
            .map(String::as_str)
    }

    /// Canonical entity lemma for `surface`, hinted language first
    pub fn lookup_entity(&self, language: &str, surface: &str) -> Option<&str> {
        self.search_order(language)
            .into_iter()
            .find_map(|t| t.entities.get(surface))
            .map(String::as_str)
    }

    pub fn is_stopword(&self, language: &str, surface: &str) -> bool {
        self.search_order(language)
            .into_iter()
            .any(|t| t.stopwords.contains(surface))
    }

    /// Every known surface containing CJK characters (segmentation lexicon)
    pub fn cjk_surfaces(&self) -> BTreeSet<String> {
        self.languages
            .values()
            .flat_map(|t| {
                t.actions
                    .keys()
                    .chain(t.entities.keys())
                    .chain(t.stopwords.iter())
            })
            .filter(|s| s.chars().any(is_cjk))
            .cloned()
            .collect()
    }

    fn search_order(&self, language: &str) -> Vec<&LanguageTable> {
        self.languages
            .get(language)
            .into_iter()
            .chain(
                self.languages
                    .iter()
                    .filter(|(code, _)| code.as_str() != language)
                    .map(|(_, t)| t),
            )
            .collect()
    }
}

fn normalize_pair(code: &str, surface: &str, canonical: &str) -> Result<(String, String)> {
    let s = surface.trim().to_lowercase();
    let c = canonical.trim().to_lowercase();
    if s.is_empty() || c.is_empty() {
        return Err(Error::ConfigError(format!(
            "empty synonym entry in language '{}': '{}' -> '{}'",
            code, surface, canonical
        )));
    }
    Ok((s, c))
}
