use crate::config::{CodecConfig, DocLayout, NameOrder, SegmentFlags};
use crate::utils::error::{CodecError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 編解碼設定檔 (TOML)。CLI 以 --profile 載入。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub profile: ProfileMeta,
    pub delimiters: Option<DelimiterTable>,
    pub names: Option<NameTable>,
    pub documents: Option<DocumentTable>,
    pub message: Option<MessageTable>,
    pub segments: Option<SegmentFlags>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileMeta {
    pub name: String,
    pub description: Option<String>,
}

/// Service characters as one-character strings; validated on conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelimiterTable {
    pub segment: Option<String>,
    pub element: Option<String>,
    pub component: Option<String>,
    pub release: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameTable {
    pub order: NameOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentTable {
    pub layout: DocLayout,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageTable {
    pub receiver: Option<String>,
}

impl ProfileConfig {
    /// 從 TOML 檔案載入設定
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CodecError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析設定
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| CodecError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${RECEIVER})
    fn substitute_env_vars(content: &str) -> String {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").expect("static pattern");

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }

    /// Resolves the profile into a per-call [`CodecConfig`], validating
    /// every service character along the way.
    pub fn into_codec_config(self) -> Result<CodecConfig> {
        let mut config = CodecConfig::default();

        if let Some(table) = &self.delimiters {
            if let Some(value) = &table.segment {
                config.delimiters.segment =
                    validation::validate_single_char("delimiters.segment", value)?;
            }
            if let Some(value) = &table.element {
                config.delimiters.element =
                    validation::validate_single_char("delimiters.element", value)?;
            }
            if let Some(value) = &table.component {
                config.delimiters.component =
                    validation::validate_single_char("delimiters.component", value)?;
            }
            if let Some(value) = &table.release {
                config.delimiters.release =
                    validation::validate_single_char("delimiters.release", value)?;
            }
        }
        if let Some(names) = &self.names {
            config.name_order = names.order;
        }
        if let Some(documents) = &self.documents {
            config.doc_layout = documents.layout;
        }
        if let Some(message) = &self.message {
            if let Some(receiver) = &message.receiver {
                config.receiver = receiver.clone();
            }
        }
        if let Some(segments) = self.segments {
            config.flags = segments;
        }

        config.validate()?;
        Ok(config)
    }
}

impl Validate for ProfileConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("profile.name", &self.profile.name)?;
        self.clone().into_codec_config().map(|_| ())
    }
}
