use crate::core::product_actions::DEFAULT_CONFIRMATION_LABEL;
use crate::core::synchronizer::{FailureAction, SyncSettings};
use crate::domain::page::DEFAULT_CURRENCY_PREFIX;
use crate::utils::error::{CartError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub client: ClientConfig,
    #[serde(default)]
    pub cart: CartConfig,
    pub notify: Option<NotifyConfig>,
    pub error_handling: Option<ErrorHandlingConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfig {
    pub base_url: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CartConfig {
    pub snapshot: Option<String>,
    pub currency_prefix: Option<String>,
    pub line_hide_ms: Option<u64>,
    pub notice_close_ms: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    pub confirmation_label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorHandlingConfig {
    pub on_quantity_failure: Option<String>, // "notify" | "silent"
    pub on_confirm_failure: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>, // "compact" | "json"
}

const FAILURE_ACTIONS: [&str; 2] = ["notify", "silent"];
const LOG_FORMATS: [&str; 2] = ["compact", "json"];
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MAX_ANIMATION_MS: u64 = 10_000;

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CartError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CartError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CSRF_TOKEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| CartError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        if let Some(base_url) = &self.client.base_url {
            validation::validate_url("client.base_url", base_url)?;
        }

        if let Some(timeout) = self.client.timeout_seconds {
            validation::validate_range("client.timeout_seconds", timeout, 1, 3600)?;
        }

        if let Some(snapshot) = &self.cart.snapshot {
            validation::validate_path("cart.snapshot", snapshot)?;
        }

        if let Some(ms) = self.cart.line_hide_ms {
            validation::validate_range("cart.line_hide_ms", ms, 0, MAX_ANIMATION_MS)?;
        }
        if let Some(ms) = self.cart.notice_close_ms {
            validation::validate_range("cart.notice_close_ms", ms, 0, MAX_ANIMATION_MS)?;
        }

        if let Some(label) = self.notify.as_ref().and_then(|n| n.confirmation_label.as_deref()) {
            validation::validate_non_empty_string("notify.confirmation_label", label)?;
        }

        if let Some(handling) = &self.error_handling {
            if let Some(action) = &handling.on_quantity_failure {
                validation::validate_one_of("error_handling.on_quantity_failure", action, &FAILURE_ACTIONS)?;
            }
            if let Some(action) = &handling.on_confirm_failure {
                validation::validate_one_of("error_handling.on_confirm_failure", action, &FAILURE_ACTIONS)?;
            }
        }

        if let Some(logging) = &self.logging {
            if let Some(level) = &logging.level {
                validation::validate_one_of("logging.level", level, &LOG_LEVELS)?;
            }
            if let Some(format) = &logging.format {
                validation::validate_one_of("logging.format", format, &LOG_FORMATS)?;
            }
        }

        Ok(())
    }

    pub fn base_url(&self) -> Option<&str> {
        self.client.base_url.as_deref()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.client.timeout_seconds.map(Duration::from_secs)
    }

    pub fn headers(&self) -> HashMap<String, String> {
        self.client.headers.clone().unwrap_or_default()
    }

    pub fn snapshot_path(&self) -> Option<&str> {
        self.cart.snapshot.as_deref()
    }

    pub fn currency_prefix(&self) -> &str {
        self.cart.currency_prefix.as_deref().unwrap_or(DEFAULT_CURRENCY_PREFIX)
    }

    pub fn confirmation_label(&self) -> &str {
        self.notify
            .as_ref()
            .and_then(|n| n.confirmation_label.as_deref())
            .unwrap_or(DEFAULT_CONFIRMATION_LABEL)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|f| f == "json")
            .unwrap_or(false)
    }

    /// 取得同步器設定
    pub fn sync_settings(&self) -> Result<SyncSettings> {
        let defaults = SyncSettings::default();
        let handling = self.error_handling.as_ref();

        let on_quantity_failure = match handling.and_then(|h| h.on_quantity_failure.as_deref()) {
            Some(action) => action.parse::<FailureAction>()?,
            None => defaults.on_quantity_failure,
        };
        let on_confirm_failure = match handling.and_then(|h| h.on_confirm_failure.as_deref()) {
            Some(action) => action.parse::<FailureAction>()?,
            None => defaults.on_confirm_failure,
        };

        Ok(SyncSettings {
            on_quantity_failure,
            on_confirm_failure,
            line_hide: self
                .cart
                .line_hide_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.line_hide),
            notice_close: self
                .cart
                .notice_close_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.notice_close),
        })
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
