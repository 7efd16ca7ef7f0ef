use crate::config::validation::{ConfigValidationError, ValidationUtils, Validator};
use crate::validator::rules::{
    default_earliest_date, DEFAULT_CURRENCY_PATTERN, DEFAULT_MAX_FIELD_LENGTH,
    DEFAULT_MAX_PRICESCALE_EXPONENT, DEFAULT_SYMBOL_PATTERN,
};
use crate::validator::{CrossReference, TruncationPolicy};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 應用程序配置結構
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    pub log: LogConfig,
    pub check: CheckConfig,
    pub report: ReportConfig,
}

impl Validator for ApplicationConfig {
    fn validate(&self) -> Result<(), ConfigValidationError> {
        // 驗證各個部分的配置
        self.log.validate()?;
        self.check.validate()?;
        self.report.validate()?;

        Ok(())
    }
}

/// 日誌配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Validator for LogConfig {
    fn validate(&self) -> Result<(), ConfigValidationError> {
        // 驗證日誌級別
        ValidationUtils::one_of(
            &self.level.to_lowercase(),
            &["trace", "debug", "info", "warn", "error"],
            "log.level",
        )?;

        // 驗證日誌格式
        ValidationUtils::one_of(
            &self.format.to_lowercase(),
            &["pretty", "compact"],
            "log.format",
        )?;

        Ok(())
    }
}

/// 數據集檢查配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckConfig {
    /// 倉庫根目錄
    pub root: String,
    /// 元數據分組名稱，對應 `symbol_info/<group>.json`
    pub group: String,
    pub symbol_info_dir: String,
    pub data_dir: String,
    pub strategy: CrossReference,
    pub parallel: bool,
    pub symbol_pattern: String,
    pub currency_pattern: String,
    pub max_field_length: usize,
    pub max_pricescale_exponent: u32,
    pub earliest_date: NaiveDate,
    /// 固定運行日期，未設定時使用本地日期
    pub today: Option<NaiveDate>,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            root: ".".to_string(),
            group: String::new(),
            symbol_info_dir: "symbol_info".to_string(),
            data_dir: "data".to_string(),
            strategy: CrossReference::default(),
            parallel: false,
            symbol_pattern: DEFAULT_SYMBOL_PATTERN.to_string(),
            currency_pattern: DEFAULT_CURRENCY_PATTERN.to_string(),
            max_field_length: DEFAULT_MAX_FIELD_LENGTH,
            max_pricescale_exponent: DEFAULT_MAX_PRICESCALE_EXPONENT,
            earliest_date: default_earliest_date(),
            today: None,
        }
    }
}

impl CheckConfig {
    /// 元數據文件路徑
    pub fn metadata_path(&self) -> PathBuf {
        PathBuf::from(&self.root)
            .join(&self.symbol_info_dir)
            .join(format!("{}.json", self.group))
    }

    /// 序列文件目錄
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.root).join(&self.data_dir)
    }
}

impl Validator for CheckConfig {
    fn validate(&self) -> Result<(), ConfigValidationError> {
        ValidationUtils::not_empty(&self.root, "check.root")?;
        ValidationUtils::not_empty(&self.group, "check.group")?;
        ValidationUtils::not_empty(&self.symbol_info_dir, "check.symbol_info_dir")?;
        ValidationUtils::not_empty(&self.data_dir, "check.data_dir")?;
        ValidationUtils::valid_pattern(&self.symbol_pattern, "check.symbol_pattern")?;
        ValidationUtils::valid_pattern(&self.currency_pattern, "check.currency_pattern")?;
        ValidationUtils::in_range(self.max_field_length, 1, 4096, "check.max_field_length")?;
        // 10^19 是 64 位元無號整數能表示的最大十次方
        ValidationUtils::in_range(self.max_pricescale_exponent, 0, 19, "check.max_pricescale_exponent")?;

        if let Some(today) = self.today {
            if today < self.earliest_date {
                return Err(ConfigValidationError::InvalidValue(format!(
                    "check.today ({}) 早於 check.earliest_date ({})",
                    today, self.earliest_date
                )));
            }
        }

        Ok(())
    }
}

/// 報告輸出配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// 截斷後顯示的最大項目數
    pub max_shown: usize,
    /// 超過 max_shown + threshold 才截斷
    pub threshold: usize,
    /// 錯誤輸出文件，未設定時寫到標準輸出
    pub report_file: Option<String>,
    /// 警告輸出文件，未設定時寫到標準錯誤
    pub warnings_file: Option<String>,
    pub json: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        let policy = TruncationPolicy::default();
        Self {
            max_shown: policy.max_shown,
            threshold: policy.threshold,
            report_file: None,
            warnings_file: None,
            json: false,
        }
    }
}

impl ReportConfig {
    pub fn truncation(&self) -> TruncationPolicy {
        TruncationPolicy::new(self.max_shown, self.threshold)
    }
}

impl Validator for ReportConfig {
    fn validate(&self) -> Result<(), ConfigValidationError> {
        ValidationUtils::in_range(self.max_shown, 1, 1_000_000, "report.max_shown")?;
        ValidationUtils::in_range(self.threshold, 0, 1_000_000, "report.threshold")?;

        Ok(())
    }
}
