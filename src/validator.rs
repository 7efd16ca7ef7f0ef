//! 資料驗證器模組
//!
//! 在數據進入下游系統前，檢查一組商品元數據與每個商品的日線序列文件是否符合數據源契約。
//!
//! # 主要功能
//!
//! - **元數據驗證**：欄位集合、型別、長度、正則、數量與商品唯一性
//! - **逐行驗證**：欄位結構、數值與日期格式、OHLCV 關係、日期邊界
//! - **序列驗證**：重複日期與亂序日期（各自只回報第一次）
//! - **交叉比對**：商品清單與數據目錄互相核對
//! - **報告彙整**：錯誤與警告分開累積，輸出時依策略截斷
//!
//! # 使用範例
//!
//! ```rust,ignore
//! use seed_data_check::validator::{DatasetValidator, ReportFormatter, ValidationRules};
//!
//! let validator = DatasetValidator::new(ValidationRules::default());
//! let report = validator.run(Path::new("symbol_info/demo.json"), Path::new("data"));
//!
//! if let Some(text) = ReportFormatter::default().format_errors(&report) {
//!     println!("{}", text);
//! }
//! ```

pub mod collection;
pub mod error;
pub mod line_validator;
pub mod metadata_validator;
pub mod report;
pub mod rules;
pub mod series_validator;

// 重新導出常用類型
pub use collection::{series_path, series_stem, CollectionValidator, CrossReference};
pub use error::{CheckError, CheckResult, ValidationError, ValidationWarning};
pub use line_validator::{LineOutcome, LineValidator};
pub use metadata_validator::{check_field_data, MetadataOutcome, MetadataValidator};
pub use report::{ReportFormatter, ReportSummary, TruncationPolicy, ValidationReport};
pub use rules::{FieldKind, FieldRule, LineRules, MetadataRules, ValidationRules};
pub use series_validator::{SeriesState, SeriesValidator};

use crate::config::{validate_config, CheckConfig};
use std::path::Path;
use tracing::{info, warn};

/// 整個數據集的驗證流程
///
/// 先驗證元數據，取得商品清單後才驗證序列文件，最後彙整為一份報告。
pub struct DatasetValidator {
    rules: ValidationRules,
    strategy: CrossReference,
    parallel: bool,
}

impl DatasetValidator {
    pub fn new(rules: ValidationRules) -> Self {
        Self {
            rules,
            strategy: CrossReference::default(),
            parallel: false,
        }
    }

    /// 先驗證配置，再依配置建立規則
    pub fn from_config(config: &CheckConfig) -> CheckResult<Self> {
        validate_config(config)?;
        let rules = ValidationRules::from_config(config)?;
        Ok(Self::new(rules)
            .with_strategy(config.strategy)
            .with_parallel(config.parallel))
    }

    pub fn with_strategy(mut self, strategy: CrossReference) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn rules(&self) -> &ValidationRules {
        &self.rules
    }

    /// 驗證元數據文件
    pub fn check_metadata(&self, metadata_path: &Path) -> MetadataOutcome {
        MetadataValidator::new(&self.rules.metadata).validate_file(metadata_path)
    }

    /// 執行完整的驗證流程
    pub fn run(&self, metadata_path: &Path, data_dir: &Path) -> ValidationReport {
        info!("開始驗證元數據: {}", metadata_path.display());

        let metadata = self.check_metadata(metadata_path);
        let mut report = ValidationReport::new();
        report.extend_errors(metadata.errors);

        if metadata.symbols.is_empty() {
            warn!("元數據沒有可用的商品清單，跳過序列文件驗證");
            return report;
        }

        let collection = CollectionValidator::new(SeriesValidator::new(&self.rules.line))
            .with_strategy(self.strategy)
            .with_parallel(self.parallel);
        report.merge(collection.validate(&metadata.symbols, data_dir));

        info!(
            "驗證完成: {} 個錯誤，{} 個警告",
            report.error_count(),
            report.warning_count()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn validator() -> DatasetValidator {
        DatasetValidator::new(
            ValidationRules::default().with_today(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap()),
        )
    }

    #[test]
    fn test_missing_metadata_skips_series() {
        let dir = TempDir::new().unwrap();
        let report = validator().run(&dir.path().join("absent.json"), dir.path());

        assert_eq!(report.error_count(), 1);
        assert!(matches!(
            report.errors()[0],
            ValidationError::MetadataMissing { .. }
        ));
        assert_eq!(report.warning_count(), 0);
    }

    #[test]
    fn test_from_config_rejects_invalid_config() {
        let config = CheckConfig {
            group: "demo".to_string(),
            max_pricescale_exponent: 20,
            ..Default::default()
        };
        assert!(matches!(
            DatasetValidator::from_config(&config),
            Err(CheckError::InvalidConfig(_))
        ));

        // 未設定分組
        assert!(matches!(
            DatasetValidator::from_config(&CheckConfig::default()),
            Err(CheckError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_invalid_json_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ \"symbol\": ").unwrap();

        let report = validator().run(&path, dir.path());
        assert_eq!(report.error_count(), 1);
        assert!(matches!(
            report.errors()[0],
            ValidationError::MetadataUnreadable { .. }
        ));
    }
}
