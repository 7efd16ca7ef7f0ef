use super::error::{ValidationError, ValidationWarning};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// 驗證報告
///
/// 兩個只增不減的序列：阻斷性錯誤與非阻斷性警告。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
    warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn extend_errors(&mut self, errors: impl IntoIterator<Item = ValidationError>) {
        self.errors.extend(errors);
    }

    /// 合併另一份報告，保持順序
    pub fn merge(&mut self, other: ValidationReport) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// 只有錯誤才代表失敗，警告不影響結果
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// 沒有對應 CSV 文件的商品
    pub fn missing_symbols(&self) -> Vec<&str> {
        self.warnings
            .iter()
            .filter_map(|warning| match warning {
                ValidationWarning::MissingFile { symbol } => Some(symbol.as_str()),
                _ => None,
            })
            .collect()
    }

    /// 各類型錯誤計數
    pub fn error_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for error in &self.errors {
            *counts.entry(error.kind()).or_insert(0) += 1;
        }
        counts
    }
}

/// 截斷策略
///
/// 數量超過 `max_shown + threshold` 時只顯示前 `max_shown` 項，其餘以數量代替。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncationPolicy {
    pub max_shown: usize,
    pub threshold: usize,
}

impl TruncationPolicy {
    pub fn new(max_shown: usize, threshold: usize) -> Self {
        Self {
            max_shown,
            threshold,
        }
    }

    /// 實際顯示的項目數
    pub fn visible(&self, total: usize) -> usize {
        if total > self.max_shown.saturating_add(self.threshold) {
            self.max_shown
        } else {
            total
        }
    }
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self::new(100, 10)
    }
}

/// 可序列化的報告摘要
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub passed: bool,
    pub error_count: usize,
    pub warning_count: usize,
    pub error_counts: BTreeMap<String, usize>,
    pub errors: Vec<String>,
    pub suppressed_errors: usize,
    pub warnings: Vec<String>,
    pub suppressed_warnings: usize,
}

/// 報告格式化器
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportFormatter {
    policy: TruncationPolicy,
}

impl ReportFormatter {
    pub fn new(policy: TruncationPolicy) -> Self {
        Self { policy }
    }

    /// 錯誤區塊，無錯誤時為 `None`
    pub fn format_errors(&self, report: &ValidationReport) -> Option<String> {
        if !report.has_errors() {
            return None;
        }

        let (mut lines, suppressed) = truncate(report.errors(), self.policy);
        if suppressed > 0 {
            lines.push(format!("... and {} more issues", suppressed));
        }

        Some(format!(
            "ERROR: the following issues were found in the repository files:\n {}",
            lines.join("\n ")
        ))
    }

    /// 警告區塊，缺少文件的商品合併為一行，與錯誤分開截斷
    pub fn format_warnings(&self, report: &ValidationReport) -> Option<String> {
        let mut blocks = Vec::new();

        let missing = report.missing_symbols();
        if !missing.is_empty() {
            let (mut symbols, suppressed) = truncate(&missing, self.policy);
            if suppressed > 0 {
                symbols.push(format!("... and {} more", suppressed));
            }
            blocks.push(format!(
                "WARNING: the following symbols have no corresponding CSV files in the data folder: {}",
                symbols.join(", ")
            ));
        }

        let others: Vec<&ValidationWarning> = report
            .warnings()
            .iter()
            .filter(|warning| !matches!(warning, ValidationWarning::MissingFile { .. }))
            .collect();
        if !others.is_empty() {
            let (lines, suppressed) = truncate(&others, self.policy);
            blocks.extend(lines.into_iter().map(|line| format!("WARNING: {}", line)));
            if suppressed > 0 {
                blocks.push(format!("WARNING: ... and {} more skipped files", suppressed));
            }
        }

        if blocks.is_empty() {
            None
        } else {
            Some(blocks.join("\n"))
        }
    }

    pub fn summary(&self, report: &ValidationReport) -> ReportSummary {
        let (errors, suppressed_errors) = truncate(report.errors(), self.policy);
        let (warnings, suppressed_warnings) = truncate(report.warnings(), self.policy);

        ReportSummary {
            passed: !report.has_errors(),
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            error_counts: report
                .error_counts()
                .into_iter()
                .map(|(kind, count)| (kind.to_string(), count))
                .collect(),
            errors,
            suppressed_errors,
            warnings,
            suppressed_warnings,
        }
    }

    /// 格式化為JSON
    pub fn format_json(&self, report: &ValidationReport) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.summary(report))
    }
}

/// 依策略截斷，回傳顯示的文字與被省略的數量
fn truncate<T: Display>(items: &[T], policy: TruncationPolicy) -> (Vec<String>, usize) {
    let visible = policy.visible(items.len());
    let lines = items[..visible].iter().map(ToString::to_string).collect();
    (lines, items.len() - visible)
}
