//! 驗證規則表
//!
//! 元數據欄位規則以表格形式描述（欄位名 → 型別、最大長度、正則、是否逐商品重複），
//! 逐行規則則包含數值正則與日期邊界。所有常數都在建構時注入，而非全域狀態，
//! 因此可在測試中固定「今天」。

use crate::config::CheckConfig;
use chrono::{Local, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;

use super::error::CheckResult;

pub const SYMBOL_FIELD: &str = "symbol";
pub const DESCRIPTION_FIELD: &str = "description";
pub const PRICESCALE_FIELD: &str = "pricescale";
pub const CURRENCY_FIELD: &str = "currency";

pub const DEFAULT_SYMBOL_PATTERN: &str = r"^[A-Z0-9._]+$";
pub const DEFAULT_CURRENCY_PATTERN: &str = r"^[A-Z0-9]*$";
/// 可選正負號、數字、至多一個小數點；刻意不接受 inf/nan
pub const DECIMAL_PATTERN: &str = r"^[+-]?([0-9]*[.])?[0-9]+$";
pub const DEFAULT_MAX_FIELD_LENGTH: usize = 128;
pub const DEFAULT_MAX_PRICESCALE_EXPONENT: u32 = 18;

static DECIMAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(DECIMAL_PATTERN).expect("decimal pattern should compile"));

/// 最早允許的日期
pub fn default_earliest_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).unwrap_or(NaiveDate::MIN)
}

/// pricescale 正則：1、10、100 … 10^max_exponent
pub fn pricescale_pattern(max_exponent: u32) -> String {
    if max_exponent == 0 {
        "^1$".to_string()
    } else {
        format!("^1(0{{1,{}}})?$", max_exponent)
    }
}

/// 欄位值的預期型別
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
}

impl FieldKind {
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Integer => value.is_i64() || value.is_u64(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
        }
    }
}

/// 單一元數據欄位的規則
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    /// 0 表示不檢查長度
    pub max_length: usize,
    pub pattern: Option<Regex>,
    /// 是否必須與商品數量一致
    pub per_symbol: bool,
}

impl FieldRule {
    pub fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            max_length: 0,
            pattern: None,
            per_symbol: false,
        }
    }

    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn with_pattern(mut self, pattern: &str) -> CheckResult<Self> {
        self.pattern = Some(Regex::new(pattern)?);
        Ok(self)
    }

    pub fn per_symbol(mut self) -> Self {
        self.per_symbol = true;
        self
    }
}

/// 元數據規則表
#[derive(Debug, Clone)]
pub struct MetadataRules {
    /// 決定商品軸的欄位
    pub symbol: FieldRule,
    /// 其餘逐商品欄位，依序檢查
    pub fields: Vec<FieldRule>,
}

impl MetadataRules {
    pub fn new(
        symbol_pattern: &str,
        currency_pattern: &str,
        max_length: usize,
        max_pricescale_exponent: u32,
    ) -> CheckResult<Self> {
        Ok(Self {
            symbol: FieldRule::new(SYMBOL_FIELD, FieldKind::String)
                .with_max_length(max_length)
                .with_pattern(symbol_pattern)?,
            fields: vec![
                FieldRule::new(DESCRIPTION_FIELD, FieldKind::String)
                    .with_max_length(max_length)
                    .per_symbol(),
                FieldRule::new(PRICESCALE_FIELD, FieldKind::Integer)
                    .with_pattern(&pricescale_pattern(max_pricescale_exponent))?
                    .per_symbol(),
                FieldRule::new(CURRENCY_FIELD, FieldKind::String)
                    .with_max_length(max_length)
                    .with_pattern(currency_pattern)?
                    .per_symbol(),
            ],
        })
    }

    /// 文件必須恰好包含的欄位集合
    pub fn expected_fields(&self) -> BTreeSet<&'static str> {
        std::iter::once(self.symbol.name)
            .chain(self.fields.iter().map(|rule| rule.name))
            .collect()
    }
}

impl Default for MetadataRules {
    fn default() -> Self {
        Self::new(
            DEFAULT_SYMBOL_PATTERN,
            DEFAULT_CURRENCY_PATTERN,
            DEFAULT_MAX_FIELD_LENGTH,
            DEFAULT_MAX_PRICESCALE_EXPONENT,
        )
        .expect("default metadata rules should compile")
    }
}

/// 序列文件逐行規則
#[derive(Debug, Clone)]
pub struct LineRules {
    pub decimal: Regex,
    /// 運行當天，晚於此日期的數據視為未來數據
    pub today: NaiveDate,
    pub earliest: NaiveDate,
}

impl LineRules {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            decimal: DECIMAL_RE.clone(),
            today,
            earliest: default_earliest_date(),
        }
    }

    pub fn with_earliest(mut self, earliest: NaiveDate) -> Self {
        self.earliest = earliest;
        self
    }
}

impl Default for LineRules {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

/// 完整的驗證規則
#[derive(Debug, Clone, Default)]
pub struct ValidationRules {
    pub metadata: MetadataRules,
    pub line: LineRules,
}

impl ValidationRules {
    pub fn from_config(config: &CheckConfig) -> CheckResult<Self> {
        let metadata = MetadataRules::new(
            &config.symbol_pattern,
            &config.currency_pattern,
            config.max_field_length,
            config.max_pricescale_exponent,
        )?;
        let today = config.today.unwrap_or_else(|| Local::now().date_naive());
        let line = LineRules::new(today).with_earliest(config.earliest_date);

        Ok(Self { metadata, line })
    }

    /// 固定運行日期
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.line.today = today;
        self
    }
}
