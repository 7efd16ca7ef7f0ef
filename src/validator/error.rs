use crate::config::ConfigValidationError;
use thiserror::Error;

/// 阻斷性驗證錯誤
///
/// `Display` 即為輸出到報告中的診斷訊息。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    // 元數據文件
    #[error("The symbol info file \"{path}\" does not exist")]
    MetadataMissing { path: String },

    #[error("The symbol info file \"{path}\" cannot be parsed: {reason}")]
    MetadataUnreadable { path: String, reason: String },

    #[error("The {path} file must contain a JSON object")]
    MetadataNotObject { path: String },

    #[error("The {path} file contains unexpected fields: {fields}")]
    UnexpectedFields { path: String, fields: String },

    #[error("The {path} file doesn't have required fields: {fields}")]
    MissingFields { path: String, fields: String },

    #[error("The type of {field} field must be {kind} or array of {kind}s in the {path} file")]
    FieldType {
        path: String,
        field: String,
        kind: &'static str,
    },

    #[error("The length of some elements in {field} field exceeds maximum allowed length ({max_length}) in the {path} file")]
    FieldLength {
        path: String,
        field: String,
        max_length: usize,
    },

    #[error("Some elements in {field} field do not match the pattern {pattern} in the {path} file")]
    FieldPattern {
        path: String,
        field: String,
        pattern: String,
    },

    #[error("The number of {field} field elements ({actual}) does not match the number of symbols ({expected}) in the {path} file")]
    FieldCount {
        path: String,
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("The {path} file contains duplicate symbols: {symbols}")]
    DuplicateSymbols { path: String, symbols: String },

    #[error("The {path} file doesn't declare any symbol")]
    EmptySymbolList { path: String },

    // 序列文件逐行
    #[error("{path} has comment in line {line}")]
    CommentLine { path: String, line: usize },

    #[error("{path} contains empty line {line}")]
    EmptyLine { path: String, line: usize },

    #[error("{path} contains spaces in line {line}")]
    SurroundingWhitespace { path: String, line: usize },

    #[error("{path}:{line} contains incorrect number of elements (expected: {expected}, actual: {actual})")]
    FieldCountMismatch {
        path: String,
        line: usize,
        expected: usize,
        actual: usize,
    },

    #[error("{path}:{line} contains invalid numeric values. Open, high, low, close and volume must be decimal numbers, NAN/+INF/-INF are not allowed")]
    InvalidNumber { path: String, line: usize },

    #[error("{path}:{line} contains invalid date. The date must be a zero-padded YYYYMMDDT value")]
    InvalidDate { path: String, line: usize },

    #[error("{path}:{line} contains invalid OHLC values. Values must comply with the rules: h >= o, h >= l, h >= c, l <= o, l <= c")]
    InvalidOhlc { path: String, line: usize },

    #[error("{path}:{line} contains invalid volume value. The value must not be negative")]
    NegativeVolume { path: String, line: usize },

    #[error("{path}:{line} contains date in future. The data must be today or before today")]
    FutureDate { path: String, line: usize },

    #[error("{path}:{line} contains date before {earliest}")]
    DateTooEarly {
        path: String,
        line: usize,
        earliest: String,
    },

    #[error("{path}:{line} is not valid UTF-8 text")]
    InvalidEncoding { path: String, line: usize },

    // 序列文件整體
    #[error("{path} contains duplicate dates. First duplicate: {date} in line {line}")]
    DuplicateDate {
        path: String,
        date: String,
        line: usize,
    },

    #[error("{path} has unordered dates. First unordered date: {date} in line {line}")]
    UnorderedDate {
        path: String,
        date: String,
        line: usize,
    },

    #[error("{path} cannot be read: {reason}")]
    FileUnreadable { path: String, reason: String },
}

impl ValidationError {
    /// 錯誤類型名稱，用於日誌與摘要統計
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MetadataMissing { .. } => "MetadataMissing",
            Self::MetadataUnreadable { .. } => "MetadataUnreadable",
            Self::MetadataNotObject { .. } => "MetadataNotObject",
            Self::UnexpectedFields { .. } => "UnexpectedFields",
            Self::MissingFields { .. } => "MissingFields",
            Self::FieldType { .. } => "FieldType",
            Self::FieldLength { .. } => "FieldLength",
            Self::FieldPattern { .. } => "FieldPattern",
            Self::FieldCount { .. } => "FieldCount",
            Self::DuplicateSymbols { .. } => "DuplicateSymbols",
            Self::EmptySymbolList { .. } => "EmptySymbolList",
            Self::CommentLine { .. } => "CommentLine",
            Self::EmptyLine { .. } => "EmptyLine",
            Self::SurroundingWhitespace { .. } => "SurroundingWhitespace",
            Self::FieldCountMismatch { .. } => "FieldCountMismatch",
            Self::InvalidNumber { .. } => "InvalidNumber",
            Self::InvalidDate { .. } => "InvalidDate",
            Self::InvalidOhlc { .. } => "InvalidOhlc",
            Self::NegativeVolume { .. } => "NegativeVolume",
            Self::FutureDate { .. } => "FutureDate",
            Self::DateTooEarly { .. } => "DateTooEarly",
            Self::InvalidEncoding { .. } => "InvalidEncoding",
            Self::DuplicateDate { .. } => "DuplicateDate",
            Self::UnorderedDate { .. } => "UnorderedDate",
            Self::FileUnreadable { .. } => "FileUnreadable",
        }
    }

    /// 錯誤所在行號（僅逐行與序列錯誤）
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::CommentLine { line, .. }
            | Self::EmptyLine { line, .. }
            | Self::SurroundingWhitespace { line, .. }
            | Self::FieldCountMismatch { line, .. }
            | Self::InvalidNumber { line, .. }
            | Self::InvalidDate { line, .. }
            | Self::InvalidOhlc { line, .. }
            | Self::NegativeVolume { line, .. }
            | Self::FutureDate { line, .. }
            | Self::DateTooEarly { line, .. }
            | Self::InvalidEncoding { line, .. }
            | Self::DuplicateDate { line, .. }
            | Self::UnorderedDate { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// 非阻斷性警告
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationWarning {
    #[error("the symbol {symbol} has no corresponding CSV file in the data folder")]
    MissingFile { symbol: String },

    #[error("{path} is not named <SYMBOL>.csv and was skipped")]
    MisnamedFile { path: String },

    #[error("{path} does not belong to any symbol declared in the symbol info file and was skipped")]
    UndeclaredFile { path: String },
}

/// 檢查工具本身的運行錯誤（與數據內容無關）
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("無效的配置: {0}")]
    InvalidConfig(#[from] ConfigValidationError),

    #[error("無效的正則表達式: {0}")]
    Pattern(#[from] regex::Error),
}

pub type CheckResult<T> = Result<T, CheckError>;
