use regex::Regex;
use thiserror::Error;

/// 配置驗證錯誤
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigValidationError {
    #[error("缺少必要配置項: {0}")]
    MissingField(String),

    #[error("無效的配置值: {0}")]
    InvalidValue(String),

    #[error("配置範圍錯誤: {field} 的值 {value} 不在範圍 {min}..{max} 內")]
    RangeError {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("無效的正則表達式: {field} = {pattern}")]
    InvalidPattern { field: String, pattern: String },
}

/// 配置驗證器trait
pub trait Validator {
    /// 驗證配置
    fn validate(&self) -> Result<(), ConfigValidationError>;
}

/// 驗證配置區段
pub fn validate_config<T>(config: &T) -> Result<(), ConfigValidationError>
where
    T: Validator,
{
    config.validate()
}

/// 驗證工具函數
pub struct ValidationUtils;

impl ValidationUtils {
    /// 驗證配置值是否在指定範圍內
    pub fn in_range<T>(value: T, min: T, max: T, field_name: &str) -> Result<(), ConfigValidationError>
    where
        T: PartialOrd + ToString,
    {
        if value < min || value > max {
            return Err(ConfigValidationError::RangeError {
                field: field_name.to_string(),
                value: value.to_string(),
                min: min.to_string(),
                max: max.to_string(),
            });
        }
        Ok(())
    }

    /// 驗證一個選項是否為某些值中的一個
    pub fn one_of(value: &str, options: &[&str], field_name: &str) -> Result<(), ConfigValidationError> {
        if !options.contains(&value) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "{} 的值 {} 不是有效選項: {:?}",
                field_name, value, options
            )));
        }
        Ok(())
    }

    /// 檢查必要的字串欄位是否有值
    pub fn not_empty(value: &str, field_name: &str) -> Result<(), ConfigValidationError> {
        if value.trim().is_empty() {
            return Err(ConfigValidationError::MissingField(field_name.to_string()));
        }
        Ok(())
    }

    /// 檢查正則表達式可以編譯
    pub fn valid_pattern(pattern: &str, field_name: &str) -> Result<(), ConfigValidationError> {
        Regex::new(pattern)
            .map(|_| ())
            .map_err(|_| ConfigValidationError::InvalidPattern {
                field: field_name.to_string(),
                pattern: pattern.to_string(),
            })
    }
}
