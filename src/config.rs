/// 配置管理模組
///
/// 本模組負責加載與驗證檢查工具的配置。
/// 依序疊加內建預設值、可選的 TOML 配置文件與 `SEED_CHECK` 前綴的環境變數。
// 宣告子模組
pub mod loader;
pub mod types;
pub mod validation;

// 重新導出常用組件
pub use loader::{ConfigExt, ConfigLoader, ENV_PREFIX, GROUP_ENV};
pub use types::*;
pub use validation::{validate_config, ConfigValidationError, ValidationUtils, Validator};
