use crate::config::types::ApplicationConfig;
use crate::config::validation::Validator;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use tracing::{debug, warn};

/// 環境變數前綴，例如 `SEED_CHECK_REPORT__MAX_SHOWN=50`
pub const ENV_PREFIX: &str = "SEED_CHECK";
/// 選擇元數據分組的環境變數
pub const GROUP_ENV: &str = "GROUP";

/// 配置加載器
pub struct ConfigLoader;

impl ConfigLoader {
    /// 依序疊加：內建預設值 → `GROUP` → 配置文件 → `SEED_CHECK_*` 環境變數
    pub fn load(config_file: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config_builder = Config::builder();

        // GROUP 沿用數據倉庫 CI 的慣例，優先級最低
        if let Ok(group) = env::var(GROUP_ENV) {
            if !group.is_empty() {
                config_builder = config_builder.set_default("check.group", group)?;
            }
        }

        if let Some(path) = config_file {
            config_builder = config_builder.add_source(File::from(path).required(true));
        }

        // 從環境變數加載配置（優先級高於文件配置）
        config_builder = config_builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // 構建最終配置
        config_builder.build()
    }
}

/// 配置獲取輔助特性
pub trait ConfigExt {
    /// 從配置中獲取並反序列化指定部分
    fn get_section<'a, T: Deserialize<'a>>(&'a self, section: &str) -> Result<T, ConfigError>;
}

impl ConfigExt for Config {
    fn get_section<'a, T: Deserialize<'a>>(&'a self, section: &str) -> Result<T, ConfigError> {
        self.get(section)
    }
}

/// ApplicationConfig 加載方法實現
impl ApplicationConfig {
    /// 從可選的配置文件與環境變數加載配置
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config_source = ConfigLoader::load(config_file)?;

        // 使用 serde 反序列化配置
        let app_config: ApplicationConfig = config_source.try_deserialize()?;

        // 僅記錄結果，命令列參數覆寫後會再驗證一次
        if let Err(err) = app_config.validate() {
            warn!("配置驗證失敗: {}", err);
        } else {
            debug!("配置驗證通過");
        }

        Ok(app_config)
    }
}
