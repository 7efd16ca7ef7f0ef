//! 數據源契約檢查工具
//!
//! 驗證一份商品元數據文件與每個商品的日線 OHLCV 序列文件，在進入下游系統前拒絕格式錯誤的提交。

// 模組定義
pub mod config;
pub mod domain_types;
pub mod validator;
