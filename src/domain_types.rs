//! 領域類型模組
//!
//! 描述數據源契約中的兩種輸入：商品元數據（`SymbolInfo`）與每日 OHLCV 序列行（`DataRow`）。

pub mod data_row;
pub mod symbol_info;

pub use data_row::{format_series_date, parse_series_date, DataRow, DATE_TOKEN_LEN};
pub use symbol_info::{FieldValue, SymbolEntry, SymbolInfo};
