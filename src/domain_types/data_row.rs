use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 日期欄位長度：`YYYYMMDDT`
pub const DATE_TOKEN_LEN: usize = 9;

/// 序列檔案中的一行日線數據
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataRow {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl DataRow {
    /// 檢查 OHLC 關係：h >= o, h >= c, h >= l, l <= o, l <= c
    pub fn violates_ohlc(&self) -> bool {
        !(self.high >= self.open
            && self.high >= self.close
            && self.high >= self.low
            && self.low <= self.open
            && self.low <= self.close)
    }

    pub fn has_negative_volume(&self) -> bool {
        self.volume < 0.0
    }
}

/// 解析零填充的 `YYYYMMDDT` 日期
///
/// 只接受恰好 9 個字元（8 位數字加 `T`）且為真實日曆日期的值，
/// 因此 `202291T` 之類未填充的寫法會被拒絕。
pub fn parse_series_date(token: &str) -> Option<NaiveDate> {
    let bytes = token.as_bytes();
    if bytes.len() != DATE_TOKEN_LEN || bytes[8] != b'T' {
        return None;
    }
    if !bytes[..8].iter().all(u8::is_ascii_digit) {
        return None;
    }

    let year = token[0..4].parse().ok()?;
    let month = token[4..6].parse().ok()?;
    let day = token[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// 將日期格式化回 `YYYYMMDDT`
pub fn format_series_date(date: NaiveDate) -> String {
    date.format("%Y%m%dT").to_string()
}
