use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// 元數據欄位的原始形狀
///
/// 每個欄位可以是單一值（代表恰好一個商品），或與 `symbol` 平行的陣列。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Scalar(&'a Value),
    Array(&'a [Value]),
}

impl<'a> FieldValue<'a> {
    pub fn from_json(value: &'a Value) -> Self {
        match value {
            Value::Array(items) => FieldValue::Array(items.as_slice()),
            other => FieldValue::Scalar(other),
        }
    }

    /// 元素數量，單一值視為 1
    pub fn len(&self) -> usize {
        match self {
            FieldValue::Scalar(_) => 1,
            FieldValue::Array(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_array(&self) -> bool {
        matches!(self, FieldValue::Array(_))
    }

    /// 以切片形式取得所有元素
    pub fn elements(&self) -> &'a [Value] {
        match *self {
            FieldValue::Scalar(value) => std::slice::from_ref(value),
            FieldValue::Array(items) => items,
        }
    }
}

/// 單一商品的元數據視圖
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymbolEntry<'a> {
    pub symbol: &'a str,
    pub description: &'a str,
    pub pricescale: u64,
    pub currency: &'a str,
}

/// 已通過驗證的商品元數據
///
/// 由元數據驗證器在文件完全合法時建構，之後唯讀。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolInfo {
    pub symbols: Vec<String>,
    pub descriptions: Vec<String>,
    pub pricescales: Vec<u64>,
    pub currencies: Vec<String>,
}

impl SymbolInfo {
    /// 從元數據文件的欄位建構
    ///
    /// 任何欄位缺失、型別不符或長度不一致時返回 `None`。
    pub fn from_fields(fields: &Map<String, Value>) -> Option<Self> {
        let symbols = string_column(fields.get("symbol")?)?;
        let descriptions = string_column(fields.get("description")?)?;
        let pricescales = FieldValue::from_json(fields.get("pricescale")?)
            .elements()
            .iter()
            .map(Value::as_u64)
            .collect::<Option<Vec<_>>>()?;
        let currencies = string_column(fields.get("currency")?)?;

        let count = symbols.len();
        if descriptions.len() != count || pricescales.len() != count || currencies.len() != count
        {
            return None;
        }

        Some(Self {
            symbols,
            descriptions,
            pricescales,
            currencies,
        })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<SymbolEntry<'_>> {
        Some(SymbolEntry {
            symbol: self.symbols.get(index)?,
            description: self.descriptions.get(index)?,
            pricescale: *self.pricescales.get(index)?,
            currency: self.currencies.get(index)?,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = SymbolEntry<'_>> + '_ {
        (0..self.len()).filter_map(move |index| self.get(index))
    }

    pub fn find(&self, symbol: &str) -> Option<SymbolEntry<'_>> {
        self.iter().find(|entry| entry.symbol == symbol)
    }
}

fn string_column(value: &Value) -> Option<Vec<String>> {
    FieldValue::from_json(value)
        .elements()
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_value_shapes() {
        let scalar = json!("AAPL");
        let array = json!(["AAPL", "MSFT"]);

        let scalar_field = FieldValue::from_json(&scalar);
        assert!(!scalar_field.is_array());
        assert_eq!(scalar_field.len(), 1);
        assert_eq!(scalar_field.elements(), &[json!("AAPL")]);

        let array_field = FieldValue::from_json(&array);
        assert!(array_field.is_array());
        assert_eq!(array_field.len(), 2);
    }

    #[test]
    fn test_symbol_info_from_scalars() {
        let doc = json!({
            "symbol": "AAPL",
            "description": "Apple",
            "pricescale": 100,
            "currency": "USD"
        });
        let info = SymbolInfo::from_fields(doc.as_object().unwrap()).unwrap();

        assert_eq!(info.len(), 1);
        let entry = info.find("AAPL").unwrap();
        assert_eq!(entry.description, "Apple");
        assert_eq!(entry.pricescale, 100);
        assert_eq!(entry.currency, "USD");
    }

    #[test]
    fn test_symbol_info_rejects_mismatched_columns() {
        let doc = json!({
            "symbol": ["AAPL", "MSFT"],
            "description": ["Apple"],
            "pricescale": [100, 100],
            "currency": ["USD", "USD"]
        });
        assert!(SymbolInfo::from_fields(doc.as_object().unwrap()).is_none());
    }
}
