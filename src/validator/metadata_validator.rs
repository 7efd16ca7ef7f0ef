//! 商品元數據驗證器
//!
//! 檢查欄位集合、逐欄位的型別/長度/正則/數量規則，以及商品名稱唯一性。
//! 只有 `symbol` 欄位本身合法時才會產生商品清單。

use super::error::ValidationError;
use super::rules::{FieldRule, MetadataRules};
use crate::domain_types::{FieldValue, SymbolInfo};
use serde_json::{Map, Value};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::Path;
use tracing::debug;

/// 元數據驗證結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataOutcome {
    /// 商品清單（`symbol` 欄位不合法時為空）
    pub symbols: Vec<String>,
    /// 完全合法時的結構化元數據
    pub info: Option<SymbolInfo>,
    pub errors: Vec<ValidationError>,
}

impl MetadataOutcome {
    fn rejected(errors: Vec<ValidationError>) -> Self {
        Self {
            symbols: Vec::new(),
            info: None,
            errors,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// 元數據驗證器
pub struct MetadataValidator<'r> {
    rules: &'r MetadataRules,
}

impl<'r> MetadataValidator<'r> {
    pub fn new(rules: &'r MetadataRules) -> Self {
        Self { rules }
    }

    /// 讀取並驗證元數據文件
    pub fn validate_file(&self, path: &Path) -> MetadataOutcome {
        let source = path.display().to_string();

        if !path.is_file() {
            return MetadataOutcome::rejected(vec![ValidationError::MetadataMissing {
                path: source,
            }]);
        }

        let document = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));

        match document {
            Ok(document) => self.validate_document(&document, &source),
            Err(reason) => MetadataOutcome::rejected(vec![ValidationError::MetadataUnreadable {
                path: source,
                reason,
            }]),
        }
    }

    /// 驗證已解析的元數據文件
    ///
    /// `source` 僅用於診斷訊息。
    pub fn validate_document(&self, document: &Value, source: &str) -> MetadataOutcome {
        let Some(fields) = document.as_object() else {
            return MetadataOutcome::rejected(vec![ValidationError::MetadataNotObject {
                path: source.to_string(),
            }]);
        };

        if let Some(err) = self.check_field_set(fields, source) {
            return MetadataOutcome::rejected(vec![err]);
        }

        let symbol_value = FieldValue::from_json(&fields[self.rules.symbol.name]);
        let mut errors = check_field_data(&self.rules.symbol, symbol_value, None, source);

        // 型別錯誤時無法取得商品清單，其餘 symbol 錯誤仍需檢查唯一性
        if errors
            .iter()
            .any(|err| matches!(err, ValidationError::FieldType { .. }))
        {
            return MetadataOutcome::rejected(errors);
        }

        let symbols: Vec<String> = symbol_value
            .elements()
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect();

        if symbols.is_empty() {
            errors.push(ValidationError::EmptySymbolList {
                path: source.to_string(),
            });
        }

        let duplicates = find_duplicates(&symbols);
        if !duplicates.is_empty() {
            errors.push(ValidationError::DuplicateSymbols {
                path: source.to_string(),
                symbols: duplicates.join(", "),
            });
        }

        if !errors.is_empty() {
            return MetadataOutcome::rejected(errors);
        }

        for rule in &self.rules.fields {
            let value = FieldValue::from_json(&fields[rule.name]);
            errors.extend(check_field_data(rule, value, Some(symbols.len()), source));
        }

        let info = if errors.is_empty() {
            SymbolInfo::from_fields(fields)
        } else {
            None
        };

        debug!(
            "元數據 {} 宣告 {} 個商品，{} 個錯誤",
            source,
            symbols.len(),
            errors.len()
        );

        MetadataOutcome {
            symbols,
            info,
            errors,
        }
    }

    /// 比對欄位集合：超集報告多餘欄位，否則報告缺少的欄位
    fn check_field_set(&self, fields: &Map<String, Value>, source: &str) -> Option<ValidationError> {
        let expected = self.rules.expected_fields();
        let present: BTreeSet<&str> = fields.keys().map(String::as_str).collect();

        if present == expected {
            return None;
        }

        if present.is_superset(&expected) {
            let extra: Vec<&str> = present.difference(&expected).copied().collect();
            Some(ValidationError::UnexpectedFields {
                path: source.to_string(),
                fields: extra.join(", "),
            })
        } else {
            let missing: Vec<&str> = expected.difference(&present).copied().collect();
            Some(ValidationError::MissingFields {
                path: source.to_string(),
                fields: missing.join(", "),
            })
        }
    }
}

/// 依規則檢查單一欄位，每條違反的規則只產生一個錯誤
///
/// 型別不符時直接返回，其餘規則無法在錯誤型別上判斷。
pub fn check_field_data(
    rule: &FieldRule,
    value: FieldValue<'_>,
    expected_count: Option<usize>,
    source: &str,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let elements = value.elements();

    if !elements.iter().all(|element| rule.kind.matches(element)) {
        errors.push(ValidationError::FieldType {
            path: source.to_string(),
            field: rule.name.to_string(),
            kind: rule.kind.name(),
        });
        return errors;
    }

    if rule.max_length > 0
        && elements
            .iter()
            .any(|element| element_text(element).chars().count() > rule.max_length)
    {
        errors.push(ValidationError::FieldLength {
            path: source.to_string(),
            field: rule.name.to_string(),
            max_length: rule.max_length,
        });
    }

    if let Some(pattern) = &rule.pattern {
        if elements
            .iter()
            .any(|element| !pattern.is_match(&element_text(element)))
        {
            errors.push(ValidationError::FieldPattern {
                path: source.to_string(),
                field: rule.name.to_string(),
                pattern: pattern.as_str().to_string(),
            });
        }
    }

    if let (true, Some(expected)) = (rule.per_symbol, expected_count) {
        if value.len() != expected {
            errors.push(ValidationError::FieldCount {
                path: source.to_string(),
                field: rule.name.to_string(),
                expected,
                actual: value.len(),
            });
        }
    }

    errors
}

/// 找出重複的商品名稱，每個名稱只回報一次，依首次重複的順序
pub fn find_duplicates(symbols: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for symbol in symbols {
        if !seen.insert(symbol.as_str()) && reported.insert(symbol.as_str()) {
            duplicates.push(symbol.clone());
        }
    }

    duplicates
}

fn element_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    const SOURCE: &str = "symbol_info/demo.json";

    fn validate(document: Value) -> MetadataOutcome {
        let rules = MetadataRules::default();
        MetadataValidator::new(&rules).validate_document(&document, SOURCE)
    }

    fn valid_document() -> Value {
        json!({
            "symbol": ["AAPL", "BRK.B", "ES_1"],
            "description": ["Apple", "Berkshire", "E-mini"],
            "pricescale": [100, 100, 1],
            "currency": ["USD", "USD", ""]
        })
    }

    #[test]
    fn test_valid_document() {
        let outcome = validate(valid_document());
        assert!(outcome.is_valid(), "{:?}", outcome.errors);
        assert_eq!(outcome.symbols, vec!["AAPL", "BRK.B", "ES_1"]);

        let info = outcome.info.unwrap();
        assert_eq!(info.len(), 3);
        assert_eq!(info.find("ES_1").unwrap().currency, "");
    }

    #[test]
    fn test_scalar_document() {
        let outcome = validate(json!({
            "symbol": "AAPL",
            "description": "Apple",
            "pricescale": 10,
            "currency": "USD"
        }));
        assert!(outcome.is_valid());
        assert_eq!(outcome.symbols, vec!["AAPL"]);
    }

    #[test]
    fn test_missing_field() {
        let outcome = validate(json!({
            "symbol": "AAPL",
            "description": "Apple",
            "pricescale": 10
        }));
        assert!(outcome.symbols.is_empty());
        assert_eq!(
            outcome.errors,
            vec![ValidationError::MissingFields {
                path: SOURCE.to_string(),
                fields: "currency".to_string(),
            }]
        );
    }

    #[test]
    fn test_unexpected_field() {
        let mut document = valid_document();
        document["exchange"] = json!("NYSE");
        let outcome = validate(document);

        assert!(outcome.symbols.is_empty());
        assert_matches!(
            outcome.errors.as_slice(),
            [ValidationError::UnexpectedFields { fields, .. }] if fields == "exchange"
        );
    }

    #[test]
    fn test_not_an_object() {
        let outcome = validate(json!(["AAPL"]));
        assert_matches!(
            outcome.errors.as_slice(),
            [ValidationError::MetadataNotObject { .. }]
        );
    }

    #[test]
    fn test_symbol_errors_abort() {
        let mut document = valid_document();
        document["symbol"] = json!(["aapl", "MSFT", "MSFT"]);
        // 其他欄位的錯誤在 symbol 欄位不合法時不回報
        document["pricescale"] = json!([20, 20]);

        let outcome = validate(document);
        assert!(outcome.symbols.is_empty());
        assert_matches!(
            outcome.errors.as_slice(),
            [
                ValidationError::FieldPattern { field, .. },
                ValidationError::DuplicateSymbols { symbols, .. },
            ] if field == "symbol" && symbols == "MSFT"
        );
    }

    #[test]
    fn test_overlong_symbol_still_checks_duplicates() {
        let mut document = valid_document();
        let long = "A".repeat(129);
        document["symbol"] = json!([long.clone(), "MSFT", long]);
        let outcome = validate(document);

        let kinds: Vec<_> = outcome.errors.iter().map(ValidationError::kind).collect();
        assert_eq!(kinds, vec!["FieldLength", "DuplicateSymbols"]);
        assert!(outcome.symbols.is_empty());
    }

    #[test]
    fn test_symbol_type_short_circuits() {
        let mut document = valid_document();
        document["symbol"] = json!(["AAPL", 1]);
        let outcome = validate(document);

        assert_eq!(outcome.errors.len(), 1);
        assert_matches!(
            &outcome.errors[0],
            ValidationError::FieldType { field, kind: "string", .. } if field == "symbol"
        );
    }

    #[test]
    fn test_duplicate_symbols_reported_once() {
        let mut document = valid_document();
        document["symbol"] = json!(["AAPL", "MSFT", "AAPL", "AAPL", "MSFT", "IBM"]);
        let outcome = validate(document);

        assert!(outcome.symbols.is_empty());
        assert_matches!(
            outcome.errors.as_slice(),
            [ValidationError::DuplicateSymbols { symbols, .. }] if symbols == "AAPL, MSFT"
        );
    }

    #[test]
    fn test_empty_symbol_list() {
        let outcome = validate(json!({
            "symbol": [],
            "description": [],
            "pricescale": [],
            "currency": []
        }));
        assert_matches!(
            outcome.errors.as_slice(),
            [ValidationError::EmptySymbolList { .. }]
        );
    }

    #[test]
    fn test_field_errors_are_collected() {
        let mut document = valid_document();
        document["description"] = json!(["Apple", "x".repeat(129), "E-mini"]);
        document["pricescale"] = json!([100, 20, -10]);
        document["currency"] = json!(["USD", "usd"]);

        let outcome = validate(document);
        assert_eq!(outcome.symbols.len(), 3);
        assert!(outcome.info.is_none());

        let kinds: Vec<_> = outcome.errors.iter().map(ValidationError::kind).collect();
        assert_eq!(
            kinds,
            vec!["FieldLength", "FieldPattern", "FieldPattern", "FieldCount"]
        );
    }

    #[test]
    fn test_scalar_counts_as_one() {
        let mut document = valid_document();
        document["description"] = json!("Apple");
        let outcome = validate(document);

        assert_matches!(
            outcome.errors.as_slice(),
            [ValidationError::FieldCount { field, expected: 3, actual: 1, .. }] if field == "description"
        );
    }

    #[test]
    fn test_pricescale_type() {
        let mut document = valid_document();
        document["pricescale"] = json!([100, 100.0, "100"]);
        let outcome = validate(document);

        assert_matches!(
            outcome.errors.as_slice(),
            [ValidationError::FieldType { kind: "integer", .. }]
        );
    }

    #[test]
    fn test_boolean_pricescale_is_not_integer() {
        let mut document = valid_document();
        document["pricescale"] = json!([100, true, 1]);
        let outcome = validate(document);

        assert_matches!(
            outcome.errors.as_slice(),
            [ValidationError::FieldType { field, kind: "integer", .. }] if field == "pricescale"
        );
    }

    #[test]
    fn test_find_duplicates() {
        let symbols: Vec<String> = ["A", "B", "A", "C", "B", "A"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(find_duplicates(&symbols), vec!["A", "B"]);
        assert!(find_duplicates(&symbols[..2]).is_empty());
    }
}
