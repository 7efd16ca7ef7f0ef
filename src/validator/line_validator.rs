use super::error::ValidationError;
use super::rules::LineRules;
use crate::domain_types::{format_series_date, parse_series_date, DataRow};
use chrono::NaiveDate;

/// 每行欄位數：YYYYMMDDT, o, h, l, c, v
pub const FIELD_COUNT: usize = 6;
pub const COMMENT_MARKER: char = '#';
pub const FIELD_SEPARATOR: char = ',';

/// 單行檢查結果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineOutcome {
    pub messages: Vec<ValidationError>,
    /// 僅在結構與型別解析成功時存在，即使數值關係檢查失敗
    pub date: Option<NaiveDate>,
}

/// 序列文件的逐行驗證器
#[derive(Debug, Clone, Copy)]
pub struct LineValidator<'r> {
    rules: &'r LineRules,
}

impl<'r> LineValidator<'r> {
    pub fn new(rules: &'r LineRules) -> Self {
        Self { rules }
    }

    /// 檢查一行原始文字，`line_no` 從 1 開始
    pub fn check_line(&self, line: &str, path: &str, line_no: usize) -> LineOutcome {
        let mut outcome = LineOutcome::default();

        if line.starts_with(COMMENT_MARKER) {
            outcome.messages.push(ValidationError::CommentLine {
                path: path.to_string(),
                line: line_no,
            });
            return outcome;
        }

        if line.trim().is_empty() {
            outcome.messages.push(ValidationError::EmptyLine {
                path: path.to_string(),
                line: line_no,
            });
            return outcome;
        }

        let values: Vec<&str> = line.split(FIELD_SEPARATOR).collect();

        if values.iter().any(|value| value.trim().len() != value.len()) {
            outcome.messages.push(ValidationError::SurroundingWhitespace {
                path: path.to_string(),
                line: line_no,
            });
        }

        if values.len() != FIELD_COUNT {
            outcome.messages.push(ValidationError::FieldCountMismatch {
                path: path.to_string(),
                line: line_no,
                expected: FIELD_COUNT,
                actual: values.len(),
            });
            return outcome;
        }

        // 數值與日期兩個面向各自回報
        let numbers = self.parse_numbers(&values[1..]);
        let date = parse_series_date(values[0]);

        if numbers.is_none() {
            outcome.messages.push(ValidationError::InvalidNumber {
                path: path.to_string(),
                line: line_no,
            });
        }
        if date.is_none() {
            outcome.messages.push(ValidationError::InvalidDate {
                path: path.to_string(),
                line: line_no,
            });
        }

        let (Some([open, high, low, close, volume]), Some(date)) = (numbers, date) else {
            return outcome;
        };

        let row = DataRow {
            date,
            open,
            high,
            low,
            close,
            volume,
        };
        outcome.messages.extend(self.check_row(&row, path, line_no));
        outcome.date = Some(date);
        outcome
    }

    /// 數值關係與日期邊界，每條規則至多一個訊息
    pub fn check_row(&self, row: &DataRow, path: &str, line_no: usize) -> Vec<ValidationError> {
        let mut messages = Vec::new();

        if row.violates_ohlc() {
            messages.push(ValidationError::InvalidOhlc {
                path: path.to_string(),
                line: line_no,
            });
        }
        if row.has_negative_volume() {
            messages.push(ValidationError::NegativeVolume {
                path: path.to_string(),
                line: line_no,
            });
        }
        if row.date > self.rules.today {
            messages.push(ValidationError::FutureDate {
                path: path.to_string(),
                line: line_no,
            });
        }
        if row.date < self.rules.earliest {
            messages.push(ValidationError::DateTooEarly {
                path: path.to_string(),
                line: line_no,
                earliest: format_series_date(self.rules.earliest),
            });
        }

        messages
    }

    /// 嚴格解析五個數值欄位，先以正則排除 inf/nan 等寫法
    fn parse_numbers(&self, raw: &[&str]) -> Option<[f64; 5]> {
        let mut parsed = [0.0; 5];
        if raw.len() != parsed.len() {
            return None;
        }

        for (slot, value) in parsed.iter_mut().zip(raw) {
            if !self.rules.decimal.is_match(value) {
                return None;
            }
            let number: f64 = value.parse().ok()?;
            if !number.is_finite() {
                return None;
            }
            *slot = number;
        }

        Some(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    const PATH: &str = "data/AAPL.csv";

    fn rules() -> LineRules {
        LineRules::new(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap())
    }

    fn check(line: &str) -> LineOutcome {
        let rules = rules();
        LineValidator::new(&rules).check_line(line, PATH, 7)
    }

    fn kinds(outcome: &LineOutcome) -> Vec<&'static str> {
        outcome.messages.iter().map(ValidationError::kind).collect()
    }

    #[test]
    fn test_valid_line() {
        let outcome = check("20230102T,10,12,9,11,1000");
        assert!(outcome.messages.is_empty());
        assert_eq!(outcome.date, NaiveDate::from_ymd_opt(2023, 1, 2));
    }

    #[rstest]
    #[case("# header", "CommentLine")]
    #[case("#20230102T,10,12,9,11,1000", "CommentLine")]
    #[case("", "EmptyLine")]
    #[case("   \t", "EmptyLine")]
    #[case("20230102T,10,12,9,11", "FieldCountMismatch")]
    #[case("20230102T,10,12,9,11,1000,5", "FieldCountMismatch")]
    #[case("20230102T,10,12,9,11,nan", "InvalidNumber")]
    #[case("20230102T,inf,12,9,11,1", "InvalidNumber")]
    #[case("20230102T,10,12,9,11,1e3", "InvalidNumber")]
    #[case("20230102T,10.,12,9,11,1", "InvalidNumber")]
    #[case("2023012T,10,12,9,11,1", "InvalidDate")]
    #[case("20230132T,10,12,9,11,1", "InvalidDate")]
    #[case("2023-01-02,10,12,9,11,1", "InvalidDate")]
    #[case("20230102T,10,9,5,8,1", "InvalidOhlc")]
    #[case("20230102T,10,12,9,11,-1", "NegativeVolume")]
    #[case("20240701T,10,12,9,11,1", "FutureDate")]
    #[case("18991231T,10,12,9,11,1", "DateTooEarly")]
    fn test_single_violation(#[case] line: &str, #[case] expected: &str) {
        let outcome = check(line);
        assert_eq!(kinds(&outcome), vec![expected], "line: {line:?}");
    }

    #[test]
    fn test_whitespace_keeps_checking() {
        let outcome = check("20230102T, 10,12,9,11,1");
        assert_eq!(kinds(&outcome), vec!["SurroundingWhitespace", "InvalidNumber"]);
        assert_eq!(outcome.date, None);

        let outcome = check("20230102T,10,12,9,11,1\t");
        assert_eq!(kinds(&outcome), vec!["SurroundingWhitespace", "InvalidNumber"]);

        let outcome = check(" 20230102T,10 ,12");
        assert_eq!(
            kinds(&outcome),
            vec!["SurroundingWhitespace", "FieldCountMismatch"]
        );
    }

    #[test]
    fn test_both_axes_fail_independently() {
        let outcome = check("2023012T,abc,12,9,11,1");
        assert_eq!(kinds(&outcome), vec!["InvalidNumber", "InvalidDate"]);
        assert_eq!(outcome.date, None);
    }

    #[test]
    fn test_relational_failures_keep_date() {
        let outcome = check("20230102T,10,9,5,8,-1");
        assert_eq!(kinds(&outcome), vec!["InvalidOhlc", "NegativeVolume"]);
        assert_eq!(outcome.date, NaiveDate::from_ymd_opt(2023, 1, 2));
    }

    #[test]
    fn test_today_is_allowed() {
        let outcome = check("20240630T,1,1,1,1,0");
        assert!(outcome.messages.is_empty());
    }

    #[test]
    fn test_overflowing_number_is_invalid() {
        let huge = "9".repeat(400);
        let outcome = check(&format!("20230102T,1,{huge},1,1,1"));
        assert_eq!(kinds(&outcome), vec!["InvalidNumber"]);
    }

    #[test]
    fn test_message_mentions_line() {
        let outcome = check("20230102T,10,12,9,11");
        assert_matches!(
            &outcome.messages[0],
            ValidationError::FieldCountMismatch { line: 7, expected: 6, actual: 5, .. }
        );
        assert_eq!(
            outcome.messages[0].to_string(),
            "data/AAPL.csv:7 contains incorrect number of elements (expected: 6, actual: 5)"
        );
    }
}
