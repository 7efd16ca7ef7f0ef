use super::error::ValidationError;
use super::line_validator::LineValidator;
use super::rules::LineRules;
use crate::domain_types::format_series_date;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// 單一序列文件的日期追蹤狀態
///
/// 重複與亂序各自只回報第一次。
#[derive(Debug, Default)]
pub struct SeriesState {
    seen: HashSet<NaiveDate>,
    last_date: Option<NaiveDate>,
    duplicate_reported: bool,
    unordered_reported: bool,
}

impl SeriesState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追蹤一個已解析的日期，回傳本行產生的序列錯誤
    pub fn track(&mut self, date: NaiveDate, path: &str, line_no: usize) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if !self.duplicate_reported && self.seen.contains(&date) {
            self.duplicate_reported = true;
            errors.push(ValidationError::DuplicateDate {
                path: path.to_string(),
                date: format_series_date(date),
                line: line_no,
            });
        }

        if !self.unordered_reported && self.last_date.is_some_and(|last| date < last) {
            self.unordered_reported = true;
            errors.push(ValidationError::UnorderedDate {
                path: path.to_string(),
                date: format_series_date(date),
                line: line_no,
            });
        }

        self.last_date = Some(date);
        self.seen.insert(date);
        errors
    }

    /// 已接受的不同日期數量
    pub fn distinct_dates(&self) -> usize {
        self.seen.len()
    }
}

/// 序列文件驗證器
///
/// 逐行串流讀取，單行錯誤不會中止整個文件。
#[derive(Debug, Clone, Copy)]
pub struct SeriesValidator<'r> {
    lines: LineValidator<'r>,
}

impl<'r> SeriesValidator<'r> {
    pub fn new(rules: &'r LineRules) -> Self {
        Self {
            lines: LineValidator::new(rules),
        }
    }

    /// 驗證磁碟上的序列文件
    pub fn validate_file(&self, path: &Path) -> Vec<ValidationError> {
        let display = path.display().to_string();

        match File::open(path) {
            Ok(file) => self.validate_reader(BufReader::new(file), &display),
            Err(e) => vec![ValidationError::FileUnreadable {
                path: display,
                reason: e.to_string(),
            }],
        }
    }

    /// 驗證任意輸入串流
    ///
    /// 以 `\n` 斷行並接受 `\r\n` 結尾；行中其他位置的 `\r` 仍視為欄位周圍的空白。
    pub fn validate_reader<R: BufRead>(&self, reader: R, path: &str) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        let mut state = SeriesState::new();
        let mut line_count = 0;

        for (index, chunk) in reader.split(b'\n').enumerate() {
            let line_no = index + 1;
            line_count = line_no;

            let mut bytes = match chunk {
                Ok(bytes) => bytes,
                Err(e) => {
                    errors.push(ValidationError::FileUnreadable {
                        path: path.to_string(),
                        reason: e.to_string(),
                    });
                    break;
                }
            };

            // CRLF
            if bytes.last() == Some(&b'\r') {
                bytes.pop();
            }

            let Ok(line) = String::from_utf8(bytes) else {
                errors.push(ValidationError::InvalidEncoding {
                    path: path.to_string(),
                    line: line_no,
                });
                continue;
            };

            let outcome = self.lines.check_line(&line, path, line_no);
            errors.extend(outcome.messages);

            if let Some(date) = outcome.date {
                errors.extend(state.track(date, path, line_no));
            }
        }

        debug!(
            "{}: {} 行，{} 個不同日期，{} 個錯誤",
            path,
            line_count,
            state.distinct_dates(),
            errors.len()
        );

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::io::Cursor;

    const PATH: &str = "data/AAPL.csv";

    fn validate(content: &str) -> Vec<ValidationError> {
        let rules = LineRules::new(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        SeriesValidator::new(&rules).validate_reader(Cursor::new(content.as_bytes()), PATH)
    }

    #[test]
    fn test_clean_file() {
        let errors = validate(
            "20230101T,10,12,9,11,100\n\
             20230102T,11,13,10,12,200\n\
             20230103T,12,12,12,12,0\n",
        );
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_unordered_dates() {
        let errors = validate("20230102T,1,1,1,1,1\n20230101T,1,1,1,1,1\n");
        assert_eq!(errors.len(), 1);
        assert_matches!(
            &errors[0],
            ValidationError::UnorderedDate { line: 2, date, .. } if date == "20230101T"
        );
    }

    #[test]
    fn test_duplicate_dates_first_only() {
        let errors = validate(
            "20230101T,1,1,1,1,1\n\
             20230101T,1,1,1,1,1\n\
             20230102T,1,1,1,1,1\n\
             20230102T,1,1,1,1,1\n\
             20230101T,1,1,1,1,1\n",
        );
        let kinds: Vec<_> = errors.iter().map(ValidationError::kind).collect();
        assert_eq!(kinds, vec!["DuplicateDate", "UnorderedDate"]);
        assert_matches!(&errors[0], ValidationError::DuplicateDate { line: 2, .. });
        assert_matches!(&errors[1], ValidationError::UnorderedDate { line: 5, .. });
    }

    #[test]
    fn test_invalid_rows_skip_date_tracking() {
        // 第二行解析失敗，不參與順序判斷
        let errors = validate(
            "20230103T,1,1,1,1,1\n\
             20230101T,x,1,1,1,1\n\
             20230104T,1,1,1,1,1\n",
        );
        assert_eq!(errors.len(), 1);
        assert_matches!(&errors[0], ValidationError::InvalidNumber { line: 2, .. });
    }

    #[test]
    fn test_relational_errors_still_tracked() {
        let errors = validate("20230102T,10,9,5,8,1\n20230102T,1,1,1,1,1\n");
        let kinds: Vec<_> = errors.iter().map(ValidationError::kind).collect();
        assert_eq!(kinds, vec!["InvalidOhlc", "DuplicateDate"]);
    }

    #[test]
    fn test_line_errors_continue() {
        let errors = validate("# comment\n\n20230101T,1,1,1,1,1\n");
        let kinds: Vec<_> = errors.iter().map(ValidationError::kind).collect();
        assert_eq!(kinds, vec!["CommentLine", "EmptyLine"]);
        assert_eq!(errors[1].line(), Some(2));
    }

    #[test]
    fn test_crlf_line_endings() {
        let errors = validate(
            "20230101T,1,1,1,1,1\r\n\
             20230102T,1,1,1,1,1\r\n\
             20230101T,1,1,1,1,1\r\n",
        );
        assert_eq!(errors.len(), 1);
        assert_matches!(
            &errors[0],
            ValidationError::UnorderedDate { line: 3, date, .. } if date == "20230101T"
        );
    }

    #[test]
    fn test_stray_carriage_return_is_whitespace() {
        let errors = validate("20230101T,1,1,1,1,1\r\r\n20230101T\r,1,1,1,1,1\n");
        let kinds: Vec<_> = errors.iter().map(ValidationError::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "SurroundingWhitespace",
                "InvalidNumber",
                "SurroundingWhitespace",
                "InvalidDate"
            ]
        );
    }

    #[test]
    fn test_invalid_utf8_line() {
        let rules = LineRules::new(NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        let content: &[u8] = b"20230101T,1,1,1,1,1\n\xff\xfe\n20230102T,1,1,1,1,1\n";
        let errors = SeriesValidator::new(&rules).validate_reader(Cursor::new(content), PATH);

        assert_eq!(errors.len(), 1);
        assert_matches!(&errors[0], ValidationError::InvalidEncoding { line: 2, .. });
    }

    #[test]
    fn test_missing_file() {
        let rules = LineRules::default();
        let errors = SeriesValidator::new(&rules).validate_file(Path::new("/nonexistent/X.csv"));
        assert_matches!(errors.as_slice(), [ValidationError::FileUnreadable { .. }]);
    }

    #[test]
    fn test_state_tracks_both_offenses_on_one_line() {
        let mut state = SeriesState::new();
        let d = |day| NaiveDate::from_ymd_opt(2023, 1, day).unwrap();

        assert!(state.track(d(1), PATH, 1).is_empty());
        assert!(state.track(d(3), PATH, 2).is_empty());
        let errors = state.track(d(1), PATH, 3);
        assert_eq!(errors.len(), 2);
        assert!(state.track(d(1), PATH, 4).is_empty());
        assert_eq!(state.distinct_dates(), 2);
    }
}
