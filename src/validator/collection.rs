//! 商品清單與數據目錄的交叉比對
//!
//! 兩種方向都支援：
//!
//! - [`CrossReference::SymbolList`]：逐一檢查宣告的商品是否有對應文件；
//! - [`CrossReference::DataDirectory`]：逐一檢查目錄中的文件，額外找出命名錯誤
//!   或未宣告的文件，最後回報沒有文件的商品。

use super::error::{ValidationError, ValidationWarning};
use super::report::ValidationReport;
use super::series_validator::SeriesValidator;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// 序列文件副檔名（比對時不分大小寫）
pub const SERIES_EXTENSION: &str = "csv";

/// 交叉比對方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossReference {
    #[default]
    SymbolList,
    DataDirectory,
}

/// 商品對應的序列文件路徑
pub fn series_path(data_dir: &Path, symbol: &str) -> PathBuf {
    data_dir.join(format!("{}.{}", symbol, SERIES_EXTENSION))
}

/// 從文件名取出商品代碼，文件名必須恰為 `<SYMBOL>.csv`
pub fn series_stem(file_name: &str) -> Option<&str> {
    let (stem, extension) = file_name.rsplit_once('.')?;
    if stem.is_empty() || !extension.eq_ignore_ascii_case(SERIES_EXTENSION) {
        return None;
    }
    Some(stem)
}

/// 集合層級驗證器
pub struct CollectionValidator<'r> {
    series: SeriesValidator<'r>,
    strategy: CrossReference,
    parallel: bool,
}

impl<'r> CollectionValidator<'r> {
    pub fn new(series: SeriesValidator<'r>) -> Self {
        Self {
            series,
            strategy: CrossReference::default(),
            parallel: false,
        }
    }

    pub fn with_strategy(mut self, strategy: CrossReference) -> Self {
        self.strategy = strategy;
        self
    }

    /// 以 rayon 並行驗證各文件，結果仍依原順序合併
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self, symbols: &[String], data_dir: &Path) -> ValidationReport {
        info!(
            "交叉比對 {} 個商品與 {}，方向: {:?}",
            symbols.len(),
            data_dir.display(),
            self.strategy
        );

        match self.strategy {
            CrossReference::SymbolList => self.walk_symbols(symbols, data_dir),
            CrossReference::DataDirectory => self.walk_directory(symbols, data_dir),
        }
    }

    fn walk_symbols(&self, symbols: &[String], data_dir: &Path) -> ValidationReport {
        let mut report = ValidationReport::new();
        let mut present = Vec::with_capacity(symbols.len());

        for symbol in symbols {
            let path = series_path(data_dir, symbol);
            if path.is_file() {
                present.push(path);
            } else {
                report.add_warning(ValidationWarning::MissingFile {
                    symbol: symbol.clone(),
                });
            }
        }

        report.extend_errors(self.validate_files(&present));
        report
    }

    fn walk_directory(&self, symbols: &[String], data_dir: &Path) -> ValidationReport {
        let mut report = ValidationReport::new();
        let declared: HashSet<&str> = symbols.iter().map(String::as_str).collect();
        let mut matched: HashSet<String> = HashSet::new();
        let mut to_validate = Vec::new();

        let entries = match list_files(data_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("數據目錄 {} 不存在", data_dir.display());
                Vec::new()
            }
            Err(e) => {
                report.add_error(ValidationError::FileUnreadable {
                    path: data_dir.display().to_string(),
                    reason: e.to_string(),
                });
                Vec::new()
            }
        };

        for (file_name, path) in entries {
            match series_stem(&file_name) {
                None => report.add_warning(ValidationWarning::MisnamedFile {
                    path: path.display().to_string(),
                }),
                Some(stem) if !declared.contains(stem) => {
                    report.add_warning(ValidationWarning::UndeclaredFile {
                        path: path.display().to_string(),
                    })
                }
                Some(stem) => {
                    matched.insert(stem.to_string());
                    to_validate.push(path);
                }
            }
        }

        report.extend_errors(self.validate_files(&to_validate));

        for symbol in symbols {
            if !matched.contains(symbol) {
                report.add_warning(ValidationWarning::MissingFile {
                    symbol: symbol.clone(),
                });
            }
        }

        report
    }

    /// 各文件互相獨立，不共享狀態
    fn validate_files(&self, paths: &[PathBuf]) -> Vec<ValidationError> {
        debug!("驗證 {} 個序列文件 (parallel: {})", paths.len(), self.parallel);

        let per_file: Vec<Vec<ValidationError>> = if self.parallel {
            paths
                .par_iter()
                .map(|path| self.series.validate_file(path))
                .collect()
        } else {
            paths
                .iter()
                .map(|path| self.series.validate_file(path))
                .collect()
        };

        per_file.into_iter().flatten().collect()
    }
}

/// 列出目錄中的一般文件，依文件名排序
fn list_files(dir: &Path) -> io::Result<Vec<(String, PathBuf)>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        files.push((name, entry.path()));
    }

    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}
