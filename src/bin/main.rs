use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use seed_data_check::config::{ApplicationConfig, LogConfig, Validator};
use seed_data_check::validator::{CrossReference, DatasetValidator, ReportFormatter};
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// 商品元數據與日線序列的數據源契約檢查
#[derive(Debug, Parser)]
#[command(name = "seed_data_check", version, about)]
struct Cli {
    /// TOML 配置文件
    #[arg(long)]
    config: Option<PathBuf>,

    /// 元數據分組，對應 symbol_info/<GROUP>.json
    #[arg(long)]
    group: Option<String>,

    /// 倉庫根目錄
    #[arg(long)]
    root: Option<PathBuf>,

    /// 交叉比對方向
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// 並行驗證序列文件
    #[arg(long)]
    parallel: bool,

    /// 錯誤輸出文件（附加寫入），預設為標準輸出
    #[arg(long)]
    report_file: Option<PathBuf>,

    /// 警告輸出文件（附加寫入），預設為標準錯誤
    #[arg(long)]
    warnings_file: Option<PathBuf>,

    /// 以 JSON 輸出摘要
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// 逐一檢查宣告的商品
    Symbols,
    /// 逐一檢查數據目錄中的文件
    Files,
}

impl From<StrategyArg> for CrossReference {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Symbols => CrossReference::SymbolList,
            StrategyArg::Files => CrossReference::DataDirectory,
        }
    }
}

impl Cli {
    /// 命令列參數覆寫配置
    fn apply(&self, config: &mut ApplicationConfig) {
        if let Some(group) = &self.group {
            config.check.group = group.clone();
        }
        if let Some(root) = &self.root {
            config.check.root = root.display().to_string();
        }
        if let Some(strategy) = self.strategy {
            config.check.strategy = strategy.into();
        }
        if self.parallel {
            config.check.parallel = true;
        }
        if let Some(path) = &self.report_file {
            config.report.report_file = Some(path.display().to_string());
        }
        if let Some(path) = &self.warnings_file {
            config.report.warnings_file = Some(path.display().to_string());
        }
        if self.json {
            config.report.json = true;
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::from(2)
        }
    }
}

/// 執行檢查，回傳數據是否通過
fn run(cli: &Cli) -> Result<bool> {
    // 初始化配置
    let mut app_config =
        ApplicationConfig::load(cli.config.as_deref()).context("無法加載配置")?;
    cli.apply(&mut app_config);
    app_config
        .validate()
        .map_err(|e| anyhow!("配置驗證失敗: {}", e))?;

    // 初始化日誌系統
    init_logging(&app_config.log)?;

    let check = &app_config.check;
    let validator = DatasetValidator::from_config(check)?;
    let report = validator.run(&check.metadata_path(), &check.data_path());
    let formatter = ReportFormatter::new(app_config.report.truncation());
    let report_file = app_config.report.report_file.as_deref().map(Path::new);
    let warnings_file = app_config.report.warnings_file.as_deref().map(Path::new);

    if app_config.report.json {
        let json = formatter.format_json(&report)?;
        emit(report_file, &json, Stream::Stdout)?;
    } else {
        if let Some(text) = formatter.format_warnings(&report) {
            emit(warnings_file, &text, Stream::Stderr)?;
        }
        if let Some(text) = formatter.format_errors(&report) {
            emit(report_file, &text, Stream::Stdout)?;
        }
    }

    info!(
        "檢查結束: {} 個錯誤，{} 個警告",
        report.error_count(),
        report.warning_count()
    );
    Ok(!report.has_errors())
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// 寫到指定文件（附加），否則寫到標準串流
fn emit(path: Option<&Path>, text: &str, fallback: Stream) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("無法開啟輸出文件 {}", path.display()))?;
            writeln!(file, "{}", text)?;
        }
        None => match fallback {
            Stream::Stdout => writeln!(io::stdout().lock(), "{}", text)?,
            Stream::Stderr => writeln!(io::stderr().lock(), "{}", text)?,
        },
    }
    Ok(())
}

// 初始化日誌系統
fn init_logging(log_config: &LogConfig) -> Result<()> {
    // RUST_LOG 優先，否則使用配置中的級別
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_config.level.to_lowercase()));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr);

    let result = if log_config.format.eq_ignore_ascii_case("compact") {
        tracing::subscriber::set_global_default(builder.compact().finish())
    } else {
        tracing::subscriber::set_global_default(builder.finish())
    };
    result.map_err(|e| anyhow!("設置日誌系統失敗: {}", e))?;

    info!("日誌系統初始化完成");
    Ok(())
}
