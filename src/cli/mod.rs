use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use time::Date;
use tracing::{debug, info, warn};

use crate::config::{self, EffectiveConfig};
use crate::core::Query;
use crate::exit::ExitCode;
use crate::export::Layout;
use crate::fetch::{CatalogFetcher, FetchOptions, HttpOptions, HttpPageSource};
use crate::logs::LogConfig;

#[derive(Debug, Parser)]
#[command(
    name = "rules-extract",
    version,
    about = "SonarQube のルールカタログを検索し、全件を Excel (xlsx) に書き出す",
    disable_help_flag = true
)]
pub struct Cli {
    /// 詳細なログ（info）を出力する
    #[arg(short = 'v')]
    pub verbose: bool,
    /// このヘルプを表示する
    #[arg(short = 'h', long = "help")]
    pub help: bool,
    /// 対象言語コード（カンマ区切りで複数指定可、既定: java）
    #[arg(short = 'l', value_name = "LANGS")]
    pub language: Option<String>,
    /// 検索 API の URI（既定: 公開 SonarQube の検索 API）
    #[arg(short = 's', value_name = "URI")]
    pub search_uri: Option<String>,
    /// この日付以降に追加されたルールに限定する（YYYY-MM-DD）
    #[arg(short = 'd', value_name = "DATE", value_parser = parse_date_arg)]
    pub date: Option<Date>,
    /// 出力先（ファイル、または既存ディレクトリ）
    #[arg(short = 'o', value_name = "PATH")]
    pub output: Option<PathBuf>,
    /// 出力する列名（カンマ区切り）
    #[arg(short = 'e', value_name = "HEADERS", value_delimiter = ',')]
    pub headers: Vec<String>,
    /// 名前付きテーブル（縞模様の行）として書き出す
    #[arg(long)]
    pub table: bool,
    /// HTTP リクエストのタイムアウト（秒）
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,
    /// 設定ファイルのパス
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractRequest {
    pub query: Query,
    pub columns: Vec<String>,
    pub layout: Layout,
    pub output: PathBuf,
    pub timeout: Duration,
}

impl ExtractRequest {
    pub fn resolve(cli: &Cli, cfg: &EffectiveConfig) -> Result<Self> {
        let Some(output) = cli.output.clone() else {
            return Err(crate::exit::invalid_args(
                "-o（出力先）は必須です。`-help` で使い方を確認してください",
            ));
        };

        let language = cli
            .language
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&cfg.search.language)
            .to_string();
        let uri = cli
            .search_uri
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&cfg.search.uri)
            .to_string();

        let columns: Vec<String> = cli
            .headers
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        let columns = if columns.is_empty() {
            cfg.export.columns.clone()
        } else {
            columns
        };

        let layout = if cli.table {
            Layout::Table
        } else {
            cfg.export.layout
        };

        let timeout_secs = cli.timeout.unwrap_or(cfg.search.timeout_secs);
        if timeout_secs == 0 {
            return Err(crate::exit::invalid_args(
                "--timeout は 0 より大きい必要があります",
            ));
        }

        Ok(Self {
            query: Query::new(uri, language).with_available_since(cli.date),
            columns,
            layout,
            output,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    run_with(cli)
}

pub fn run_with(cli: Cli) -> Result<ExitCode> {
    if cli.help {
        let help = Cli::command().render_help();
        println!("{help}");
        return Ok(ExitCode::Usage);
    }

    crate::logs::init(LogConfig {
        verbose: cli.verbose,
    });

    let env_config_path = std::env::var_os("RULES_EXTRACT_CONFIG").map(PathBuf::from);
    let home_dir = config::home_dir();
    let cfg = config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        home_dir.as_deref(),
    )
    .map_err(crate::exit::invalid_args_err)?;

    let request = ExtractRequest::resolve(&cli, &cfg)?;
    debug!(?request, config_path = ?cfg.config_path, "resolved request");

    let source = HttpPageSource::new(&HttpOptions {
        timeout: request.timeout,
    });
    let mut fetcher = CatalogFetcher::new(
        source,
        FetchOptions {
            show_progress: !cli.verbose,
        },
    );
    let rules = fetcher
        .fetch(&request.query)
        .with_context(|| format!("ルールの取得に失敗しました: {}", request.query.base_uri))?;

    if rules.is_empty() {
        warn!(
            language = %request.query.language,
            "ルールが見つかりませんでした。ファイルは生成しません"
        );
        return Ok(ExitCode::NoRecords);
    }
    info!("{} 件のルールが見つかりました", rules.len());

    let bytes = crate::export::export(&rules, &request.columns, request.layout)
        .context("ブックの生成に失敗しました")?;
    let path = crate::export::write_output(&request.output, &request.query.language, &bytes)?;
    info!(path = %path.display(), layout = %request.layout, "ファイルを生成しました");

    crate::ui::print_summary(&mut io::stdout().lock(), rules.len(), &path);
    Ok(ExitCode::Success)
}

pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            if arg == "-help" {
                OsString::from("--help")
            } else {
                arg
            }
        })
        .collect()
}

fn parse_date_arg(s: &str) -> Result<Date, String> {
    crate::core::parse_cutoff_date(s).map_err(|e| format!("{e:#}"))
}
