// ==========================================
// 加密货币行情数据质量校验系统 - 命令行入口
// ==========================================
// 用法:
//   crypto-market-dq <file>... [--db PATH] [--out DIR]
//   crypto-market-dq --flagged <flagged.csv>
//   crypto-market-dq --history 10
// 退出码: 任一报告 failed 或任一文件读取失败 → 1
// ==========================================

use clap::Parser;
use crypto_market_dq::api::{ApiResult, ValidationApi, ValidationRunResult};
use crypto_market_dq::app::{get_default_data_dir, get_default_db_path, ENV_DATA_DIR, ENV_DB_PATH};
use crypto_market_dq::{logging, APP_NAME, VERSION};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "crypto-market-dq")]
#[command(about = "加密货币行情数据质量校验: 结构闸门 + 质量规则 + 质量报告")]
#[command(version)]
struct Cli {
    /// 待校验的行情快照文件（.csv / .xlsx / .xls / .json）
    files: Vec<PathBuf>,

    /// SQLite 数据库路径（配置覆写项与运行记录）
    #[arg(long, env = ENV_DB_PATH)]
    db: Option<String>,

    /// 快照与报告导出根目录
    #[arg(long, env = ENV_DATA_DIR)]
    out: Option<PathBuf>,

    /// 不导出快照文件
    #[arg(long)]
    no_export: bool,

    /// 输入为已标记快照（CSV/Excel），只生成报告不重跑规则
    #[arg(long)]
    flagged: bool,

    /// 列出最近 N 次运行记录
    #[arg(long, value_name = "N")]
    history: Option<usize>,
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(rendered) => println!("{}", rendered),
        Err(e) => error!(error = %e, "输出序列化失败"),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    info!("{} v{}", APP_NAME, VERSION);

    let db_path = cli.db.unwrap_or_else(get_default_db_path);
    let out_dir = if cli.no_export {
        None
    } else {
        Some(cli.out.unwrap_or_else(get_default_data_dir))
    };
    info!(db_path = %db_path, out_dir = ?out_dir, "运行参数");

    let api = match ValidationApi::from_db_path(&db_path, out_dir).await {
        Ok(api) => api,
        Err(e) => {
            error!(error = %e, "初始化失败");
            return ExitCode::FAILURE;
        }
    };

    if let Some(limit) = cli.history {
        return match api.list_recent_runs(limit).await {
            Ok(runs) => {
                print_json(&runs);
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!(error = %e, "运行记录查询失败");
                ExitCode::FAILURE
            }
        };
    }

    if cli.files.is_empty() {
        error!("未指定待校验文件");
        return ExitCode::FAILURE;
    }

    let results: Vec<ApiResult<ValidationRunResult>> = if cli.flagged {
        let mut results = Vec::with_capacity(cli.files.len());
        for path in &cli.files {
            results.push(api.report_flagged_snapshot(path).await);
        }
        results
    } else {
        api.validate_files(&cli.files).await
    };

    let mut any_failed = false;
    for (path, result) in cli.files.iter().zip(results) {
        match result {
            Ok(run) => {
                any_failed |= run.is_failed();
                print_json(&run.report);
            }
            Err(e) => {
                any_failed = true;
                error!(file = %path.display(), error = %e, "校验未能完成");
            }
        }
    }

    if any_failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_files_and_flags() {
        let cli = Cli::parse_from([
            "crypto-market-dq",
            "a.csv",
            "b.json",
            "--db",
            "/tmp/dq.db",
            "--no-export",
        ]);
        assert_eq!(cli.files.len(), 2);
        assert_eq!(cli.db.as_deref(), Some("/tmp/dq.db"));
        assert!(cli.no_export);
        assert!(!cli.flagged);
    }
}
