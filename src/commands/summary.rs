//! # summary 子命令实现
//!
//! 并行读取目录中的所有 DDB 文件，打印概要表格并写入 CSV。
//! 单个文件解析失败不会中断整个批次。
//!
//! ## 依赖关系
//! - 使用 `cli/summary.rs` 定义的参数
//! - 使用 `ddbtool::batch` 收集文件并并行处理
//! - 使用 `utils/output.rs`

use super::parse_options;
use crate::cli::summary::SummaryArgs;
use ddbtool::batch::{BatchRunner, FileCollector, ProcessResult};
use ddbtool::error::{DdbError, Result};
use ddbtool::parsers::{DdbFile, DdbSummary, ParseOptions};
use ddbtool::utils::output;

use std::path::{Path, PathBuf};
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "File")]
    file: String,
    #[tabled(rename = "Version")]
    version: i64,
    #[tabled(rename = "Formula")]
    formula: String,
    #[tabled(rename = "natom")]
    natom: usize,
    #[tabled(rename = "nsym")]
    nsym: usize,
    #[tabled(rename = "nqpt")]
    nqpt: usize,
    #[tabled(rename = "q-mesh")]
    ngqpt: String,
}

impl From<&DdbSummary> for SummaryRow {
    fn from(s: &DdbSummary) -> Self {
        let file = Path::new(&s.path)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| s.path.clone());
        SummaryRow {
            file,
            version: s.version,
            formula: s.formula.clone(),
            natom: s.natom,
            nsym: s.nsym,
            nqpt: s.nqpt,
            ngqpt: s.ngqpt.clone().unwrap_or_else(|| "-".to_string()),
        }
    }
}

/// 执行 summary
pub fn execute(args: SummaryArgs) -> Result<()> {
    output::print_header("DDB Summary");

    let files = FileCollector::new(args.input.clone())
        .with_pattern(&args.pattern)?
        .recursive(args.recursive)
        .collect()?;

    if files.is_empty() {
        return Err(DdbError::NoFilesFound {
            pattern: args.pattern.clone(),
        });
    }

    output::print_info(&format!("Found {} DDB files", files.len()));

    let options = parse_options(&args.parse);
    let runner = BatchRunner::new(args.jobs);
    let result = runner.run(files, |file| summarize_file(file, &options))?;

    if !result.outputs.is_empty() {
        let rows: Vec<SummaryRow> = result.outputs.iter().map(SummaryRow::from).collect();
        println!("{}", Table::new(&rows));
        save_summary_csv(&result.outputs, &args.output)?;
        output::print_success(&format!("Summary saved to '{}'", args.output.display()));
    }

    output::print_separator();
    output::print_done(&format!(
        "Batch complete: {} success, {} skipped, {} failed",
        result.success(),
        result.skipped,
        result.failed()
    ));

    if !result.failures.is_empty() {
        output::print_warning("Failed files:");
        for (path, err) in result.failures.iter().take(10) {
            output::print_error(&format!("  {}: {}", path, err));
        }
        if result.failures.len() > 10 {
            output::print_warning(&format!("  ... and {} more", result.failures.len() - 10));
        }
    }

    Ok(())
}

/// 处理批量模式中的单个文件
fn summarize_file(path: &PathBuf, options: &ParseOptions) -> ProcessResult<DdbSummary> {
    if is_empty_file(path) {
        return ProcessResult::Skipped(path.display().to_string());
    }

    match DdbFile::open_with_options(path, options.clone()) {
        Ok(ddb) => ProcessResult::Success(ddb.summary()),
        Err(e) => ProcessResult::Failed(path.display().to_string(), e.to_string()),
    }
}

fn is_empty_file(path: &Path) -> bool {
    path.metadata().map(|m| m.len() == 0).unwrap_or(false)
}

/// 保存概要到 CSV
fn save_summary_csv(rows: &[DdbSummary], output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush().map_err(|e| DdbError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;
    Ok(())
}
