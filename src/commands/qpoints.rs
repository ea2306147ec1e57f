//! # qpoints 子命令实现
//!
//! 将 DDB 中的 q 点打印到终端或写入 CSV。
//!
//! ## 依赖关系
//! - 使用 `cli/qpoints.rs` 定义的参数
//! - 使用 `ddbtool::parsers::DdbFile`

use super::{fmt_vec3, parse_options};
use crate::cli::qpoints::QpointsArgs;
use ddbtool::error::{DdbError, Result};
use ddbtool::models::QPointList;
use ddbtool::parsers::DdbFile;
use ddbtool::utils::output;

use std::path::Path;

/// 执行 qpoints
pub fn execute(args: QpointsArgs) -> Result<()> {
    let ddb = DdbFile::open_with_options(&args.ddb, parse_options(&args.parse))?;
    let qpoints = ddb.qpoints();

    match &args.output {
        Some(path) => {
            save_qpoints_csv(qpoints, path)?;
            output::print_success(&format!(
                "{} q-points saved to '{}'",
                qpoints.len(),
                path.display()
            ));
        }
        None => {
            for (i, q) in qpoints.iter().enumerate() {
                println!("{:>4} {}", i, fmt_vec3(q));
            }
        }
    }

    Ok(())
}

/// 保存 q 点到 CSV
fn save_qpoints_csv(qpoints: &QPointList, output_path: &Path) -> Result<()> {
    let mut wtr = csv::Writer::from_path(output_path)?;

    wtr.write_record(["index", "qx", "qy", "qz"])?;
    for (i, q) in qpoints.iter().enumerate() {
        wtr.write_record(&[
            i.to_string(),
            format!("{:.10}", q[0]),
            format!("{:.10}", q[1]),
            format!("{:.10}", q[2]),
        ])?;
    }

    wtr.flush().map_err(|e| DdbError::FileWriteError {
        path: output_path.display().to_string(),
        source: e,
    })?;

    Ok(())
}
