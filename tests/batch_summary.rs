//! 对目录中的多个 DDB 文件批量汇总

use ddbtool::batch::{BatchRunner, FileCollector, ProcessResult};
use ddbtool::parsers::{DdbFile, DdbSummary};

use std::fs;
use std::path::Path;

fn ddb_text(natom_line: &str, qpt: &str) -> String {
    format!(
        " **** DERIVATIVE DATABASE ****
+DDB, Version number    100401




{natom_line}
                nkpt         1
                nsym         1
                 kpt    0.0D+00 0.0D+00 0.0D+00
              symrel     1  0  0   0  1  0   0  0  1
                xred    0.0D+00 0.0D+00 0.0D+00
               znucl    0.2600000000000000D+02
 No information on the potentials yet
 qpt {qpt}
"
    )
}

fn summarize(path: &Path) -> ProcessResult<DdbSummary> {
    match DdbFile::open(path) {
        Ok(ddb) => ProcessResult::Success(ddb.summary()),
        Err(e) => ProcessResult::Failed(path.display().to_string(), e.to_string()),
    }
}

#[test]
fn test_summary_over_directory() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a_DDB"),
        ddb_text("               natom         1", "0.25 0.0 0.0 1.0"),
    )
    .unwrap();
    fs::write(
        dir.path().join("b_DDB"),
        ddb_text("               natom         1", "0.0 0.5 0.0 1.0"),
    )
    .unwrap();
    // natom 2 与 xred 长度不符
    fs::write(
        dir.path().join("c_DDB"),
        ddb_text("               natom         2", "0.0 0.0 0.0 1.0"),
    )
    .unwrap();
    fs::write(dir.path().join("run.abo"), "not a ddb").unwrap();

    let files = FileCollector::new(dir.path().to_path_buf())
        .with_pattern("*_DDB")
        .unwrap()
        .collect()
        .unwrap();
    assert_eq!(files.len(), 3);

    let result = BatchRunner::new(2)
        .quiet()
        .run(files, |f| summarize(f))
        .unwrap();

    assert_eq!(result.success(), 2);
    assert_eq!(result.failed(), 1);
    assert!(result.failures[0].0.ends_with("c_DDB"));
    assert!(result.failures[0].1.contains("xred"));

    assert_eq!(result.outputs[0].formula, "Fe");
    assert_eq!(result.outputs[0].ngqpt.as_deref(), Some("4 1 1"));
    assert_eq!(result.outputs[1].ngqpt.as_deref(), Some("1 2 1"));

    let mut wtr = csv::Writer::from_writer(Vec::new());
    for row in &result.outputs {
        wtr.serialize(row).unwrap();
    }
    let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("path,version,formula,natom,nsym,nqpt,ngqpt")
    );
    assert_eq!(lines.count(), 2);
}
