//! # DDB 文件会话
//!
//! 打开一个 DDB 文件，一次性构建头部、晶体结构与 q 点列表，
//! 并以只读借用的方式提供给调用者。q 网格推断按需计算并缓存。
//!
//! ## 依赖关系
//! - 被 `commands/` 与外部调用者使用
//! - 使用 `parsers/header.rs`, `parsers/qpoints.rs`, `models/`, `phonon/`, `anaddb/`

use super::header::{DdbHeader, HeaderValue};
use super::options::ParseOptions;
use super::qpoints::extract_qpoints;
use crate::anaddb::{AnaddbInput, AnaddbOptions, PhbandsDosParams, PostProcessor, TensorSource};
use crate::error::{DdbError, Result};
use crate::models::{Crystal, QPointList, QSelector};
use crate::phonon::becs::Becs;
use crate::phonon::mesh::{guess_ngqpt, MeshGuess};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// 单个 DDB 文件的概要，用于批量汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdbSummary {
    pub path: String,
    pub version: i64,
    pub formula: String,
    pub natom: usize,
    pub nsym: usize,
    pub nqpt: usize,
    /// 推断的 q 网格，无法推断时为空
    pub ngqpt: Option<String>,
}

/// 已解析的 DDB 文件
#[derive(Debug)]
pub struct DdbFile {
    path: PathBuf,
    content: String,
    options: ParseOptions,
    header: DdbHeader,
    structure: Crystal,
    qpoints: QPointList,
    mesh: OnceLock<MeshGuess>,
}

impl DdbFile {
    /// 以默认选项打开 DDB 文件
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    pub fn open_with_options(path: &Path, options: ParseOptions) -> Result<Self> {
        if !path.exists() {
            return Err(DdbError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).map_err(|e| DdbError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_content(content, path, options)
    }

    /// 从内存中的文本构建；`path` 仅用于显示和提交外部任务
    pub fn from_content(
        content: impl Into<String>,
        path: impl AsRef<Path>,
        options: ParseOptions,
    ) -> Result<Self> {
        let content = content.into();
        let path = path.as_ref().to_path_buf();

        let header = DdbHeader::parse(&content, &options)?;
        let structure = Crystal::from_header(&header)?;
        let qpoints = extract_qpoints(&content, &options.qpoint_marker)?;

        debug!(
            "opened {}: version {}, {} atoms, {} symmetry ops, {} q-points",
            path.display(),
            header.version,
            header.natom,
            structure.spacegroup.len(),
            qpoints.len()
        );

        Ok(DdbFile {
            path,
            content,
            options,
            header,
            structure,
            qpoints,
            mesh: OnceLock::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    pub fn header(&self) -> &DdbHeader {
        &self.header
    }

    pub fn version(&self) -> i64 {
        self.header.version
    }

    pub fn natom(&self) -> usize {
        self.header.natom
    }

    pub fn structure(&self) -> &Crystal {
        &self.structure
    }

    pub fn qpoints(&self) -> &QPointList {
        &self.qpoints
    }

    /// q 点在列表中的序号
    pub fn qindex(&self, selector: QSelector) -> Result<usize> {
        self.qpoints.qindex(selector)
    }

    /// 推断出的 q 网格；首次调用时计算
    pub fn guessed_ngqpt(&self) -> Result<MeshGuess> {
        if let Some(mesh) = self.mesh.get() {
            return Ok(*mesh);
        }
        let mesh = guess_ngqpt(&self.qpoints, &self.structure.spacegroup)?;
        Ok(*self.mesh.get_or_init(|| mesh))
    }

    /// 头部中的收敛参数
    pub fn params(&self) -> BTreeMap<String, HeaderValue> {
        self.header.params()
    }

    pub fn summary(&self) -> DdbSummary {
        let ngqpt = match self.guessed_ngqpt() {
            Ok(mesh) => Some(mesh.to_string()),
            Err(e) => {
                warn!("{}: {}", self.path.display(), e);
                None
            }
        };

        DdbSummary {
            path: self.path.display().to_string(),
            version: self.header.version,
            formula: self.structure.formula(),
            natom: self.header.natom,
            nsym: self.structure.spacegroup.len(),
            nqpt: self.qpoints.len(),
            ngqpt,
        }
    }

    /// 计算单个 q 点的声子模式
    ///
    /// 先校验 q 点选择，再提交外部任务。
    pub fn anaget_phmodes_at_qpoint<P: PostProcessor>(
        &self,
        runner: &P,
        selector: Option<QSelector>,
        opts: AnaddbOptions,
    ) -> Result<P::Output> {
        let qpoint = self.qpoints.select(selector)?;
        let input = AnaddbInput::modes_at_qpoint(&self.structure, qpoint, opts);
        info!(
            "running phonon modes at q = [{:.6}, {:.6}, {:.6}]",
            qpoint[0], qpoint[1], qpoint[2]
        );
        self.submit(runner, &input)
    }

    /// 计算声子能带与态密度；未给出网格时使用推断值
    pub fn anaget_phbands_and_dos<P: PostProcessor>(
        &self,
        runner: &P,
        ngqpt: Option<[i64; 3]>,
        params: PhbandsDosParams,
        opts: AnaddbOptions,
    ) -> Result<P::Output> {
        let ngqpt = match ngqpt {
            Some(n) => n,
            None => self.guessed_ngqpt()?.as_array(),
        };
        let input = AnaddbInput::phbands_and_dos(&self.structure, ngqpt, params, opts);
        info!("running phonon bands and DOS with ngqpt = {:?}", ngqpt);
        self.submit(runner, &input)
    }

    /// 计算宏观介电张量与 Born 有效电荷
    pub fn anaget_emacro_and_becs<P>(&self, runner: &P, chneut: i64) -> Result<([[f64; 3]; 3], Becs)>
    where
        P: PostProcessor,
        P::Output: TensorSource,
    {
        let input = AnaddbInput::emacro_and_becs(&self.structure, chneut);
        let output = self.submit(runner, &input)?;

        let emacro = output.emacro()?;
        let (raw, layout) = output.becs()?;
        let becs = Becs::new(raw, &self.structure, layout)?;
        Ok((emacro, becs))
    }

    fn submit<P: PostProcessor>(&self, runner: &P, input: &AnaddbInput) -> Result<P::Output> {
        runner
            .run(&self.path, input)
            .map_err(DdbError::TaskFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anaddb::{ControlValue, Diagnostic, JobReport, Severity};
    use crate::phonon::becs::BecsLayout;
    use std::cell::RefCell;

    const SI_DDB: &str = r#" **** DERIVATIVE DATABASE ****
+DDB, Version number    100401

 Description of the run that generated this DDB

 ----
                usepaw         0
               natom         2
                nkpt         1
                nsym         2
              ntypat         1
               acell    0.1020000000000000D+02  0.1020000000000000D+02  0.1020000000000000D+02
               rprim    0.0000000000000000D+00  0.5000000000000000D+00  0.5000000000000000D+00
                        0.5000000000000000D+00  0.0000000000000000D+00  0.5000000000000000D+00
                        0.5000000000000000D+00  0.5000000000000000D+00  0.0000000000000000D+00
                 kpt    0.0D+00  0.0D+00  0.0D+00
              symrel     1  0  0   0  1  0   0  0  1
                        -1  0  0   0 -1  0   0  0 -1
               typat     1  1
                xred    0.0D+00  0.0D+00  0.0D+00
                        0.25D+00  0.25D+00  0.25D+00
               znucl    0.1400000000000000D+02
                ecut    0.6000000000000000D+01
 No information on the potentials yet

 2nd derivatives (non-stat.)  - # elements :      36
 qpt  0.00000000E+00  0.00000000E+00  0.00000000E+00   1.0
   1   1   1   1  0.1D+00  0.0D+00

 2nd derivatives (non-stat.)  - # elements :      36
 qpt  2.50000000E-01  0.00000000E+00  0.00000000E+00   1.0
   1   1   1   1  0.1D+00  0.0D+00
 qpt  2.50000000E-01  0.00000000E+00  0.00000000E+00   1.0
"#;

    fn ddb() -> DdbFile {
        DdbFile::from_content(SI_DDB, "si_DDB", ParseOptions::default()).unwrap()
    }

    /// 记录收到的输入，按预设返回结果
    struct MockRunner<T: Clone> {
        outcome: std::result::Result<T, JobReport>,
        seen: RefCell<Vec<AnaddbInput>>,
    }

    impl<T: Clone> MockRunner<T> {
        fn new(outcome: std::result::Result<T, JobReport>) -> Self {
            MockRunner {
                outcome,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl<T: Clone> PostProcessor for MockRunner<T> {
        type Output = T;

        fn run(&self, _ddb: &Path, input: &AnaddbInput) -> std::result::Result<T, JobReport> {
            self.seen.borrow_mut().push(input.clone());
            self.outcome.clone()
        }
    }

    #[derive(Clone)]
    struct FixedTensors {
        becs: Vec<[[f64; 3]; 3]>,
    }

    impl TensorSource for FixedTensors {
        fn emacro(&self) -> Result<[[f64; 3]; 3]> {
            Ok([[12.0, 0.0, 0.0], [0.0, 12.0, 0.0], [0.0, 0.0, 12.0]])
        }

        fn becs(&self) -> Result<(Vec<[[f64; 3]; 3]>, BecsLayout)> {
            Ok((self.becs.clone(), BecsLayout::Transposed))
        }
    }

    #[test]
    fn test_session_views() {
        let ddb = ddb();
        assert_eq!(ddb.version(), 100401);
        assert_eq!(ddb.natom(), 2);
        assert_eq!(ddb.structure().formula(), "Si2");
        assert_eq!(ddb.structure().spacegroup.len(), 2);
        assert_eq!(ddb.qpoints().len(), 2);
        assert_eq!(ddb.path(), Path::new("si_DDB"));
    }

    #[test]
    fn test_guessed_ngqpt_is_cached() {
        let ddb = ddb();
        let first = ddb.guessed_ngqpt().unwrap();
        assert_eq!(first, MeshGuess([4, 1, 1]));
        assert_eq!(ddb.mesh.get(), Some(&first));
        assert_eq!(ddb.guessed_ngqpt().unwrap(), first);
    }

    #[test]
    fn test_summary_fields() {
        let summary = ddb().summary();
        assert_eq!(summary.path, "si_DDB");
        assert_eq!(summary.formula, "Si2");
        assert_eq!(summary.nsym, 2);
        assert_eq!(summary.nqpt, 2);
        assert_eq!(summary.ngqpt.as_deref(), Some("4 1 1"));
    }

    #[test]
    fn test_params_subset() {
        let params = ddb().params();
        assert_eq!(params.get("nkpt"), Some(&HeaderValue::Int(1)));
        assert!(params.contains_key("ecut"));
        assert!(!params.contains_key("tsmear"));
    }

    #[test]
    fn test_phmodes_requires_selection() {
        let ddb = ddb();
        let runner = MockRunner::new(Ok(()));

        let err = ddb
            .anaget_phmodes_at_qpoint(&runner, None, AnaddbOptions::default())
            .unwrap_err();
        assert!(matches!(err, DdbError::AmbiguousSelection { count: 2 }));

        let err = ddb
            .anaget_phmodes_at_qpoint(
                &runner,
                Some(QSelector::Coords([0.5, 0.5, 0.0])),
                AnaddbOptions::default(),
            )
            .unwrap_err();
        assert!(matches!(err, DdbError::NotFound(_)));
        assert!(runner.seen.borrow().is_empty());
    }

    #[test]
    fn test_phmodes_submits_selected_qpoint() {
        let ddb = ddb();
        let runner = MockRunner::new(Ok(()));
        ddb.anaget_phmodes_at_qpoint(&runner, Some(QSelector::Index(1)), AnaddbOptions::default())
            .unwrap();

        let seen = runner.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].qpoint, Some([0.25, 0.0, 0.0]));
    }

    #[test]
    fn test_phbands_falls_back_to_guessed_mesh() {
        let ddb = ddb();
        let runner = MockRunner::new(Ok(()));
        ddb.anaget_phbands_and_dos(
            &runner,
            None,
            PhbandsDosParams::default(),
            AnaddbOptions::default(),
        )
        .unwrap();
        ddb.anaget_phbands_and_dos(
            &runner,
            Some([8, 8, 8]),
            PhbandsDosParams::default(),
            AnaddbOptions::default(),
        )
        .unwrap();

        let seen = runner.seen.borrow();
        assert_eq!(seen[0].ngqpt, Some([4, 1, 1]));
        assert_eq!(seen[1].get("ngqpt"), Some(&ControlValue::IntVec(vec![8, 8, 8])));
    }

    #[test]
    fn test_failed_task_carries_report() {
        let report = JobReport {
            workdir: Some(PathBuf::from("/tmp/anaddb_run")),
            diagnostics: vec![Diagnostic {
                severity: Severity::Error,
                message: "ifc not converged".to_string(),
            }],
        };
        let runner: MockRunner<()> = MockRunner::new(Err(report.clone()));
        let err = ddb()
            .anaget_phbands_and_dos(
                &runner,
                None,
                PhbandsDosParams::default(),
                AnaddbOptions::default(),
            )
            .unwrap_err();

        match err {
            DdbError::TaskFailed(r) => assert_eq!(r, report),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_emacro_and_becs() {
        let ddb = ddb();
        let block = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let runner = MockRunner::new(Ok(FixedTensors {
            becs: vec![block, block],
        }));

        let (emacro, becs) = ddb.anaget_emacro_and_becs(&runner, 1).unwrap();
        assert!((emacro[1][1] - 12.0).abs() < 1e-12);
        assert_eq!(becs.len(), 2);
        assert_eq!(becs.values()[0][0], [1.0, 4.0, 7.0]);
        assert_eq!(runner.seen.borrow()[0].get("dieflag"), Some(&ControlValue::Int(1)));
    }

    #[test]
    fn test_becs_count_mismatch_from_runner() {
        let runner = MockRunner::new(Ok(FixedTensors {
            becs: vec![[[0.0; 3]; 3]],
        }));
        let err = ddb().anaget_emacro_and_becs(&runner, 1).unwrap_err();
        assert!(matches!(err, DdbError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_open_missing_file() {
        let err = DdbFile::open(Path::new("/nonexistent/dir/out_DDB")).unwrap_err();
        assert!(matches!(err, DdbError::FileNotFound { .. }));
    }
}
