//! # inspect 子命令实现
//!
//! 打印单个 DDB 文件的收敛参数、晶格、原子、q 点与推断的 q 网格。
//!
//! ## 依赖关系
//! - 使用 `cli/inspect.rs` 定义的参数
//! - 使用 `ddbtool::parsers::DdbFile`
//! - 使用 `utils/output.rs`

use super::{fmt_vec3, parse_options};
use crate::cli::inspect::InspectArgs;
use ddbtool::error::Result;
use ddbtool::parsers::DdbFile;
use ddbtool::utils::output;

use tabled::{Table, Tabled};

#[derive(Tabled)]
struct ParamRow {
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Tabled)]
struct AtomRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Element")]
    element: String,
    #[tabled(rename = "Z")]
    z: u32,
    #[tabled(rename = "Reduced coordinates")]
    position: String,
}

#[derive(Tabled)]
struct QpointRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "q (reduced)")]
    q: String,
}

/// 执行 inspect
pub fn execute(args: InspectArgs) -> Result<()> {
    let ddb = DdbFile::open_with_options(&args.ddb, parse_options(&args.parse))?;
    let header = ddb.header();
    let structure = ddb.structure();

    output::print_header(&format!("DDB: {}", args.ddb.display()));
    output::print_kv("Version", &header.version.to_string());
    output::print_kv("Formula", &structure.formula());
    output::print_kv("natom", &header.natom.to_string());
    output::print_kv("nsym", &structure.spacegroup.len().to_string());

    let mut params: Vec<ParamRow> = ddb
        .params()
        .into_iter()
        .map(|(key, value)| ParamRow {
            key,
            value: value.to_string(),
        })
        .collect();
    if args.all_keys {
        params.extend(header.extra.iter().map(|(key, value)| ParamRow {
            key: key.clone(),
            value: value.to_string(),
        }));
    }
    if !params.is_empty() {
        output::print_header("Header Parameters");
        println!("{}", Table::new(&params));
    }

    output::print_header("Lattice (Å)");
    for row in &structure.lattice.matrix {
        println!("  {}", fmt_vec3(row));
    }
    let (a, b, c, alpha, beta, gamma) = structure.lattice.parameters();
    output::print_kv("abc", &format!("{:.6} {:.6} {:.6}", a, b, c));
    output::print_kv("angles", &format!("{:.3} {:.3} {:.3}", alpha, beta, gamma));
    output::print_kv("volume", &format!("{:.6} Å^3", structure.lattice.volume()));

    output::print_header("Atoms");
    let atoms: Vec<AtomRow> = structure
        .atoms
        .iter()
        .enumerate()
        .map(|(i, atom)| AtomRow {
            index: i,
            element: atom.element.clone(),
            z: atom.atomic_number,
            position: fmt_vec3(&atom.position),
        })
        .collect();
    println!("{}", Table::new(&atoms));

    let qpoints = ddb.qpoints();
    if qpoints.is_empty() {
        output::print_warning("No q-points found in DDB");
        return Ok(());
    }

    output::print_header(&format!("Q-points ({})", qpoints.len()));
    let rows: Vec<QpointRow> = qpoints
        .iter()
        .enumerate()
        .map(|(i, q)| QpointRow {
            index: i,
            q: fmt_vec3(q),
        })
        .collect();
    println!("{}", Table::new(&rows));

    let mesh = ddb.guessed_ngqpt()?;
    output::print_success(&format!(
        "Guessed q-mesh: {} ({} points)",
        mesh,
        mesh.num_points()
    ));

    Ok(())
}
