use crate::cli::InfoArgs;
use crate::config::FileConfig;
use crate::error::Result;
use atomium::core::io::traits::StructureFile;
use atomium::core::models::atom::AtomFilter;
use atomium::core::models::ids::StructureId;
use atomium::core::models::system::MolecularSystem;
use atomium::files::pdb::Pdb;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::info;

pub fn run(args: InfoArgs, config: &FileConfig) -> Result<()> {
    let filter = config.atom_filter(&args.select)?;
    let read_config = config.read.clone().strict(args.strict || config.read.strict);

    info!("Reading {:?}", args.input);
    let pdb = Pdb::read_from_path(&args.input, &read_config)?;
    print!("{}", summarize(&pdb, &filter)?);
    Ok(())
}

struct Selection {
    count: usize,
    mass: f64,
    formula: BTreeMap<String, usize>,
}

fn select(system: &MolecularSystem, model: StructureId, filter: &AtomFilter) -> Result<Selection> {
    let atoms = system.atoms(model, filter)?;
    if *filter == AtomFilter::all() {
        return Ok(Selection {
            count: atoms.len(),
            mass: system.mass(model)?,
            formula: system.formula(model)?,
        });
    }
    let mut selection = Selection {
        count: atoms.len(),
        mass: 0.0,
        formula: BTreeMap::new(),
    };
    for atom in atoms.iter().filter_map(|&id| system.atom(id)) {
        selection.mass += atom.mass();
        *selection.formula.entry(atom.element().to_string()).or_insert(0) += 1;
    }
    Ok(selection)
}

fn format_formula(formula: &BTreeMap<String, usize>) -> String {
    if formula.is_empty() {
        return "-".to_string();
    }
    formula
        .iter()
        .map(|(element, count)| format!("{}{}", element, count))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Renders the metadata of a file and one line per model for the selected atoms.
pub fn summarize(pdb: &Pdb, filter: &AtomFilter) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "{}", pdb);
    let fields = [
        ("Code", pdb.code().map(str::to_string)),
        ("Classification", pdb.classification().map(str::to_string)),
        (
            "Deposited",
            pdb.deposition_date().map(|d| d.format("%Y-%m-%d").to_string()),
        ),
        ("Title", pdb.title().map(str::to_string)),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            let _ = writeln!(out, "  {:<15} {}", format!("{}:", label), value);
        }
    }
    if !pdb.warnings().is_empty() {
        let _ = writeln!(out, "  {:<15} {}", "Warnings:", pdb.warnings().len());
    }

    let system = pdb.system();
    for (index, &model) in pdb.models().iter().enumerate() {
        let selection = select(system, model, filter)?;
        let _ = writeln!(
            out,
            "  Model {}: {} atoms, mass {:.3}, formula {}",
            index + 1,
            selection.count,
            selection.mass,
            format_formula(&selection.formula)
        );
    }
    Ok(out)
}
