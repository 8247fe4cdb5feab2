use crate::cli::TransformArgs;
use crate::config::FileConfig;
use crate::error::{CliError, Result};
use atomium::core::io::traits::StructureFile;
use atomium::core::utils::geometry::Axis;
use atomium::files::pdb::Pdb;
use tracing::info;

/// A rigid-body operation requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Translate { dx: f64, dy: f64, dz: f64 },
    Rotate { axis: Axis, degrees: f64 },
}

/// Turns the raw `--translate` / `--rotate` values into operations, translation first.
pub fn parse_operations(
    translate: Option<&[f64]>,
    rotate: Option<&[String]>,
) -> Result<Vec<Operation>> {
    let mut operations = Vec::new();
    if let Some(values) = translate {
        match values {
            [dx, dy, dz] => operations.push(Operation::Translate {
                dx: *dx,
                dy: *dy,
                dz: *dz,
            }),
            _ => {
                return Err(CliError::Argument(
                    "--translate takes exactly three values".to_string(),
                ));
            }
        }
    }
    if let Some(values) = rotate {
        match values {
            [axis, degrees] => {
                let axis = axis.parse::<Axis>()?;
                let degrees = degrees.parse::<f64>().map_err(|_| {
                    CliError::Argument(format!("Invalid rotation angle '{}'", degrees))
                })?;
                operations.push(Operation::Rotate { axis, degrees });
            }
            _ => {
                return Err(CliError::Argument(
                    "--rotate takes an axis and an angle".to_string(),
                ));
            }
        }
    }
    if operations.is_empty() {
        return Err(CliError::Argument(
            "Nothing to do: give --translate and/or --rotate".to_string(),
        ));
    }
    Ok(operations)
}

/// Applies every operation to every model of the file.
pub fn apply(pdb: &mut Pdb, operations: &[Operation]) -> Result<()> {
    let models = pdb.models().to_vec();
    let system = pdb.system_mut();
    for model in models {
        for operation in operations {
            match *operation {
                Operation::Translate { dx, dy, dz } => system.translate(model, dx, dy, dz)?,
                Operation::Rotate { axis, degrees } => system.rotate(model, axis, degrees)?,
            }
        }
    }
    Ok(())
}

pub fn run(args: TransformArgs, config: &FileConfig) -> Result<()> {
    let operations = parse_operations(args.translate.as_deref(), args.rotate.as_deref())?;

    info!("Reading {:?}", args.input);
    let mut pdb = Pdb::read_from_path(&args.input, &config.read)?;
    apply(&mut pdb, &operations)?;
    info!(
        models = pdb.models().len(),
        operations = operations.len(),
        "Transformed structure"
    );

    pdb.write_to_path(&args.output, &config.write)?;
    println!("Wrote {:?}", args.output);
    Ok(())
}
