use crate::cli::ConvertArgs;
use crate::config::FileConfig;
use crate::error::Result;
use atomium::core::io::traits::StructureFile;
use atomium::files::pdb::Pdb;
use tracing::{info, warn};

pub fn run(args: ConvertArgs, config: &FileConfig) -> Result<()> {
    let read_config = config
        .read
        .clone()
        .first_model_only(args.first_model_only || config.read.first_model_only);
    let write_config = config
        .write
        .clone()
        .write_header(config.write.write_header && !args.no_header);

    info!("Reading {:?}", args.input);
    let pdb = Pdb::read_from_path(&args.input, &read_config)?;
    if !pdb.warnings().is_empty() {
        warn!(
            "{} problem(s) were skipped while reading {:?}",
            pdb.warnings().len(),
            args.input
        );
    }

    pdb.write_to_path(&args.output, &write_config)?;
    println!("Wrote {} to {:?}", pdb, args.output);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const MESSY: &str = "HEADER    TEST                                    21-SEP-17   1ABC\r\n\
\r\n\
MODEL        1\r\n\
ATOM      1  N   ALA A   1       0.000   0.000   0.000\r\n\
ENDMDL\r\n\
MODEL        2\r\n\
ATOM      1  N   ALA A   1       1.000   0.000   0.000\r\n\
ENDMDL\r\n\
END\r\n";

    fn convert(args_fn: impl FnOnce(ConvertArgs) -> ConvertArgs) -> String {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in.pdb");
        let output = dir.path().join("out.pdb");
        fs::write(&input, MESSY).unwrap();
        let args = args_fn(ConvertArgs {
            input,
            output: output.clone(),
            first_model_only: false,
            no_header: false,
        });
        run(args, &FileConfig::default()).unwrap();
        fs::read_to_string(output).unwrap()
    }

    #[test]
    fn output_is_normalised_to_full_width_lines() {
        let text = convert(|args| args);
        assert!(text.lines().all(|line| line.len() == 80));
        assert!(text.starts_with("HEADER"));
        assert_eq!(text.matches("MODEL ").count(), 2);
        assert!(text.lines().any(|line| line.starts_with("TER")));
    }

    #[test]
    fn flags_drop_header_and_extra_models() {
        let text = convert(|args| ConvertArgs {
            first_model_only: true,
            no_header: true,
            ..args
        });
        assert!(!text.contains("HEADER"));
        assert!(!text.contains("MODEL"));
        assert_eq!(text.matches("ATOM  ").count(), 1);
    }
}
