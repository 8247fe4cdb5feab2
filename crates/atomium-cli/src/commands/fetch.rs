use crate::cli::FetchArgs;
use crate::commands::info;
use crate::config::FileConfig;
use crate::error::{CliError, Result};
use crate::remote::{self, FetchProgress};
use atomium::core::io::traits::StructureFile;
use atomium::files::pdb::Pdb;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info as log_info;

/// Checks the code shape before any request is made.
fn validate_code(code: &str) -> Result<()> {
    let mut probe = Pdb::new();
    probe.set_code(code)?;
    Ok(())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg} {bytes}") {
        pb.set_style(style);
    }
    pb.set_draw_target(indicatif::ProgressDrawTarget::stderr_with_hz(10));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub async fn run(args: FetchArgs, config: &FileConfig) -> Result<()> {
    validate_code(&args.code)?;
    let base_url = config.base_url(args.base_url.as_deref());

    let pb = spinner();
    pb.set_message(format!("Fetching {}...", args.code));
    let progress_callback = |progress: FetchProgress| match progress {
        FetchProgress::Started { total_size } => {
            if let Some(size) = total_size {
                pb.set_length(size);
            }
        }
        FetchProgress::Downloading { downloaded } => pb.set_position(downloaded),
    };

    let text = match remote::fetch_text(base_url, &args.code, progress_callback).await {
        Ok(text) => {
            pb.finish_with_message(format!("✓ Fetched {}", args.code));
            text
        }
        Err(e) => {
            pb.finish_with_message("✗ Download failed.");
            return Err(e);
        }
    };

    let pdb = Pdb::from_text(&text, &config.read).map_err(|e| CliError::FileParsing {
        path: remote::file_url(base_url, &args.code).into(),
        source: e.into(),
    })?;
    print!("{}", info::summarize(&pdb, &config.atom_filter(&Default::default())?)?);

    if let Some(output) = &args.output {
        log_info!("Saving fetched file to {:?}", output);
        pdb.write_to_path(output, &config.write)?;
        println!("Wrote {:?}", output);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_codes_are_rejected_before_any_request() {
        for code in ["1abcd", "abcd", "1ab"] {
            match validate_code(code) {
                Err(CliError::Model(e)) => assert!(e.is_value_error()),
                other => panic!("expected a value error for {code:?}, got {:?}", other),
            }
        }
        assert!(validate_code("1LOL").is_ok());
    }

    #[tokio::test]
    async fn run_fails_fast_on_bad_code() {
        let args = FetchArgs {
            code: "nope".to_string(),
            output: None,
            base_url: Some("http://127.0.0.1:9".to_string()),
        };
        assert!(matches!(
            run(args, &FileConfig::default()).await,
            Err(CliError::Model(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() {
        let args = FetchArgs {
            code: "1LOL".to_string(),
            output: None,
            base_url: Some("http://127.0.0.1:9".to_string()),
        };
        assert!(matches!(
            run(args, &FileConfig::default()).await,
            Err(CliError::Network(_))
        ));
    }
}
