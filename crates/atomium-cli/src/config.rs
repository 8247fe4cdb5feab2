use crate::cli::SelectArgs;
use crate::error::{CliError, Result};
use atomium::core::io::config::{ReadConfig, WriteConfig};
use atomium::core::models::atom::{AtomFilter, AtomKindFilter};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://files.rcsb.org/view";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct FetchConfig {
    pub base_url: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

/// The `[select]` table. `kind` stays untyped until it is resolved so that a
/// non-string value is reported as a type error rather than a TOML syntax error.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SelectConfig {
    pub element: Option<String>,
    pub kind: Option<toml::Value>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub read: ReadConfig,
    pub write: WriteConfig,
    pub fetch: FetchConfig,
    pub select: SelectConfig,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Loads the file if one was given, otherwise returns the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Builds the atom filter, command-line values taking precedence over the file.
    pub fn atom_filter(&self, args: &SelectArgs) -> Result<AtomFilter> {
        let kind = match (&args.kind, &self.select.kind) {
            (Some(kind), _) => kind.parse::<AtomKindFilter>()?,
            (None, Some(value)) => AtomKindFilter::try_from(value)?,
            (None, None) => AtomKindFilter::All,
        };
        let element = args.element.clone().or_else(|| self.select.element.clone());
        Ok(AtomFilter { element, kind })
    }

    pub fn base_url<'a>(&'a self, override_url: Option<&'a str>) -> &'a str {
        override_url
            .unwrap_or(self.fetch.base_url.as_str())
            .trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atomium::core::io::config::LineEnding;
    use std::fs;
    use tempfile::tempdir;

    fn parse(text: &str) -> FileConfig {
        toml::from_str(text).unwrap()
    }

    #[test]
    fn empty_file_gives_defaults() {
        let config = parse("");
        assert_eq!(config, FileConfig::default());
        assert_eq!(config.fetch.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn tables_are_read_in_kebab_case() {
        let config = parse(
            r#"
            [read]
            strict = true
            first-model-only = true

            [write]
            line-ending = "lf"
            write-header = false

            [fetch]
            base-url = "http://localhost:8080/files/"

            [select]
            element = "C"
            kind = "pdb"
            "#,
        );
        assert!(config.read.strict && config.read.first_model_only);
        assert_eq!(config.write.line_ending, LineEnding::Lf);
        assert!(!config.write.write_header);
        assert_eq!(config.base_url(None), "http://localhost:8080/files");

        let filter = config.atom_filter(&SelectArgs::default()).unwrap();
        assert_eq!(filter.element.as_deref(), Some("C"));
        assert_eq!(filter.kind, AtomKindFilter::Pdb);
    }

    #[test]
    fn non_string_kind_is_a_type_error() {
        let config = parse("[select]\nkind = 1");
        match config.atom_filter(&SelectArgs::default()) {
            Err(CliError::Model(e)) => assert!(e.is_type_error()),
            other => panic!("expected a type error, got {:?}", other),
        }
    }

    #[test]
    fn unknown_kind_is_a_value_error() {
        let config = parse("[select]\nkind = \"xyz\"");
        match config.atom_filter(&SelectArgs::default()) {
            Err(CliError::Model(e)) => assert!(e.is_value_error()),
            other => panic!("expected a value error, got {:?}", other),
        }
    }

    #[test]
    fn command_line_selection_overrides_file() {
        let config = parse("[select]\nelement = \"C\"\nkind = 1");
        let args = SelectArgs {
            element: Some("O".to_string()),
            kind: Some("generic".to_string()),
        };
        let filter = config.atom_filter(&args).unwrap();
        assert_eq!(filter.element.as_deref(), Some("O"));
        assert_eq!(filter.kind, AtomKindFilter::Generic);
    }

    #[test]
    fn base_url_override_wins() {
        let config = FileConfig::default();
        assert_eq!(config.base_url(Some("http://mirror/")), "http://mirror");
        assert_eq!(config.base_url(None), DEFAULT_BASE_URL);
    }

    #[test]
    fn from_file_reports_syntax_errors_with_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("atm.toml");
        fs::write(&path, "[read]\nlenient = true").unwrap();
        assert!(matches!(
            FileConfig::from_file(&path),
            Err(CliError::FileParsing { .. })
        ));
        assert!(matches!(
            FileConfig::load(Some(&dir.path().join("missing.toml"))),
            Err(CliError::Io(_))
        ));
        assert_eq!(FileConfig::load(None).unwrap(), FileConfig::default());
    }
}
