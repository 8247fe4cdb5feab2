use serde::Deserialize;

/// Line terminator used when writing files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineEnding {
    /// The platform's own terminator.
    #[default]
    Native,
    Lf,
    CrLf,
}

impl LineEnding {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineEnding::Native => {
                if cfg!(windows) {
                    "\r\n"
                } else {
                    "\n"
                }
            }
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Options controlling how files are read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct ReadConfig {
    /// Fail on the first recoverable problem instead of collecting warnings.
    pub strict: bool,
    /// Build only the first model of multi-model files.
    pub first_model_only: bool,
}

impl ReadConfig {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn first_model_only(mut self, first_model_only: bool) -> Self {
        self.first_model_only = first_model_only;
        self
    }
}

/// Options controlling how files are written.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct WriteConfig {
    pub line_ending: LineEnding,
    /// Emit the HEADER record when a code or deposition date is known.
    pub write_header: bool,
}

impl Default for WriteConfig {
    fn default() -> Self {
        Self {
            line_ending: LineEnding::Native,
            write_header: true,
        }
    }
}

impl WriteConfig {
    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    pub fn write_header(mut self, write_header: bool) -> Self {
        self.write_header = write_header;
        self
    }
}
