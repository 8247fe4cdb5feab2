use super::config::{ReadConfig, WriteConfig};
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Defines the interface for reading and writing structure file formats.
///
/// Implementors provide the text conversion; reading from and writing to readers,
/// writers and paths is built on top of it.
pub trait StructureFile: Sized {
    /// The error type for I/O and parsing operations.
    type Error: Error + From<io::Error>;

    /// Parses a structure file from its full text.
    fn from_text(text: &str, config: &ReadConfig) -> Result<Self, Self::Error>;

    /// Serialises the structure file to text.
    fn to_text(&self, config: &WriteConfig) -> Result<String, Self::Error>;

    /// Reads a structure file from a reader.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails, the input is not UTF-8, or parsing fails.
    fn read_from(reader: &mut impl Read, config: &ReadConfig) -> Result<Self, Self::Error> {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;
        Self::from_text(&text, config)
    }

    /// Writes the structure file to a writer.
    fn write_to(&self, writer: &mut impl Write, config: &WriteConfig) -> Result<(), Self::Error> {
        let text = self.to_text(config)?;
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a structure file from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsing fails.
    fn read_from_path<P: AsRef<Path>>(path: P, config: &ReadConfig) -> Result<Self, Self::Error> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::read_from(&mut reader, config)
    }

    /// Writes the structure file to a file path, replacing any existing file.
    ///
    /// The file is only created once serialisation has succeeded.
    fn write_to_path<P: AsRef<Path>>(
        &self,
        path: P,
        config: &WriteConfig,
    ) -> Result<(), Self::Error> {
        let text = self.to_text(config)?;
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
