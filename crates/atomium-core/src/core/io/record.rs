use super::config::LineEnding;
use super::error::RecordError;
use std::fmt;

/// Width of every record, in characters.
pub const RECORD_WIDTH: usize = 80;
/// Width of the record-name field at the start of each record.
pub const NAME_WIDTH: usize = 6;

/// One line of a PDB file, normalised to exactly [`RECORD_WIDTH`] characters.
///
/// Fields are addressed with the 1-based, inclusive column numbers used by the format
/// documentation, so `record.integer(7, 11)` reads the atom serial of an ATOM record.
/// Out-of-range columns are clamped to the record; a field that is entirely blank is
/// reported as absent rather than as zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdbRecord {
    number: usize,
    text: String,
    name: String,
    truncated: bool,
}

fn normalise_char(c: char) -> char {
    if !c.is_ascii() {
        '?'
    } else if c.is_ascii_control() {
        ' '
    } else {
        c
    }
}

impl PdbRecord {
    /// Builds a record from a raw line. This never fails: whatever the input, the
    /// stored text is 80 ASCII characters long.
    pub fn new(line: &str, number: usize) -> Self {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut text: String = line.chars().map(normalise_char).collect();
        let truncated = text.trim_end().len() > RECORD_WIDTH;
        text.truncate(RECORD_WIDTH);
        let text = format!("{:<width$}", text, width = RECORD_WIDTH);
        let name = text[..NAME_WIDTH].trim_end().to_string();
        Self {
            number,
            text,
            name,
            truncated,
        }
    }

    /// Physical line number the record was read from.
    pub fn number(&self) -> usize {
        self.number
    }

    /// The full 80-character text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Columns 1-6 without trailing spaces, e.g. `"ATOM"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns 7-80; always 74 characters.
    pub fn contents(&self) -> &str {
        &self.text[NAME_WIDTH..]
    }

    /// Whether non-blank text was cut off past column 80.
    pub fn was_truncated(&self) -> bool {
        self.truncated
    }

    /// Raw text of columns `start..=end`.
    pub fn columns(&self, start: usize, end: usize) -> &str {
        let start = start.max(1);
        let end = end.min(RECORD_WIDTH);
        if start > end {
            return "";
        }
        &self.text[start - 1..end]
    }

    /// Text of columns `start..=end` with surrounding whitespace removed.
    pub fn string(&self, start: usize, end: usize) -> &str {
        self.columns(start, end).trim()
    }

    /// Text of columns `start..=end` keeping leading whitespace, which is significant
    /// for left-justified fields like atom names.
    pub fn left_string(&self, start: usize, end: usize) -> &str {
        self.columns(start, end).trim_end()
    }

    pub fn right_string(&self, start: usize, end: usize) -> &str {
        self.columns(start, end).trim_start()
    }

    /// A single-column field, `None` if the column is blank.
    pub fn character(&self, column: usize) -> Option<char> {
        self.columns(column, column)
            .chars()
            .next()
            .filter(|c| *c != ' ')
    }

    /// Parses an integer field.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInt`] if the field is not blank and not an integer.
    pub fn integer(&self, start: usize, end: usize) -> Result<Option<i64>, RecordError> {
        let value = self.string(start, end);
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<i64>()
            .map(Some)
            .map_err(|_| RecordError::InvalidInt {
                columns: format!("{}-{}", start, end),
                value: value.to_string(),
            })
    }

    /// Parses a floating point field.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidFloat`] if the field is not blank and not a number.
    pub fn float(&self, start: usize, end: usize) -> Result<Option<f64>, RecordError> {
        let value = self.string(start, end);
        if value.is_empty() {
            return Ok(None);
        }
        value
            .parse::<f64>()
            .map(Some)
            .map_err(|_| RecordError::InvalidFloat {
                columns: format!("{}-{}", start, end),
                value: value.to_string(),
            })
    }
}

impl fmt::Display for PdbRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<PdbRecord {} ({})>", self.number, self.name)
    }
}

/// Splits a file's text into records. Blank lines are skipped, but every record keeps
/// the number of the physical line it came from.
pub fn parse_records(text: &str) -> Vec<PdbRecord> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| PdbRecord::new(line, index + 1))
        .collect()
}

/// Joins records into file text, terminating every line with `ending`.
pub fn records_to_string(records: &[PdbRecord], ending: LineEnding) -> String {
    let terminator = ending.as_str();
    let mut out = String::with_capacity(records.len() * (RECORD_WIDTH + terminator.len()));
    for record in records {
        out.push_str(record.text());
        out.push_str(terminator);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = "TEST   123  123.8    HYT";

    fn check_invariants(record: &PdbRecord) {
        assert_eq!(record.text().len(), 80);
        assert_eq!(record.contents().len(), 74);
        let shown = record.to_string();
        assert!(shown.starts_with("<PdbRecord ") && shown.ends_with(")>"), "{shown}");
    }

    #[test]
    fn can_create_record() {
        let record = PdbRecord::new(LINE, 23);
        check_invariants(&record);
        assert_eq!(record.number(), 23);
        assert_eq!(record.name(), "TEST");
        assert!(record.contents().starts_with(" 123  123.8    HYT"));
        assert!(record.text().starts_with(LINE));
        assert_eq!(record.to_string(), "<PdbRecord 23 (TEST)>");
    }

    #[test]
    fn every_line_length_is_normalised_to_eighty() {
        for length in 0..=120 {
            let line: String = std::iter::repeat('X').take(length).collect();
            let record = PdbRecord::new(&line, 1);
            check_invariants(&record);
            assert_eq!(record.was_truncated(), length > 80);
        }
    }

    #[test]
    fn trailing_whitespace_past_column_eighty_is_not_truncation() {
        let line = format!("{:<100}", "ATOM");
        let record = PdbRecord::new(&line, 1);
        assert!(!record.was_truncated());
        assert_eq!(record.name(), "ATOM");
    }

    #[test]
    fn carriage_returns_and_odd_characters_are_normalised() {
        let record = PdbRecord::new("TITLE\tÅ\r", 1);
        check_invariants(&record);
        assert!(record.text().starts_with("TITLE ?"));
        assert_eq!(record.name(), "TITLE");
    }

    #[test]
    fn columns_are_one_based_and_inclusive() {
        let record = PdbRecord::new(LINE, 1);
        assert_eq!(record.columns(1, 4), "TEST");
        assert_eq!(record.columns(8, 10), "123");
        assert_eq!(record.string(11, 18), "123.8");
        assert_eq!(record.left_string(7, 10), " 123");
        assert_eq!(record.right_string(7, 12), "123  ");
        assert_eq!(record.character(22), Some('H'));
        assert_eq!(record.character(5), None);
    }

    #[test]
    fn out_of_range_columns_are_clamped() {
        let record = PdbRecord::new(LINE, 1);
        assert_eq!(record.columns(79, 200).len(), 2);
        assert_eq!(record.columns(0, 4), "TEST");
        assert_eq!(record.columns(90, 100), "");
        assert_eq!(record.columns(10, 5), "");
    }

    #[test]
    fn numeric_fields_parse_or_report_blank() {
        let record = PdbRecord::new(LINE, 1);
        assert_eq!(record.integer(7, 10), Ok(Some(123)));
        assert_eq!(record.float(11, 18), Ok(Some(123.8)));
        assert_eq!(record.integer(30, 40), Ok(None));
        assert_eq!(record.float(30, 40), Ok(None));
    }

    #[test]
    fn malformed_numbers_are_errors() {
        let record = PdbRecord::new(LINE, 1);
        assert_eq!(
            record.integer(19, 24),
            Err(RecordError::InvalidInt {
                columns: "19-24".into(),
                value: "HYT".into()
            })
        );
        assert!(matches!(
            record.float(1, 4),
            Err(RecordError::InvalidFloat { .. })
        ));
    }

    #[test]
    fn parse_records_skips_blank_lines_but_keeps_line_numbers() {
        let text = "HEADER    TEST\r\n\n   \nATOM      1\nEND\n";
        let records = parse_records(text);
        let summary: Vec<(usize, &str)> = records.iter().map(|r| (r.number(), r.name())).collect();
        assert_eq!(summary, vec![(1, "HEADER"), (4, "ATOM"), (5, "END")]);
    }

    #[test]
    fn records_to_string_joins_with_terminator() {
        let records = vec![PdbRecord::new("TER", 1), PdbRecord::new("END", 2)];
        let text = records_to_string(&records, LineEnding::CrLf);
        let lines: Vec<&str> = text.split("\r\n").collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].len(), 80);
        assert!(lines[1].starts_with("END"));
        assert_eq!(lines[2], "");
    }
}
