use phf::{Map, phf_map};

/// Standard relative atomic masses, keyed by upper-case element symbol.
static RELATIVE_ATOMIC_MASSES: Map<&'static str, f64> = phf_map! {
    "H" => 1.008, "HE" => 4.0026, "LI" => 6.94, "BE" => 9.0122, "B" => 10.81,
    "C" => 12.011, "N" => 14.007, "O" => 15.999, "F" => 18.998, "NE" => 20.18,
    "NA" => 22.99, "MG" => 24.305, "AL" => 26.982, "SI" => 28.085, "P" => 30.974,
    "S" => 32.06, "CL" => 35.45, "AR" => 39.948, "K" => 39.098, "CA" => 40.078,
    "SC" => 44.956, "TI" => 47.867, "V" => 50.942, "CR" => 51.996, "MN" => 54.938,
    "FE" => 55.845, "CO" => 58.933, "NI" => 58.693, "CU" => 63.546, "ZN" => 65.38,
    "GA" => 69.723, "GE" => 72.63, "AS" => 74.922, "SE" => 78.971, "BR" => 79.904,
    "KR" => 83.798, "RB" => 85.468, "SR" => 87.62, "Y" => 88.906, "ZR" => 91.224,
    "NB" => 92.906, "MO" => 95.96, "TC" => 98.0, "RU" => 101.07, "RH" => 102.91,
    "PD" => 106.42, "AG" => 107.87, "CD" => 112.41, "IN" => 114.82, "SN" => 118.71,
    "SB" => 121.76, "TE" => 127.6, "I" => 126.9, "XE" => 131.29, "CS" => 132.91,
    "BA" => 137.33, "LA" => 138.91, "CE" => 140.12, "PR" => 140.91, "ND" => 144.24,
    "PM" => 145.0, "SM" => 150.36, "EU" => 151.96, "GD" => 157.25, "TB" => 158.93,
    "DY" => 162.5, "HO" => 164.93, "ER" => 167.26, "TM" => 168.93, "YB" => 173.05,
    "LU" => 174.97, "HF" => 178.49, "TA" => 180.95, "W" => 183.84, "RE" => 186.21,
    "OS" => 190.23, "IR" => 192.22, "PT" => 195.08, "AU" => 196.97, "HG" => 200.59,
    "TL" => 204.38, "PB" => 207.2, "BI" => 208.98, "PO" => 209.0, "AT" => 210.0,
    "RN" => 222.0, "FR" => 223.0, "RA" => 226.0, "AC" => 227.0, "TH" => 232.04,
    "PA" => 231.04, "U" => 238.03, "NP" => 237.0, "PU" => 244.0, "AM" => 243.0,
    "CM" => 247.0, "BK" => 247.0, "CF" => 251.0, "ES" => 252.0, "FM" => 257.0,
    "MD" => 258.0, "NO" => 259.0, "LR" => 262.0, "RF" => 267.0, "DB" => 270.0,
    "SG" => 271.0, "BH" => 270.0, "HS" => 277.0, "MT" => 276.0, "DS" => 281.0,
    "RG" => 280.0, "CN" => 285.0, "NH" => 284.0, "FL" => 289.0, "MC" => 288.0,
    "LV" => 293.0, "TS" => 294.0, "OG" => 294.0,
    "D" => 2.014,
};

/// Returns the relative atomic mass of an element symbol, or `0.0` if the symbol is
/// not a known element. Lookup is case-insensitive.
pub fn relative_mass(symbol: &str) -> f64 {
    let key = symbol.trim().to_ascii_uppercase();
    RELATIVE_ATOMIC_MASSES.get(key.as_str()).copied().unwrap_or(0.0)
}

pub fn is_known_element(symbol: &str) -> bool {
    RELATIVE_ATOMIC_MASSES.contains_key(symbol.trim().to_ascii_uppercase().as_str())
}

/// Guesses an element symbol from a PDB atom name (columns 13-16) when the element
/// columns are blank.
///
/// Names whose first column is a digit or space belong to one-letter elements
/// (`" CA "` is a carbon); names that fill the first column start with a two-letter
/// element if one matches (`"FE  "`), otherwise the first letter is used.
pub fn infer_element(atom_name: &str) -> Option<String> {
    let padded = format!("{:<4}", atom_name);
    let mut chars = padded.chars();
    let first = chars.next()?;
    let second = chars.next();

    if first.is_ascii_alphabetic() && atom_name.len() == 4 {
        if let Some(second) = second.filter(|c| c.is_ascii_alphabetic()) {
            let two = format!("{}{}", first, second).to_ascii_uppercase();
            if is_known_element(&two) && !first.eq_ignore_ascii_case(&'H') {
                return Some(two);
            }
        }
    }

    atom_name
        .chars()
        .find(|c| c.is_ascii_alphabetic())
        .map(|c| c.to_ascii_uppercase().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_mass_returns_standard_values() {
        assert!((relative_mass("Li") - 7.0).abs() < 0.5);
        assert!((relative_mass("NA") - 23.0).abs() < 0.5);
        assert!((relative_mass("fe") - 56.0).abs() < 0.5);
        assert!((relative_mass("U") - 238.0).abs() < 0.5);
    }

    #[test]
    fn unknown_elements_have_zero_mass() {
        assert_eq!(relative_mass("MY"), 0.0);
        assert_eq!(relative_mass(""), 0.0);
        assert!(!is_known_element("XX"));
    }

    #[test]
    fn infer_element_uses_first_letter_for_padded_names() {
        assert_eq!(infer_element(" CA ").as_deref(), Some("C"));
        assert_eq!(infer_element("CA").as_deref(), Some("C"));
        assert_eq!(infer_element("1HB ").as_deref(), Some("H"));
        assert_eq!(infer_element(" N  ").as_deref(), Some("N"));
    }

    #[test]
    fn infer_element_recognises_two_letter_elements_in_full_width_names() {
        assert_eq!(infer_element("FE  ").as_deref(), Some("FE"));
        assert_eq!(infer_element("HG11").as_deref(), Some("H"));
    }

    #[test]
    fn infer_element_returns_none_without_letters() {
        assert_eq!(infer_element("    "), None);
        assert_eq!(infer_element(""), None);
    }
}
