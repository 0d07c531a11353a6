use phf::{Map, phf_map};

/// One-letter code used for any residue outside the 20 canonical amino acids.
pub const UNKNOWN_ONE_LETTER: char = 'X';
/// Three-letter code used for any one-letter code outside the 20 canonical amino acids.
pub const UNKNOWN_THREE_LETTER: &str = "XXX";

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "GLY" => 'G', "ALA" => 'A', "VAL" => 'V', "LEU" => 'L', "ILE" => 'I',
    "MET" => 'M', "PHE" => 'F', "PRO" => 'P', "TYR" => 'Y', "TRP" => 'W',
    "LYS" => 'K', "SER" => 'S', "CYS" => 'C', "ASN" => 'N', "GLN" => 'Q',
    "HIS" => 'H', "THR" => 'T', "GLU" => 'E', "ASP" => 'D', "ARG" => 'R',
};

static ONE_TO_THREE: Map<char, &'static str> = phf_map! {
    'G' => "GLY", 'A' => "ALA", 'V' => "VAL", 'L' => "LEU", 'I' => "ILE",
    'M' => "MET", 'F' => "PHE", 'P' => "PRO", 'Y' => "TYR", 'W' => "TRP",
    'K' => "LYS", 'S' => "SER", 'C' => "CYS", 'N' => "ASN", 'Q' => "GLN",
    'H' => "HIS", 'T' => "THR", 'E' => "GLU", 'D' => "ASP", 'R' => "ARG",
};

/// Maps a three-letter residue code to its one-letter code, `'X'` if unknown.
pub fn to_one_letter(three_letter: &str) -> char {
    THREE_TO_ONE
        .get(three_letter)
        .copied()
        .unwrap_or(UNKNOWN_ONE_LETTER)
}

/// Maps a one-letter residue code to its three-letter code, `"XXX"` if unknown.
pub fn to_three_letter(one_letter: char) -> &'static str {
    ONE_TO_THREE
        .get(&one_letter)
        .copied()
        .unwrap_or(UNKNOWN_THREE_LETTER)
}
