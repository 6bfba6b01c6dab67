//! Character-set taxonomy shared by the generator, validator and analyzer.
//!
//! The sets are fixed process-wide constants. Classification of arbitrary
//! characters goes through [`CharClass`], which is what both generation
//! (sampling pools) and analysis (presence detection) agree on.
pub const LOWERCASE: &str = "abcdefghijklmnopqrstuvwxyz";
pub const UPPERCASE: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZ";
pub const DIGITS: &str = "0123456789";
pub const SYMBOLS_BASIC: &str = "!@#$%^&*()";
pub const SYMBOLS_EXTENDED: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?";
pub const SYMBOLS_FULL: &str = "!@#$%^&*()_+-=[]{}|;:,.<>?/~`'\"";
/// Characters commonly misread for one another in most fonts.
pub const AMBIGUOUS: &str = "0O1lI";
/// Superset of [`AMBIGUOUS`] with further confusable letters.
pub const SIMILAR: &str = "il1Lo0OI";

/// One of the four composition classes a policy can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CharClass {
    Lowercase,
    Uppercase,
    Digit,
    Symbol,
}

impl CharClass {
    /// Order in which classes are seeded into a candidate.
    pub const ALL: [CharClass; 4] = [
        CharClass::Lowercase,
        CharClass::Uppercase,
        CharClass::Digit,
        CharClass::Symbol,
    ];

    /// The sampling alphabet for this class.
    pub fn charset(self) -> &'static str {
        match self {
            CharClass::Lowercase => LOWERCASE,
            CharClass::Uppercase => UPPERCASE,
            CharClass::Digit => DIGITS,
            CharClass::Symbol => SYMBOLS_EXTENDED,
        }
    }

    /// Whether `c` belongs to this class. Letter classes follow Unicode case
    /// so accented letters count; digits and symbols are ASCII-only.
    pub fn contains(self, c: char) -> bool {
        match self {
            CharClass::Lowercase => c.is_lowercase(),
            CharClass::Uppercase => c.is_uppercase(),
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::Symbol => SYMBOLS_EXTENDED.contains(c),
        }
    }

    pub fn count_in(self, s: &str) -> usize {
        s.chars().filter(|&c| self.contains(c)).count()
    }

    pub fn present_in(self, s: &str) -> bool {
        s.chars().any(|c| self.contains(c))
    }

    /// Alphabet size this class contributes to the entropy estimate.
    pub fn entropy_size(self) -> usize {
        self.charset().chars().count()
    }
}

impl std::fmt::Display for CharClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CharClass::Lowercase => "lowercase",
            CharClass::Uppercase => "uppercase",
            CharClass::Digit => "digits",
            CharClass::Symbol => "symbols",
        };
        f.write_str(name)
    }
}

pub fn has_ambiguous(s: &str) -> bool {
    s.chars().any(|c| AMBIGUOUS.contains(c))
}

pub fn has_similar(s: &str) -> bool {
    s.chars().any(|c| SIMILAR.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ambiguous_is_subset_of_similar() {
        assert!(AMBIGUOUS.chars().all(|c| SIMILAR.contains(c)));
    }

    #[test]
    fn symbol_tiers_nest() {
        assert!(SYMBOLS_BASIC.chars().all(|c| SYMBOLS_EXTENDED.contains(c)));
        assert!(SYMBOLS_EXTENDED.chars().all(|c| SYMBOLS_FULL.contains(c)));
        assert_eq!(CharClass::Symbol.entropy_size(), 26);
    }

    #[test]
    fn classifies_by_presence() {
        let s = "aB3$é";
        assert_eq!(CharClass::Lowercase.count_in(s), 2);
        assert_eq!(CharClass::Uppercase.count_in(s), 1);
        assert_eq!(CharClass::Digit.count_in(s), 1);
        assert_eq!(CharClass::Symbol.count_in(s), 1);
        assert!(!CharClass::Symbol.present_in("~/`"));
    }
}
