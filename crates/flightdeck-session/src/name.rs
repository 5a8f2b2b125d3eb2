//! Player name rules.

/// Characters allowed in names unless configured otherwise: ASCII letters,
/// digits, space, underscore, hyphen, dot.
pub const DEFAULT_NAME_CHARS: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789 _-.";

/// Longest accepted name, in characters.
pub const DEFAULT_MAX_NAME_LEN: usize = 24;

/// Why a name was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameViolation {
    Empty,
    TooLong { len: usize, max: usize },
    ForbiddenChar(char),
}

/// Length and charset limits for player names.
///
/// Lengths are counted in `char`s, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePolicy {
    max_len: usize,
    allowed: Vec<char>,
}

impl Default for NamePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_NAME_LEN, DEFAULT_NAME_CHARS)
    }
}

impl NamePolicy {
    pub fn new(max_len: usize, allowed: &str) -> Self {
        let mut allowed: Vec<char> = allowed.chars().collect();
        allowed.sort_unstable();
        allowed.dedup();
        Self { max_len, allowed }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    pub fn allows(&self, c: char) -> bool {
        self.allowed.binary_search(&c).is_ok()
    }

    /// Checks `name` against the policy.
    pub fn validate(&self, name: &str) -> Result<(), NameViolation> {
        if name.is_empty() {
            return Err(NameViolation::Empty);
        }
        let len = name.chars().count();
        if len > self.max_len {
            return Err(NameViolation::TooLong {
                len,
                max: self.max_len,
            });
        }
        match name.chars().find(|&c| !self.allows(c)) {
            Some(c) => Err(NameViolation::ForbiddenChar(c)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_plain_name_is_ok() {
        assert_eq!(NamePolicy::default().validate("Ada_Lovelace-1.0"), Ok(()));
    }

    #[test]
    fn test_validate_empty_name_is_rejected() {
        assert_eq!(NamePolicy::default().validate(""), Err(NameViolation::Empty));
    }

    #[test]
    fn test_validate_at_max_len_is_ok() {
        let policy = NamePolicy::new(3, DEFAULT_NAME_CHARS);
        assert_eq!(policy.validate("abc"), Ok(()));
        assert_eq!(
            policy.validate("abcd"),
            Err(NameViolation::TooLong { len: 4, max: 3 })
        );
    }

    #[test]
    fn test_validate_counts_chars_not_bytes() {
        let policy = NamePolicy::new(2, "éa");
        assert_eq!(policy.validate("éé"), Ok(()));
    }

    #[test]
    fn test_validate_forbidden_char_is_reported() {
        assert_eq!(
            NamePolicy::default().validate("ada<3"),
            Err(NameViolation::ForbiddenChar('<'))
        );
    }

    #[test]
    fn test_custom_charset_replaces_default() {
        let policy = NamePolicy::new(8, "xyz");
        assert!(policy.allows('x'));
        assert!(!policy.allows('a'));
    }
}
