//! Alphabets for generated codes.

use rand::Rng;
use warden_core::{Error, Result};

/// The 62 ASCII letters and digits.
pub const ALPHANUMERIC: &str = "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// A non-empty set of characters to draw codes from.
#[derive(Debug, Clone)]
pub struct Charset {
    chars: Vec<char>,
}

impl Charset {
    /// Repeated characters are kept, so they weigh proportionally more in draws.
    pub fn new(chars: &str) -> Result<Self> {
        let chars: Vec<char> = chars.chars().collect();
        if chars.is_empty() {
            return Err(Error::Args("charset is empty".into()));
        }
        Ok(Self { chars })
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// Draw `len` characters uniformly at random.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, len: usize) -> String {
        (0..len)
            .map(|_| self.chars[rng.random_range(0..self.chars.len())])
            .collect()
    }
}

impl Default for Charset {
    fn default() -> Self {
        Self {
            chars: ALPHANUMERIC.chars().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_alphanumeric() {
        let charset = Charset::default();
        assert_eq!(charset.len(), 62);
        let code = charset.sample(&mut rand::rng(), 32);
        assert_eq!(code.len(), 32);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_empty_charset_rejected() {
        assert!(matches!(Charset::new(""), Err(Error::Args(_))));
    }

    #[test]
    fn test_single_char_charset_is_deterministic() {
        let charset = Charset::new("x").unwrap();
        assert_eq!(charset.sample(&mut rand::rng(), 3), "xxx");
    }

    #[test]
    fn test_multibyte_chars() {
        let charset = Charset::new("é").unwrap();
        assert_eq!(charset.sample(&mut rand::rng(), 2), "éé");
    }
}
