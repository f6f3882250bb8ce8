use rand::{rng, Rng};

#[cfg(test)]
use mockall::automock;

/// Alphabet short codes are drawn from: a-z, A-Z, 0-9
pub const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Produces candidate short codes. Calls are independent; distinctness is the
/// caller's concern.
#[cfg_attr(test, automock)]
pub trait CodeGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Uniform random codes of a fixed length
#[derive(Debug, Clone)]
pub struct RandomCodeGenerator {
    length: usize,
}

impl RandomCodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for RandomCodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator for RandomCodeGenerator {
    fn generate(&self) -> String {
        generate_short_id(self.length)
    }
}

/// Generates a short ID of `length` characters, each drawn uniformly from [`ALPHABET`]
pub fn generate_short_id(length: usize) -> String {
    let mut rng = rng();
    (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
