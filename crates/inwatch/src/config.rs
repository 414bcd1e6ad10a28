//! Session configuration

use inwatch_core::env::env_get;
use inwatch_core::MIN_BUFFER_SIZE;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Buffer capacity in units of `MIN_BUFFER_SIZE` (one longest-name
    /// record each).
    pub buffer_records: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { buffer_records: 64 }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `INW_BUFFER_RECORDS`.
    pub fn from_env() -> Self {
        Self { buffer_records: env_get("INW_BUFFER_RECORDS", Self::default().buffer_records) }
    }

    pub fn buffer_records(mut self, n: usize) -> Self {
        self.buffer_records = n;
        self
    }

    /// Event buffer capacity in bytes.
    pub fn buffer_capacity(&self) -> usize {
        MIN_BUFFER_SIZE * self.buffer_records
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.buffer_records == 0 {
            return Err("buffer_records must be at least 1");
        }
        if self.buffer_records.checked_mul(MIN_BUFFER_SIZE).is_none() {
            return Err("buffer_records too large");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_capacity() {
        let c = SessionConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.buffer_capacity(), 64 * MIN_BUFFER_SIZE);
    }

    #[test]
    fn test_validate() {
        assert!(SessionConfig::new().buffer_records(0).validate().is_err());
        assert!(SessionConfig::new().buffer_records(usize::MAX).validate().is_err());
        assert!(SessionConfig::new().buffer_records(1).validate().is_ok());
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("INW_BUFFER_RECORDS", "4");
        let c = SessionConfig::from_env();
        std::env::remove_var("INW_BUFFER_RECORDS");
        assert_eq!(c.buffer_records, 4);
        assert_eq!(c.buffer_capacity(), 4 * MIN_BUFFER_SIZE);
    }
}
