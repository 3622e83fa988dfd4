use anyhow::{bail, Result};

#[derive(Debug, Clone)]
pub struct StoreOptions {
    pub max_key_size_bytes: usize,
    pub max_value_size_bytes: usize,
}

impl StoreOptions {
    pub fn new_with_defaults() -> Self {
        Self {
            max_key_size_bytes: 1 << 10,
            max_value_size_bytes: 1 << 20,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_key_size_bytes == 0 {
            bail!("max_key_size_bytes must be positive");
        }
        Ok(())
    }
}
