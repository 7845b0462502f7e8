//! Buffer configuration.
//!
//! ```toml
//! capacity = 256
//! element_size = 1
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FifoError, Result};

/// Sizing for a FIFO.
///
/// `element_size` only matters for the byte-oriented [`RawFifo`](crate::RawFifo);
/// a typed [`RingBuffer<T>`](crate::RingBuffer) always uses `size_of::<T>()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FifoConfig {
    /// Maximum number of elements
    pub capacity: usize,
    /// Bytes per record
    pub element_size: usize,
}

impl Default for FifoConfig {
    fn default() -> Self {
        Self {
            capacity: 64,
            element_size: 1,
        }
    }
}

impl FifoConfig {
    /// Byte stream from a UART receive interrupt.
    #[must_use]
    pub fn uart() -> Self {
        Self {
            capacity: 256,
            element_size: 1,
        }
    }

    /// Six-axis IMU frames, three `i16` per sensor.
    #[must_use]
    pub fn sensor_frames() -> Self {
        Self {
            capacity: 32,
            element_size: 12,
        }
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_element_size(mut self, element_size: usize) -> Self {
        self.element_size = element_size;
        self
    }

    /// Total backing store size in bytes.
    pub fn storage_bytes(&self) -> Result<usize> {
        self.capacity.checked_mul(self.element_size).ok_or_else(|| {
            FifoError::Config(format!(
                "capacity {} * element_size {} overflows usize",
                self.capacity, self.element_size
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(FifoError::ZeroCapacity);
        }
        if self.element_size == 0 {
            return Err(FifoError::ZeroElementSize);
        }
        self.storage_bytes().map(|_| ())
    }

    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| FifoError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
