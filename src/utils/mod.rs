use anyhow::{Context, Result};
use std::path::Path;

/// Ensure directory exists
pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        std::fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {:?}", path))?;
    }
    Ok(())
}

/// Format duration as human-readable string
pub fn format_duration(secs: f64) -> String {
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else if secs < 3600.0 {
        format!("{:.1}m", secs / 60.0)
    } else {
        format!("{:.1}h", secs / 3600.0)
    }
}

/// Validation utilities
pub mod validation {
    use anyhow::{bail, Result};
    use std::fmt::Display;

    /// Validate that value is in range (inclusive)
    pub fn in_range<T: PartialOrd + Display>(value: T, min: T, max: T, name: &str) -> Result<()> {
        if value < min || value > max {
            bail!("{} must be between {} and {}, got {}", name, min, max, value);
        }
        Ok(())
    }

    /// Validate that value is positive
    pub fn positive<T: PartialOrd + Default + Display>(value: T, name: &str) -> Result<()> {
        if value <= T::default() {
            bail!("{} must be positive, got {}", name, value);
        }
        Ok(())
    }
}
