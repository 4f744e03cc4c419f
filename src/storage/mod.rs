//! Pending coupon persistence.
//!
//! The coupon awaiting results lives in a single JSON file so that a
//! restart can resume verification. Writes go to a sibling `.tmp` file
//! which is then renamed over the target, so a crash mid-write leaves
//! either the previous file or the new one, never a truncated one.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::coupon::Coupon;

/// JSON file holding at most one pending coupon.
#[derive(Debug, Clone)]
pub struct CouponStore {
    path: PathBuf,
}

impl CouponStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    /// Replace the stored coupon.
    pub fn save(&self, coupon: &Coupon) -> Result<()> {
        let json = serde_json::to_vec_pretty(coupon).context("Failed to serialise coupon")?;
        let tmp = self.tmp_path();

        fs::write(&tmp, &json)
            .with_context(|| format!("Failed to write coupon to {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to move coupon into {}", self.path.display()))?;

        debug!(path = %self.path.display(), coupon_id = %coupon.id, legs = coupon.legs.len(), "Coupon saved");
        Ok(())
    }

    /// The stored coupon, or `None` when nothing is pending.
    pub fn load(&self) -> Result<Option<Coupon>> {
        let json = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No pending coupon on disk");
                return Ok(None);
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read coupon from {}", self.path.display()))
            }
        };

        let coupon: Coupon = serde_json::from_slice(&json)
            .with_context(|| format!("Failed to parse coupon from {}", self.path.display()))?;

        info!(
            path = %self.path.display(),
            coupon_id = %coupon.id,
            legs = coupon.legs.len(),
            total_odds = %coupon.total_odds,
            "Pending coupon loaded from disk"
        );
        Ok(Some(coupon))
    }

    /// Remove the stored coupon. Missing files are fine.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("Failed to delete coupon file {}", self.path.display())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
