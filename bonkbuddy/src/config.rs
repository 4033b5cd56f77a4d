//! Persistent application configuration.
//!
//! Stored as JSON in a platform-appropriate config directory.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// On-disk configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
	/// Folder containing `data/` and `images/`. Discovered automatically when unset.
	pub assets_dir: Option<PathBuf>,

	/// Minimum score for a slot to resolve.
	pub threshold: f32,

	/// Scores this close to the best one are treated as a tie.
	pub tie_epsilon: f32,

	/// Candidates at or below this score are never reported.
	pub match_floor: f32,

	/// Alternates kept per slot for manual disambiguation.
	pub max_alternates: usize,

	/// Side length templates and regions are resampled to before comparing.
	pub descriptor_side: u32,

	/// Page that share links point at.
	pub share_base_url: String,

	/// How many entities can be compared at once.
	pub compare_capacity: usize,
}

impl Default for Config {
	fn default() -> Self {
		let resolver = ie::ResolverConfig::default();
		Self {
			assets_dir: None,
			threshold: resolver.threshold,
			tie_epsilon: resolver.tie_epsilon,
			match_floor: ie::RegionMatcher::DEFAULT_FLOOR,
			max_alternates: resolver.max_alternates,
			descriptor_side: ie::DEFAULT_SIDE,
			share_base_url: "http://localhost:8000/".to_string(),
			compare_capacity: data::DEFAULT_COMPARE_CAPACITY,
		}
	}
}

impl Config {
	/// Path to the config file.
	pub fn path() -> Result<PathBuf> {
		let base = dirs::config_dir().context("config_dir() unavailable")?;
		Ok(base.join("bonkbuddy.json"))
	}

	/// Load configuration from disk, falling back to defaults on any error.
	pub fn load_or_default() -> Self {
		match Self::try_load() {
			Ok(cfg) => cfg,
			Err(err) => {
				tracing::warn!(error = %err, "failed to load config; using defaults");
				Self::default()
			}
		}
	}

	pub fn try_load() -> Result<Self> {
		Self::load_from(&Self::path()?)
	}

	/// Missing files are not an error: they yield the defaults.
	pub fn load_from(path: &Path) -> Result<Self> {
		if !path.exists() {
			return Ok(Self::default());
		}
		let json = fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
		let cfg = serde_json::from_str(&json).with_context(|| format!("parse {:?}", path))?;
		Ok(cfg)
	}

	pub fn save(&self) -> Result<PathBuf> {
		let path = Self::path()?;
		self.save_to(&path)?;
		Ok(path)
	}

	pub fn save_to(&self, path: &Path) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).with_context(|| format!("create {:?}", parent))?;
		}
		let json = serde_json::to_string_pretty(self).context("serialize config")?;
		fs::write(path, json).with_context(|| format!("write {:?}", path))?;
		Ok(())
	}

	pub fn resolver_config(&self) -> ie::ResolverConfig {
		ie::ResolverConfig {
			threshold: self.threshold,
			tie_epsilon: self.tie_epsilon,
			max_alternates: self.max_alternates,
		}
	}

	pub fn matcher(&self) -> ie::RegionMatcher {
		ie::RegionMatcher::new(self.match_floor)
	}
}
