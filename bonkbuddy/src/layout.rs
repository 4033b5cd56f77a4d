//! Slot boxes for a captured screenshot.
//!
//! Locating the slots is up to whoever writes the layout file; this module
//! only cuts the given boxes out of the screenshot.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use data::{EntityKind, Rarity};

/// Axis-aligned rectangle in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Rect {
	pub x: u32,
	pub y: u32,
	pub w: u32,
	pub h: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct SlotBox {
	pub kind: EntityKind,
	#[serde(flatten)]
	pub rect: Rect,
	#[serde(default)]
	pub rarity: Option<Rarity>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct Layout {
	/// Relative paths are resolved against the layout file's folder.
	pub screenshot: PathBuf,
	pub slots: Vec<SlotBox>,
}

impl Layout {
	pub fn load(path: &Path) -> Result<Self> {
		let json = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
		let mut layout: Self = serde_json::from_str(&json).with_context(|| format!("parse {}", path.display()))?;
		if layout.screenshot.is_relative()
			&& let Some(dir) = path.parent()
		{
			layout.screenshot = dir.join(&layout.screenshot);
		}
		Ok(layout)
	}

	/// Regions in slot order. Boxes reaching past the screenshot are clipped.
	pub fn regions<'a>(&self, screenshot: &'a ie::OwnedImage) -> Vec<ie::SlotRegion<'a>> {
		let image = screenshot.as_image();
		self.slots
			.iter()
			.map(|slot| {
				let Rect { x, y, w, h } = slot.rect;
				ie::SlotRegion {
					kind: slot.kind,
					image: image.sub_image(x, y, w, h),
					rarity: slot.rarity,
				}
			})
			.collect()
	}
}
