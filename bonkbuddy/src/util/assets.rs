use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use data::{EntityCatalog, EntityCatalogBuilder, EntityKind};

/// Game data and template images on disk.
///
/// ```text
/// <root>/data/characters.json    {"characters": [...]}
/// <root>/data/weapons.json       {"weapons": [...]}
/// <root>/data/tomes.json         {"tomes": [...]}
/// <root>/data/items.json         {"items": [...]}
/// <root>/images/<kind>s/<id>.png
/// ```
#[derive(Debug, Clone)]
pub struct Assets {
	pub root: PathBuf,
}

fn is_assets_dir(dir: &Path) -> bool {
	dir.join("data").is_dir() && dir.join("images").is_dir()
}

/// Find the assets folder in a way that works both:
/// - when running from the repo (`cargo run`), and
/// - when running a packaged binary (assets next to the executable).
///
/// An explicit `dir` (from the config or command line) wins; otherwise
/// `BONKBUDDY_ASSETS_DIR` is checked first.
pub fn resolve_assets(dir: Option<&Path>) -> Result<Assets> {
	if let Some(dir) = dir {
		if is_assets_dir(dir) {
			return Ok(Assets { root: dir.to_path_buf() });
		}
		bail!("{} does not contain data/ and images/", dir.display());
	}

	let mut candidates: Vec<PathBuf> = Vec::new();
	if let Some(dir) = std::env::var_os("BONKBUDDY_ASSETS_DIR") {
		candidates.push(PathBuf::from(dir));
	}
	if let Ok(exe) = std::env::current_exe()
		&& let Some(dir) = exe.parent()
	{
		candidates.push(dir.to_path_buf());
	}
	if let Ok(cwd) = std::env::current_dir() {
		candidates.push(cwd);
	}
	// Compile-time path to the workspace. Useful during local dev if the app is launched with a different CWD.
	#[cfg(debug_assertions)]
	candidates.push(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(".."));

	for dir in &candidates {
		if is_assets_dir(dir) {
			return Ok(Assets { root: dir.clone() });
		}
	}

	bail!(
		"Game assets not found. Expected a folder with data/ and images/.\n\nSearched in:\n{}\n\nFix: copy the assets next to the executable (or set BONKBUDDY_ASSETS_DIR to the folder that contains them).",
		candidates
			.into_iter()
			.map(|p| format!("  - {}", p.display()))
			.collect::<Vec<_>>()
			.join("\n")
	)
}

impl Assets {
	fn data_file(&self, kind: EntityKind) -> PathBuf {
		self.root.join("data").join(format!("{}.json", kind.plural()))
	}

	fn image_file(&self, entity: &data::Entity) -> PathBuf {
		match &entity.image {
			Some(rel) => self.root.join(rel),
			None => self
				.root
				.join("images")
				.join(entity.kind.plural())
				.join(format!("{}.png", entity.id)),
		}
	}

	/// Loads every data file that exists. A missing file means no entities of that kind.
	pub fn load_entities(&self) -> Result<EntityCatalog> {
		let mut builder = EntityCatalogBuilder::new();
		for kind in EntityKind::ALL {
			let path = self.data_file(kind);
			if !path.is_file() {
				tracing::warn!(path = %path.display(), "data file missing; no {} available", kind.plural());
				continue;
			}
			let json = std::fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
			let count = builder
				.add_json(kind, &json)
				.with_context(|| format!("load {}", path.display()))?;
			tracing::debug!(kind = %kind, count, "entities loaded");
		}
		Ok(builder.build())
	}

	/// Builds templates for every entity that has an image.
	///
	/// Entities without an image simply can't be detected; unreadable images are skipped with a warning.
	pub fn load_templates(&self, catalog: &EntityCatalog, side: u32) -> Result<ie::TemplateCatalog> {
		let mut builder = ie::TemplateCatalogBuilder::new(side);
		for kind in EntityKind::ALL {
			for entity in catalog.of_kind(kind) {
				let path = self.image_file(entity);
				if !path.is_file() {
					tracing::debug!(id = %entity.id, "no template image");
					continue;
				}
				let loaded = ie::OwnedImage::open(&path).and_then(|img| {
					builder.add_image(entity.id.clone(), kind, entity.rarity.unwrap_or_default(), img.as_image())
				});
				if let Err(err) = loaded {
					tracing::warn!(id = %entity.id, error = %format!("{err:#}"), "skipping template");
				}
			}
		}

		if builder.is_empty() {
			bail!("no template images found under {}", self.root.join("images").display());
		}
		tracing::info!(templates = builder.len(), "templates loaded");
		Ok(builder.build())
	}
}
