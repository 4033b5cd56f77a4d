mod image;
pub use self::image::*;
mod assemble;
pub use assemble::*;
mod catalog;
pub use catalog::*;
mod descriptor;
pub use descriptor::*;
mod matcher;
pub use matcher::{Candidate, RegionMatcher};
mod resolver;
pub use resolver::*;

/// Detection front door: owns the template catalog slot and the matching settings.
pub struct Ie {
	catalog: CatalogHandle,
	matcher: RegionMatcher,
	config: ResolverConfig,
}

impl Ie {
	pub fn new(matcher: RegionMatcher, config: ResolverConfig) -> Self {
		Self {
			catalog: CatalogHandle::new(),
			matcher,
			config,
		}
	}

	/// Makes the catalog available to detection. Only the first call takes effect.
	pub fn publish_catalog(&self, catalog: TemplateCatalog) -> bool {
		self.catalog.publish(catalog).is_ok()
	}

	pub fn catalog(&self) -> &CatalogHandle {
		&self.catalog
	}

	pub fn resolver(&self) -> SlotResolver<'_> {
		SlotResolver::new(&self.catalog, self.matcher, self.config)
	}

	/// Resolves every slot and assembles the build.
	pub fn detect(&self, regions: &[SlotRegion]) -> Result<Assembled, ResolveError> {
		let results = self.resolver().resolve_all(regions)?;
		Ok(assemble(&results))
	}
}
