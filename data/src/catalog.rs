use std::collections::HashMap;

use anyhow::Context;

use crate::{Entity, EntityKind, Rarity};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
	#[error("duplicate entity id `{0}`")]
	Duplicate(String),
	#[error(transparent)]
	InvalidId(#[from] crate::BuildError),
}

/// Accumulates entities before the catalog is frozen.
#[derive(Default)]
pub struct EntityCatalogBuilder {
	strings: lasso::Rodeo,
	entities: HashMap<lasso::Spur, Entity>,
}

impl EntityCatalogBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, entity: Entity) -> Result<(), CatalogError> {
		crate::build::validate_id(&entity.id)?;
		let key = self.strings.get_or_intern(&entity.id);
		if self.entities.contains_key(&key) {
			return Err(CatalogError::Duplicate(entity.id));
		}
		self.entities.insert(key, entity);
		Ok(())
	}

	/// Parses one game data file (`characters.json`, `items.json`, ...) and adds its entities.
	pub fn add_json(&mut self, kind: EntityKind, json: &str) -> anyhow::Result<usize> {
		let file: crate::schema::entities::EntityFile =
			serde_json::from_str(json).with_context(|| format!("Parse {} data", kind.plural()))?;

		let count = file.entities.len();
		for raw in file.entities {
			let rarity = raw.rarity.as_deref().and_then(|r| match r.parse::<Rarity>() {
				Ok(r) => Some(r),
				Err(err) => {
					tracing::warn!(id = %raw.id, %err, "ignoring unknown rarity");
					None
				}
			});

			self.insert(Entity {
				id: raw.id,
				display_name: raw.name,
				kind,
				rarity,
				stacks_well: raw.stacks_well,
				image: raw.image,
			})
			.with_context(|| format!("Load {}", kind.plural()))?;
		}
		Ok(count)
	}

	pub fn build(self) -> EntityCatalog {
		EntityCatalog {
			strings: self.strings.into_reader(),
			entities: self.entities,
		}
	}
}

/// Read-only id → entity lookup shared by the resolver, the codec and the front end.
pub struct EntityCatalog {
	strings: lasso::RodeoReader,
	entities: HashMap<lasso::Spur, Entity>,
}

impl Default for EntityCatalog {
	fn default() -> Self {
		EntityCatalogBuilder::new().build()
	}
}

impl EntityCatalog {
	pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Result<Self, CatalogError> {
		let mut builder = EntityCatalogBuilder::new();
		for entity in entities {
			builder.insert(entity)?;
		}
		Ok(builder.build())
	}

	pub fn len(&self) -> usize {
		self.entities.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entities.is_empty()
	}

	pub fn resolve(&self, id: &str) -> Option<&Entity> {
		self.entities.get(&self.strings.get(id)?)
	}

	/// Like [`resolve`](Self::resolve), but only if the entity is of `kind`.
	pub fn resolve_kind(&self, id: &str, kind: EntityKind) -> Option<&Entity> {
		self.resolve(id).filter(|v| v.kind == kind)
	}

	/// All entities of a kind, ordered by id.
	pub fn of_kind(&self, kind: EntityKind) -> Vec<&Entity> {
		let mut out = self
			.entities
			.values()
			.filter(|v| v.kind == kind)
			.collect::<Vec<_>>();
		out.sort_by(|a, b| a.id.cmp(&b.id));
		out
	}

	/// Finds the entity a user most likely meant by `name` (an id or a display name).
	///
	/// Returns `None` rather than guessing when nothing is reasonably close.
	pub fn closest_by_name(&self, kind: EntityKind, name: &str) -> Option<&Entity> {
		let name = name.trim();
		if name.is_empty() {
			return None;
		}
		if let Some(entity) = self.resolve_kind(name, kind) {
			return Some(entity);
		}

		let candidates = self.of_kind(kind);
		if let Some(entity) = candidates.iter().find(|v| v.display_name.eq_ignore_ascii_case(name)) {
			return Some(entity);
		}

		let lower = name.to_lowercase();
		let mut best: Option<(&Entity, usize)> = None;
		for entity in candidates {
			let lev = levenshtein::levenshtein(&lower, &entity.display_name.to_lowercase());
			if best.is_none_or(|(_, min)| lev < min) {
				best = Some((entity, lev));
			}
		}

		let (entity, lev) = best?;
		let max_len = lower.len().max(entity.display_name.len());
		if lev > (max_len / 2).max(3) {
			return None;
		}
		Some(entity)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entity(id: &str, name: &str, kind: EntityKind) -> Entity {
		Entity {
			id: id.into(),
			display_name: name.into(),
			kind,
			rarity: None,
			stacks_well: None,
			image: None,
		}
	}

	fn catalog() -> EntityCatalog {
		EntityCatalog::from_entities([
			entity("warrior", "Warrior", EntityKind::Character),
			entity("sword_a", "Sword of Ages", EntityKind::Weapon),
			entity("sword_b", "Sword of Bones", EntityKind::Weapon),
			entity("fire_tome", "Fire Tome", EntityKind::Tome),
		])
		.unwrap()
	}

	#[test]
	fn resolves_known_ids_only() {
		let catalog = catalog();
		assert_eq!(catalog.resolve("warrior").map(|v| v.kind), Some(EntityKind::Character));
		assert!(catalog.resolve("ninja").is_none());
		assert!(catalog.resolve_kind("warrior", EntityKind::Weapon).is_none());
	}

	#[test]
	fn rejects_duplicate_ids() {
		let err = EntityCatalog::from_entities([
			entity("warrior", "Warrior", EntityKind::Character),
			entity("warrior", "Other Warrior", EntityKind::Character),
		])
		.err();
		assert_eq!(err, Some(CatalogError::Duplicate("warrior".into())));
	}

	#[test]
	fn lists_by_kind_in_id_order() {
		let catalog = catalog();
		let ids = catalog
			.of_kind(EntityKind::Weapon)
			.into_iter()
			.map(|v| v.id.as_str())
			.collect::<Vec<_>>();
		assert_eq!(ids, ["sword_a", "sword_b"]);
	}

	#[test]
	fn closest_by_name_prefers_exact_then_near() {
		let catalog = catalog();
		let find = |name| catalog.closest_by_name(EntityKind::Weapon, name).map(|v| v.id.as_str());
		assert_eq!(find("sword_b"), Some("sword_b"));
		assert_eq!(find("sword of ages"), Some("sword_a"));
		assert_eq!(find("Sword of Bonez"), Some("sword_b"));
		assert_eq!(find("Rocket Launcher 9000"), None);
		assert_eq!(find("   "), None);
	}

	#[test]
	fn loads_game_data_files() {
		let json = r#"{"items": [
			{"id": "moldy_cheese", "name": "Moldy Cheese", "rarity": "rare", "stacks_well": true},
			{"id": "gym_sauce", "name": "Gym Sauce", "rarity": "mythic", "image": "images/items/gym_sauce.png"}
		]}"#;
		let mut builder = EntityCatalogBuilder::new();
		assert_eq!(builder.add_json(EntityKind::Item, json).unwrap(), 2);
		let catalog = builder.build();

		let cheese = catalog.resolve("moldy_cheese").unwrap();
		assert_eq!(cheese.rarity, Some(Rarity::Rare));
		assert_eq!(cheese.stacks_well, Some(true));

		let sauce = catalog.resolve("gym_sauce").unwrap();
		assert_eq!(sauce.rarity, None);
		assert_eq!(sauce.stacks_well, None);
		assert_eq!(sauce.image.as_deref(), Some("images/items/gym_sauce.png"));
	}

	#[test]
	fn rejects_ids_that_cannot_be_shared() {
		let mut builder = EntityCatalogBuilder::new();
		let json = r#"{"tomes": [{"id": "bad id", "name": "Bad"}]}"#;
		assert!(builder.add_json(EntityKind::Tome, json).is_err());
	}
}
