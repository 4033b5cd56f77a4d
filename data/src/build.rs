//! The canonical in-memory build.
//!
//! A build only ever stores entity identifiers. Display data is looked up in
//! the [`EntityCatalog`](crate::EntityCatalog) when needed, so catalog updates
//! show up automatically and removed entities can be detected on decode.

use crate::EntityKind;

/// Number of tome slots in the build layout.
pub const MAX_TOMES: usize = 4;
/// Number of item slots in the build layout.
pub const MAX_ITEMS: usize = 12;
/// Longest identifier a build accepts (bytes).
pub const MAX_ID_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
	#[error("`{id}` is already in the build's {kind} list")]
	Duplicate { kind: EntityKind, id: String },
	#[error("no free {kind} slot (capacity {capacity})")]
	Full { kind: EntityKind, capacity: usize },
	#[error("invalid entity id `{0}`")]
	InvalidId(String),
}

/// Checks that `id` can be stored in a build and written to a token.
pub fn validate_id(id: &str) -> Result<(), BuildError> {
	let ok = !id.is_empty()
		&& id.len() <= MAX_ID_LEN
		&& id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-');
	if ok {
		Ok(())
	} else {
		Err(BuildError::InvalidId(id.to_owned()))
	}
}

/// A character, a weapon, up to [`MAX_TOMES`] tomes and up to [`MAX_ITEMS`] items.
///
/// Every field may be absent; `Build::default()` is the empty build.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Build {
	character: Option<String>,
	weapon: Option<String>,
	tomes: Vec<String>,
	items: Vec<String>,
}

impl Build {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn character(&self) -> Option<&str> {
		self.character.as_deref()
	}

	pub fn weapon(&self) -> Option<&str> {
		self.weapon.as_deref()
	}

	pub fn tomes(&self) -> &[String] {
		&self.tomes
	}

	pub fn items(&self) -> &[String] {
		&self.items
	}

	pub fn is_empty(&self) -> bool {
		self.character.is_none() && self.weapon.is_none() && self.tomes.is_empty() && self.items.is_empty()
	}

	pub fn set_character(&mut self, id: Option<String>) -> Result<(), BuildError> {
		self.character = checked(id)?;
		Ok(())
	}

	pub fn set_weapon(&mut self, id: Option<String>) -> Result<(), BuildError> {
		self.weapon = checked(id)?;
		Ok(())
	}

	pub fn clear_character(&mut self) {
		self.character = None;
	}

	pub fn clear_weapon(&mut self) {
		self.weapon = None;
	}

	pub fn add_tome(&mut self, id: impl Into<String>) -> Result<(), BuildError> {
		push_unique(&mut self.tomes, EntityKind::Tome, MAX_TOMES, id.into())
	}

	pub fn add_item(&mut self, id: impl Into<String>) -> Result<(), BuildError> {
		push_unique(&mut self.items, EntityKind::Item, MAX_ITEMS, id.into())
	}

	pub fn remove_tome(&mut self, id: &str) -> bool {
		remove(&mut self.tomes, id)
	}

	pub fn remove_item(&mut self, id: &str) -> bool {
		remove(&mut self.items, id)
	}

	/// Builder-style helpers, mostly for tests and fixtures.
	pub fn with_character(mut self, id: impl Into<String>) -> Result<Self, BuildError> {
		self.set_character(Some(id.into()))?;
		Ok(self)
	}

	pub fn with_weapon(mut self, id: impl Into<String>) -> Result<Self, BuildError> {
		self.set_weapon(Some(id.into()))?;
		Ok(self)
	}

	pub fn with_tome(mut self, id: impl Into<String>) -> Result<Self, BuildError> {
		self.add_tome(id)?;
		Ok(self)
	}

	pub fn with_item(mut self, id: impl Into<String>) -> Result<Self, BuildError> {
		self.add_item(id)?;
		Ok(self)
	}

	/// Every identifier in slot order, tagged with the slot kind it fills.
	pub fn ids(&self) -> impl Iterator<Item = (EntityKind, &str)> {
		self.character
			.iter()
			.map(|v| (EntityKind::Character, v.as_str()))
			.chain(self.weapon.iter().map(|v| (EntityKind::Weapon, v.as_str())))
			.chain(self.tomes.iter().map(|v| (EntityKind::Tome, v.as_str())))
			.chain(self.items.iter().map(|v| (EntityKind::Item, v.as_str())))
	}
}

fn checked(id: Option<String>) -> Result<Option<String>, BuildError> {
	if let Some(id) = &id {
		validate_id(id)?;
	}
	Ok(id)
}

fn push_unique(list: &mut Vec<String>, kind: EntityKind, capacity: usize, id: String) -> Result<(), BuildError> {
	validate_id(&id)?;
	if list.contains(&id) {
		return Err(BuildError::Duplicate { kind, id });
	}
	if list.len() >= capacity {
		return Err(BuildError::Full { kind, capacity });
	}
	list.push(id);
	Ok(())
}

fn remove(list: &mut Vec<String>, id: &str) -> bool {
	let before = list.len();
	list.retain(|v| v != id);
	list.len() != before
}
