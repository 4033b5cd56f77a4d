use std::fmt;

/// What an entity is, and equally which kind of build slot it occupies.
///
/// The declaration order is the fixed slot order used by the resolver output,
/// the build fields and the token payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
	Character,
	Weapon,
	Tome,
	Item,
}

impl EntityKind {
	pub const ALL: [Self; 4] = [Self::Character, Self::Weapon, Self::Tome, Self::Item];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Character => "character",
			Self::Weapon => "weapon",
			Self::Tome => "tome",
			Self::Item => "item",
		}
	}

	/// Key of the entity list inside the game data file, which is also the file stem.
	pub fn plural(&self) -> &'static str {
		match self {
			Self::Character => "characters",
			Self::Weapon => "weapons",
			Self::Tome => "tomes",
			Self::Item => "items",
		}
	}
}

impl fmt::Display for EntityKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for EntityKind {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| UnknownVariant(s.to_owned()))
	}
}

/// Game rarity tier. Only used to prune the template search space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rarity {
	#[default]
	Common,
	Uncommon,
	Rare,
	Epic,
	Legendary,
}

impl Rarity {
	pub const ALL: [Self; 5] = [Self::Common, Self::Uncommon, Self::Rare, Self::Epic, Self::Legendary];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Common => "common",
			Self::Uncommon => "uncommon",
			Self::Rare => "rare",
			Self::Epic => "epic",
			Self::Legendary => "legendary",
		}
	}
}

impl fmt::Display for Rarity {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl std::str::FromStr for Rarity {
	type Err = UnknownVariant;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::ALL
			.into_iter()
			.find(|v| v.as_str().eq_ignore_ascii_case(s.trim()))
			.ok_or_else(|| UnknownVariant(s.to_owned()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown variant `{0}`")]
pub struct UnknownVariant(pub String);

/// A character, weapon, tome or item as known to the catalog.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct Entity {
	pub id: String,
	pub display_name: String,
	pub kind: EntityKind,
	pub rarity: Option<Rarity>,
	/// Display-only hint for items; `None` when the data doesn't say.
	pub stacks_well: Option<bool>,
	/// Template image path relative to the assets directory.
	pub image: Option<String>,
}
