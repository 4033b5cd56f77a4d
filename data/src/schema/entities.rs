use serde::Deserialize;

/// One game data file, e.g. `items.json`.
///
/// Every file holds a single list keyed by the plural kind name
/// (`{"items": [...]}`); the kind itself comes from the caller.
#[derive(Deserialize)]
pub struct EntityFile {
	#[serde(alias = "characters", alias = "weapons", alias = "tomes", alias = "items")]
	pub entities: Vec<RawEntity>,
}

#[derive(Deserialize)]
pub struct RawEntity {
	pub id: String,
	pub name: String,
	/// Free text in the data files; unknown tiers are treated as absent.
	pub rarity: Option<String>,
	/// Relative template path (`images/items/<id>.png`). Not all entities have one.
	pub image: Option<String>,
	pub stacks_well: Option<bool>,
}
