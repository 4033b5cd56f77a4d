use std::path::Path;

use anyhow::{Context, Result, bail};
use data::{Build, CompareList, Entity, EntityCatalog, EntityKind, StaleReference, codec};
use serde::Serialize;

use crate::cli::{Cli, Command, ConfigAction};
use crate::config::Config;
use crate::layout::Layout;
use crate::util::assets::{Assets, resolve_assets};

#[derive(Serialize)]
struct Shared<'a> {
	build: &'a Build,
	token: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	link: Option<String>,
}

impl<'a> Shared<'a> {
	fn new(build: &'a Build, config: &Config, link: bool) -> Self {
		Self {
			build,
			token: codec::encode(build),
			link: link.then(|| codec::share_link(&config.share_base_url, build)),
		}
	}
}

#[derive(Serialize)]
struct Detected<'a> {
	slots: &'a [ie::SlotResult],
	#[serde(flatten)]
	shared: Shared<'a>,
}

#[derive(Serialize)]
struct DecodedOut<'a> {
	build: &'a Build,
	stale: &'a [StaleReference],
}

#[derive(Serialize)]
struct Compared<'a> {
	capacity: usize,
	entities: Vec<&'a Entity>,
}

fn print_json(value: &impl Serialize) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(value).context("serialize output")?);
	Ok(())
}

pub fn run(cli: Cli) -> Result<()> {
	let mut config = Config::load_or_default();
	if let Some(dir) = cli.assets {
		config.assets_dir = Some(dir);
	}
	if let Some(threshold) = cli.threshold {
		config.threshold = threshold;
	}

	match cli.command {
		Command::Detect { layout, link } => detect(&config, &layout, link),
		Command::Encode {
			character,
			weapon,
			tomes,
			items,
			link,
		} => {
			let catalog = assets(&config)?.load_entities()?;
			let build = build_from_names(&catalog, character.as_deref(), weapon.as_deref(), &tomes, &items)?;
			print_json(&Shared::new(&build, &config, link))
		}
		Command::Decode { token } => {
			let catalog = assets(&config)?.load_entities()?;
			let decoded = decode(&catalog, &token)?;
			print_json(&DecodedOut {
				build: &decoded.build,
				stale: &decoded.stale,
			})
		}
		Command::Compare { ids } => {
			let catalog = assets(&config)?.load_entities()?;
			let entities = compare(&catalog, &ids, config.compare_capacity)?;
			print_json(&Compared {
				capacity: config.compare_capacity,
				entities,
			})
		}
		Command::Config { action } => match action {
			ConfigAction::Show => print_json(&config),
			ConfigAction::Save => {
				let path = config.save()?;
				tracing::info!(path = %path.display(), "config saved");
				Ok(())
			}
		},
	}
}

fn assets(config: &Config) -> Result<Assets> {
	resolve_assets(config.assets_dir.as_deref())
}

fn detect(config: &Config, layout: &Path, link: bool) -> Result<()> {
	let assets = assets(config)?;
	let entities = assets.load_entities()?;
	let templates = assets.load_templates(&entities, config.descriptor_side)?;

	let ie = ie::Ie::new(config.matcher(), config.resolver_config());
	ie.publish_catalog(templates);

	let layout = Layout::load(layout)?;
	let screenshot = ie::OwnedImage::open(&layout.screenshot)?;
	let regions = layout.regions(&screenshot);
	let assembled = ie.detect(&regions)?;

	let resolved = assembled.slots.iter().filter(|s| s.is_resolved()).count();
	tracing::info!(slots = assembled.slots.len(), resolved, "detection finished");

	print_json(&Detected {
		slots: &assembled.slots,
		shared: Shared::new(&assembled.build, config, link),
	})
}

fn lookup<'a>(catalog: &'a EntityCatalog, kind: EntityKind, name: &str) -> Result<&'a Entity> {
	let entity = catalog
		.closest_by_name(kind, name)
		.with_context(|| format!("no {kind} matches `{name}`"))?;
	if entity.id != name && entity.display_name != name {
		tracing::info!(%kind, input = name, id = %entity.id, "using closest match");
	}
	Ok(entity)
}

/// Builds a [`Build`] from ids or display names. Misspelled names resolve to the closest entity.
fn build_from_names(
	catalog: &EntityCatalog,
	character: Option<&str>,
	weapon: Option<&str>,
	tomes: &[String],
	items: &[String],
) -> Result<Build> {
	let mut build = Build::new();
	if let Some(name) = character {
		build.set_character(Some(lookup(catalog, EntityKind::Character, name)?.id.clone()))?;
	}
	if let Some(name) = weapon {
		build.set_weapon(Some(lookup(catalog, EntityKind::Weapon, name)?.id.clone()))?;
	}
	for name in tomes {
		build.add_tome(lookup(catalog, EntityKind::Tome, name)?.id.clone())?;
	}
	for name in items {
		build.add_item(lookup(catalog, EntityKind::Item, name)?.id.clone())?;
	}
	Ok(build)
}

/// Accepts a bare token or a share link.
fn decode(catalog: &EntityCatalog, input: &str) -> Result<data::Decoded> {
	let token = codec::token_from_link(input).unwrap_or(input);
	let decoded = codec::decode(token, catalog).with_context(|| format!("decode `{token}`"))?;
	for stale in &decoded.stale {
		tracing::warn!("{stale}");
	}
	Ok(decoded)
}

fn compare<'a>(catalog: &'a EntityCatalog, ids: &[String], capacity: usize) -> Result<Vec<&'a Entity>> {
	let mut list = CompareList::with_capacity(capacity);
	for id in ids {
		let Some(entity) = catalog.resolve(id) else {
			bail!("unknown entity `{id}`");
		};
		if !list.add(entity.id.clone())? {
			tracing::debug!(%id, "already in compare list");
		}
	}
	Ok(list.iter().filter_map(|id| catalog.resolve(id)).collect())
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
			entity("fox", "Fox", EntityKind::Character),
			entity("bow", "Bow", EntityKind::Weapon),
			entity("damage_tome", "Damage Tome", EntityKind::Tome),
			entity("xp_tome", "XP Tome", EntityKind::Tome),
			entity("moldy_cheese", "Moldy Cheese", EntityKind::Item),
			entity("gym_sauce", "Gym Sauce", EntityKind::Item),
		])
		.unwrap()
	}

	#[test]
	fn names_resolve_to_ids() {
		let catalog = catalog();
		let build = build_from_names(
			&catalog,
			Some("fox"),
			Some("Bow"),
			&["Damage Tome".into(), "xp_tome".into()],
			&["Moldy Chese".into()],
		)
		.unwrap();
		assert_eq!(build.character(), Some("fox"));
		assert_eq!(build.weapon(), Some("bow"));
		assert_eq!(build.tomes(), ["damage_tome", "xp_tome"]);
		assert_eq!(build.items(), ["moldy_cheese"]);
	}

	#[test]
	fn unknown_names_are_errors() {
		let catalog = catalog();
		assert!(build_from_names(&catalog, Some("Definitely Nobody At All"), None, &[], &[]).is_err());
		// Names only match within their own kind.
		assert!(build_from_names(&catalog, None, Some("Gym Sauce"), &[], &[]).is_err());
	}

	#[test]
	fn duplicate_names_are_rejected() {
		let catalog = catalog();
		let tomes = ["Damage Tome".to_string(), "damage_tome".to_string()];
		assert!(build_from_names(&catalog, None, None, &tomes, &[]).is_err());
	}

	#[test]
	fn decode_accepts_links_and_tokens() {
		let catalog = catalog();
		let build = Build::new().with_character("fox").unwrap().with_item("gym_sauce").unwrap();
		let link = codec::share_link("http://localhost:8000/", &build);

		assert_eq!(decode(&catalog, &link).unwrap().build, build);
		assert_eq!(decode(&catalog, &codec::encode(&build)).unwrap().build, build);
		assert!(decode(&catalog, "not a token").is_err());
	}

	#[test]
	fn decode_reports_stale_ids() {
		let catalog = catalog();
		let build = Build::new().with_weapon("removed_blade").unwrap();
		let decoded = decode(&catalog, &codec::encode(&build)).unwrap();
		assert!(decoded.build.is_empty());
		assert_eq!(decoded.stale.len(), 1);
	}

	#[test]
	fn compare_respects_capacity() {
		let catalog = catalog();
		let ids = ["fox".to_string(), "bow".to_string(), "fox".to_string()];
		let entities = compare(&catalog, &ids, 2).unwrap();
		assert_eq!(entities.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), ["fox", "bow"]);

		let ids = ["fox".to_string(), "bow".to_string(), "gym_sauce".to_string()];
		assert!(compare(&catalog, &ids, 2).is_err());
		assert!(compare(&catalog, &["nobody".to_string()], 2).is_err());
	}
}
