use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Build detection and sharing for Megabonk runs", long_about = None)]
pub struct Cli {
	/// Folder containing `data/` and `images/` (overrides the config)
	#[arg(long, global = true)]
	pub assets: Option<PathBuf>,

	/// Minimum match score for a slot to resolve (overrides the config)
	#[arg(long, global = true)]
	pub threshold: Option<f32>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Detect a build from a screenshot and its slot layout
	Detect {
		/// Layout file: `{"screenshot": "...", "slots": [{"kind", "x", "y", "w", "h", "rarity"?}]}`
		layout: PathBuf,

		/// Also print a share link
		#[arg(long)]
		link: bool,
	},
	/// Encode a build given by ids or display names
	Encode {
		#[arg(long)]
		character: Option<String>,
		#[arg(long)]
		weapon: Option<String>,
		#[arg(long = "tome")]
		tomes: Vec<String>,
		#[arg(long = "item")]
		items: Vec<String>,

		/// Also print a share link
		#[arg(long)]
		link: bool,
	},
	/// Decode a build token or share link
	Decode {
		token: String,
	},
	/// Look up entities side by side
	Compare {
		#[arg(required = true)]
		ids: Vec<String>,
	},
	/// Show or persist the configuration
	Config {
		#[command(subcommand)]
		action: ConfigAction,
	},
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigAction {
	/// Print the effective configuration
	Show,
	/// Write the effective configuration to the config file
	Save,
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn command_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn repeated_tomes_and_items_collect() {
		let cli = Cli::parse_from([
			"bonkbuddy", "encode", "--character", "Fox", "--tome", "damage", "--tome", "xp", "--item", "cheese",
		]);
		let Command::Encode { character, weapon, tomes, items, link } = cli.command else {
			panic!("expected encode");
		};
		assert_eq!(character.as_deref(), Some("Fox"));
		assert_eq!(weapon, None);
		assert_eq!(tomes, ["damage", "xp"]);
		assert_eq!(items, ["cheese"]);
		assert!(!link);
	}

	#[test]
	fn global_overrides_parse_after_subcommand() {
		let cli = Cli::parse_from(["bonkbuddy", "decode", "1.AA", "--threshold", "0.7"]);
		assert_eq!(cli.threshold, Some(0.7));
		assert!(matches!(cli.command, Command::Decode { .. }));
	}

	#[test]
	fn compare_requires_ids() {
		assert!(Cli::try_parse_from(["bonkbuddy", "compare"]).is_err());
	}
}
