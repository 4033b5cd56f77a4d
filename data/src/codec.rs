//! Build tokens: compact, URL-safe, versioned strings that encode a [`Build`].
//!
//! Layout: `<version>.<payload>`, where the version is ASCII digits and the
//! payload is unpadded base64url of
//!
//! ```text
//! presence: u8               bit0 character, bit1 weapon, bit2 tomes, bit3 items
//! character: len u8, bytes   (if present)
//! weapon:    len u8, bytes   (if present)
//! tomes:     count u8, (len u8, bytes)*   (if present, count >= 1)
//! items:     count u8, (len u8, bytes)*   (if present, count >= 1)
//! ```
//!
//! Absent fields are omitted entirely. Every byte of the token is in
//! `[A-Za-z0-9._-]`, so it never needs percent-escaping.

use std::sync::LazyLock;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use regex::Regex;

use crate::{Build, BuildError, EntityCatalog, EntityKind};

/// Version tag written by [`encode`].
pub const VERSION: &str = "1";

const HAS_CHARACTER: u8 = 1 << 0;
const HAS_WEAPON: u8 = 1 << 1;
const HAS_TOMES: u8 = 1 << 2;
const HAS_ITEMS: u8 = 1 << 3;
const KNOWN_FIELDS: u8 = HAS_CHARACTER | HAS_WEAPON | HAS_TOMES | HAS_ITEMS;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
	#[error("unsupported build token version `{0}`")]
	UnsupportedVersion(String),
	#[error("malformed build token: {0}")]
	MalformedToken(&'static str),
}

/// An identifier that was valid when the token was made but no longer resolves.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StaleReference {
	pub kind: EntityKind,
	pub id: String,
}

impl std::fmt::Display for StaleReference {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} `{}` is no longer available", self.kind, self.id)
	}
}

/// Result of decoding a token against the current catalog.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Decoded {
	pub build: Build,
	/// Fields that were dropped because the catalog no longer knows them.
	pub stale: Vec<StaleReference>,
}

pub fn encode(build: &Build) -> String {
	let mut presence = 0u8;
	let mut body = Vec::new();

	if let Some(id) = build.character() {
		presence |= HAS_CHARACTER;
		write_id(&mut body, id);
	}
	if let Some(id) = build.weapon() {
		presence |= HAS_WEAPON;
		write_id(&mut body, id);
	}
	if !build.tomes().is_empty() {
		presence |= HAS_TOMES;
		write_list(&mut body, build.tomes());
	}
	if !build.items().is_empty() {
		presence |= HAS_ITEMS;
		write_list(&mut body, build.items());
	}

	let mut bytes = Vec::with_capacity(body.len() + 1);
	bytes.push(presence);
	bytes.extend_from_slice(&body);

	format!("{VERSION}.{}", URL_SAFE_NO_PAD.encode(bytes))
}

// Build invariants keep ids at most MAX_ID_LEN bytes and lists within capacity,
// so both always fit in a length byte.
fn write_id(out: &mut Vec<u8>, id: &str) {
	out.push(id.len() as u8);
	out.extend_from_slice(id.as_bytes());
}

fn write_list(out: &mut Vec<u8>, ids: &[String]) {
	out.push(ids.len() as u8);
	for id in ids {
		write_id(out, id);
	}
}

/// Decodes the structure of a token without consulting any catalog.
pub fn unpack(token: &str) -> Result<Build, CodecError> {
	let (tag, payload) = token
		.trim()
		.split_once('.')
		.ok_or(CodecError::MalformedToken("missing version separator"))?;

	if tag.is_empty() || !tag.bytes().all(|b| b.is_ascii_digit()) {
		return Err(CodecError::MalformedToken("version tag is not numeric"));
	}
	if tag != VERSION {
		return Err(CodecError::UnsupportedVersion(tag.to_owned()));
	}

	let bytes = URL_SAFE_NO_PAD
		.decode(payload)
		.map_err(|_| CodecError::MalformedToken("payload is not base64url"))?;
	let mut reader = Reader { bytes: &bytes, pos: 0 };

	let presence = reader.u8()?;
	if presence & !KNOWN_FIELDS != 0 {
		return Err(CodecError::MalformedToken("unknown field bits"));
	}

	let mut build = Build::new();
	if presence & HAS_CHARACTER != 0 {
		build.set_character(Some(reader.id()?.to_owned())).map_err(malformed)?;
	}
	if presence & HAS_WEAPON != 0 {
		build.set_weapon(Some(reader.id()?.to_owned())).map_err(malformed)?;
	}
	if presence & HAS_TOMES != 0 {
		for id in reader.list()? {
			build.add_tome(id).map_err(malformed)?;
		}
	}
	if presence & HAS_ITEMS != 0 {
		for id in reader.list()? {
			build.add_item(id).map_err(malformed)?;
		}
	}

	if reader.pos != bytes.len() {
		return Err(CodecError::MalformedToken("trailing bytes"));
	}
	Ok(build)
}

/// Decodes a token and checks every identifier against `catalog`.
///
/// Identifiers the catalog doesn't know (or knows as a different kind) are
/// dropped from the build and reported in [`Decoded::stale`].
pub fn decode(token: &str, catalog: &EntityCatalog) -> Result<Decoded, CodecError> {
	let mut build = unpack(token)?;

	let stale = build
		.ids()
		.filter(|(kind, id)| catalog.resolve_kind(id, *kind).is_none())
		.map(|(kind, id)| StaleReference { kind, id: id.to_owned() })
		.collect::<Vec<_>>();

	for reference in &stale {
		tracing::warn!(kind = %reference.kind, id = %reference.id, "build references removed content");
		match reference.kind {
			EntityKind::Character => build.clear_character(),
			EntityKind::Weapon => build.clear_weapon(),
			EntityKind::Tome => {
				build.remove_tome(&reference.id);
			}
			EntityKind::Item => {
				build.remove_item(&reference.id);
			}
		}
	}

	Ok(Decoded { build, stale })
}

fn malformed(err: BuildError) -> CodecError {
	CodecError::MalformedToken(match err {
		BuildError::Duplicate { .. } => "duplicate id in list",
		BuildError::Full { .. } => "list exceeds slot capacity",
		BuildError::InvalidId(_) => "invalid id",
	})
}

struct Reader<'a> {
	bytes: &'a [u8],
	pos: usize,
}

impl<'a> Reader<'a> {
	fn u8(&mut self) -> Result<u8, CodecError> {
		let v = *self
			.bytes
			.get(self.pos)
			.ok_or(CodecError::MalformedToken("truncated"))?;
		self.pos += 1;
		Ok(v)
	}

	fn id(&mut self) -> Result<&'a str, CodecError> {
		let len = self.u8()? as usize;
		let raw = self
			.bytes
			.get(self.pos..self.pos + len)
			.ok_or(CodecError::MalformedToken("truncated"))?;
		self.pos += len;
		std::str::from_utf8(raw).map_err(|_| CodecError::MalformedToken("id is not utf-8"))
	}

	fn list(&mut self) -> Result<Vec<&'a str>, CodecError> {
		let count = self.u8()?;
		if count == 0 {
			return Err(CodecError::MalformedToken("empty list marked present"));
		}
		(0..count).map(|_| self.id()).collect()
	}
}

// ----------

static LINK_TOKEN: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"#(?:[^#]*&)?build=(?<token>[^&#]*)").expect("regex"));

/// Renders a share link: `<base_url>#build=<token>`.
pub fn share_link(base_url: &str, build: &Build) -> String {
	let base = base_url.split('#').next().unwrap_or(base_url);
	format!("{base}#build={}", encode(build))
}

/// Pulls the token out of a share link's `#build=` fragment.
///
/// A link without the key, or with an empty value, has no token.
pub fn token_from_link(link: &str) -> Option<&str> {
	LINK_TOKEN
		.captures(link)
		.and_then(|c| c.name("token"))
		.map(|m| m.as_str())
		.filter(|t| !t.is_empty())
}
