//! Reference templates for every detectable entity, bucketed by kind and rarity.

use std::collections::HashMap;
use std::sync::OnceLock;

use anyhow::{Context, Result, ensure};
use data::{EntityKind, Rarity};

use crate::{Descriptor, Image, OwnedImage};

/// One reference representation of an entity.
#[derive(Debug, Clone)]
pub struct Template {
    pub entity_id: String,
    pub kind: EntityKind,
    pub rarity: Rarity,
    pub descriptor: Descriptor,
}

pub struct TemplateCatalogBuilder {
    side: u32,
    templates: Vec<Template>,
}

impl TemplateCatalogBuilder {
    /// All descriptors in the catalog are computed at `side × side`.
    pub fn new(side: u32) -> Self {
        Self {
            side: side.max(1),
            templates: Vec::new(),
        }
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// An entity may have several templates (e.g. alternate icons); the matcher keeps its best score.
    pub fn add_template(&mut self, template: Template) -> Result<()> {
        data::validate_id(&template.entity_id)?;
        ensure!(
            template.descriptor.side() == self.side,
            "template `{}` has side {} but the catalog uses {}",
            template.entity_id,
            template.descriptor.side(),
            self.side
        );
        self.templates.push(template);
        Ok(())
    }

    pub fn add_image(&mut self, entity_id: impl Into<String>, kind: EntityKind, rarity: Rarity, image: Image) -> Result<()> {
        let entity_id = entity_id.into();
        ensure!(!image.is_empty(), "template `{entity_id}` is empty");
        let descriptor = Descriptor::from_image(image, self.side)
            .with_context(|| format!("describe template `{entity_id}`"))?;
        self.add_template(Template {
            entity_id,
            kind,
            rarity,
            descriptor,
        })
    }

    /// Add a template from encoded image bytes (PNG, WebP, ...).
    pub fn add_encoded(&mut self, entity_id: impl Into<String>, kind: EntityKind, rarity: Rarity, bytes: &[u8]) -> Result<()> {
        let entity_id = entity_id.into();
        let image = OwnedImage::from_encoded(bytes).with_context(|| format!("decode template `{entity_id}`"))?;
        self.add_image(entity_id, kind, rarity, image.as_image())
    }

    pub fn build(mut self) -> TemplateCatalog {
        self.templates
            .sort_by(|a, b| (a.kind, &a.entity_id).cmp(&(b.kind, &b.entity_id)));

        let mut by_rarity: HashMap<Rarity, Vec<usize>> = HashMap::new();
        let mut by_kind: HashMap<EntityKind, Vec<usize>> = HashMap::new();
        for (i, t) in self.templates.iter().enumerate() {
            by_rarity.entry(t.rarity).or_default().push(i);
            by_kind.entry(t.kind).or_default().push(i);
        }

        tracing::debug!(templates = self.templates.len(), side = self.side, "template catalog built");

        TemplateCatalog {
            side: self.side,
            templates: self.templates,
            by_rarity,
            by_kind,
        }
    }
}

/// Immutable template index. Safe to share between concurrent matches.
#[derive(Debug)]
pub struct TemplateCatalog {
    side: u32,
    templates: Vec<Template>,
    by_rarity: HashMap<Rarity, Vec<usize>>,
    by_kind: HashMap<EntityKind, Vec<usize>>,
}

impl TemplateCatalog {
    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Every template of a rarity tier, across all kinds.
    pub fn templates_for_rarity(&self, tier: Rarity) -> impl Iterator<Item = &Template> {
        self.bucket(self.by_rarity.get(&tier))
    }

    pub fn all_templates_of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Template> {
        self.bucket(self.by_kind.get(&kind))
    }

    /// Templates of `kind`, restricted to `tier` when it is known.
    pub fn templates_for(&self, kind: EntityKind, tier: Option<Rarity>) -> Vec<&Template> {
        match tier {
            Some(tier) => self.templates_for_rarity(tier).filter(|t| t.kind == kind).collect(),
            None => self.all_templates_of_kind(kind).collect(),
        }
    }

    fn bucket<'s>(&'s self, indices: Option<&'s Vec<usize>>) -> impl Iterator<Item = &'s Template> {
        indices
            .into_iter()
            .flatten()
            .filter_map(|&i| self.templates.get(i))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("template catalog has not finished loading")]
pub struct CatalogNotReady;

/// Write-once slot holding the template catalog.
///
/// It is either empty (still loading) or holds the complete catalog; readers
/// never observe a partially populated one.
#[derive(Debug, Default)]
pub struct CatalogHandle(OnceLock<TemplateCatalog>);

impl CatalogHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready(catalog: TemplateCatalog) -> Self {
        Self(OnceLock::from(catalog))
    }

    /// Publishes the catalog. Returns it back if one was already published.
    pub fn publish(&self, catalog: TemplateCatalog) -> Result<(), TemplateCatalog> {
        self.0.set(catalog)
    }

    pub fn is_ready(&self) -> bool {
        self.0.get().is_some()
    }

    pub fn get(&self) -> Result<&TemplateCatalog, CatalogNotReady> {
        self.0.get().ok_or(CatalogNotReady)
    }
}
