//! Slot resolution: turns per-slot regions into resolved entities (or not).

use data::{EntityKind, Rarity};
use rayon::prelude::*;

use crate::{CatalogHandle, CatalogNotReady, Candidate, Image, RegionMatcher, matcher::best_first};

#[derive(Debug, Clone, Copy, PartialEq, serde::Deserialize, serde::Serialize)]
pub struct ResolverConfig {
    /// Minimum top score for a slot to resolve.
    pub threshold: f32,
    /// Candidates within this distance of the top score count as tied.
    pub tie_epsilon: f32,
    /// How many alternates a slot keeps for manual disambiguation.
    pub max_alternates: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            threshold: 0.6,
            tie_epsilon: 0.01,
            max_alternates: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    CatalogNotReady(#[from] CatalogNotReady),
}

/// An already-cropped region for one build slot.
#[derive(Debug, Clone, Copy)]
pub struct SlotRegion<'a> {
    pub kind: EntityKind,
    pub image: Image<'a>,
    /// Known rarity of whatever is in the slot, if the game state tells us.
    pub rarity: Option<Rarity>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SlotResult {
    pub kind: EntityKind,
    /// `None` means unresolved; the alternates are the best guesses.
    pub resolved: Option<String>,
    /// Top score seen for the slot (0.0 when nothing matched).
    pub confidence: f32,
    /// Best-first, never containing the resolved entity.
    pub alternates: Vec<Candidate>,
}

impl SlotResult {
    pub fn unresolved(kind: EntityKind) -> Self {
        Self {
            kind,
            resolved: None,
            confidence: 0.0,
            alternates: Vec::new(),
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

pub struct SlotResolver<'c> {
    catalog: &'c CatalogHandle,
    matcher: RegionMatcher,
    config: ResolverConfig,
}

impl<'c> SlotResolver<'c> {
    pub fn new(catalog: &'c CatalogHandle, matcher: RegionMatcher, config: ResolverConfig) -> Self {
        Self { catalog, matcher, config }
    }

    pub fn resolve_slot(&self, region: &SlotRegion) -> Result<SlotResult, ResolveError> {
        let catalog = self.catalog.get()?;
        let templates = catalog.templates_for(region.kind, region.rarity);
        let candidates = self.matcher.match_region(region.image, templates);
        let result = pick(region.kind, candidates, &self.config);

        tracing::debug!(
            kind = %region.kind,
            resolved = result.resolved.as_deref().unwrap_or("-"),
            confidence = result.confidence,
            alternates = result.alternates.len(),
            "slot resolved"
        );
        Ok(result)
    }

    /// Resolves every slot, in parallel. Output order matches `regions`.
    pub fn resolve_all(&self, regions: &[SlotRegion]) -> Result<Vec<SlotResult>, ResolveError> {
        self.catalog.get()?;
        regions.par_iter().map(|r| self.resolve_slot(r)).collect()
    }

    /// Same as [`resolve_all`](Self::resolve_all) on the calling thread.
    pub fn resolve_all_sequential(&self, regions: &[SlotRegion]) -> Result<Vec<SlotResult>, ResolveError> {
        self.catalog.get()?;
        regions.iter().map(|r| self.resolve_slot(r)).collect()
    }
}

/// Applies the confidence threshold and tie-break rule to a candidate list.
///
/// Among candidates within `tie_epsilon` of the top score the lexicographically
/// smallest id wins.
pub fn pick(kind: EntityKind, mut candidates: Vec<Candidate>, config: &ResolverConfig) -> SlotResult {
    candidates.sort_by(best_first);

    let Some(top) = candidates.first().map(|c| c.score) else {
        return SlotResult::unresolved(kind);
    };

    if top < config.threshold {
        candidates.truncate(config.max_alternates);
        return SlotResult {
            kind,
            resolved: None,
            confidence: top,
            alternates: candidates,
        };
    }

    let winner = candidates
        .iter()
        .enumerate()
        .take_while(|(_, c)| top - c.score <= config.tie_epsilon)
        .min_by(|(_, a), (_, b)| a.entity_id.cmp(&b.entity_id))
        .map_or(0, |(i, _)| i);
    let winner = candidates.remove(winner);
    candidates.truncate(config.max_alternates);

    SlotResult {
        kind,
        resolved: Some(winner.entity_id),
        confidence: top,
        alternates: candidates,
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::{Color, OwnedImage, TemplateCatalogBuilder};

    fn candidate(id: &str, score: f32) -> Candidate {
        Candidate {
            entity_id: id.into(),
            kind: EntityKind::Item,
            score,
        }
    }

    fn emblem(fg: Color, bg: Color, cx: u32, cy: u32, r: u32) -> OwnedImage {
        OwnedImage::from_fn(64, 64, |x, y| {
            let (dx, dy) = (x.abs_diff(cx), y.abs_diff(cy));
            if dx * dx + dy * dy <= r * r { fg } else { bg }
        })
    }

    fn sword_a() -> OwnedImage {
        emblem(Color::new(230, 200, 60), Color::new(30, 30, 40), 24, 40, 14)
    }

    fn sword_b() -> OwnedImage {
        emblem(Color::new(90, 40, 200), Color::new(220, 220, 220), 44, 20, 10)
    }

    fn handle() -> CatalogHandle {
        let mut builder = TemplateCatalogBuilder::new(crate::DEFAULT_SIDE);
        builder.add_image("sword_a", EntityKind::Weapon, Rarity::Rare, sword_a().as_image()).unwrap();
        builder.add_image("sword_b", EntityKind::Weapon, Rarity::Epic, sword_b().as_image()).unwrap();
        CatalogHandle::ready(builder.build())
    }

    #[test]
    fn near_identical_region_resolves_within_rarity() {
        let handle = handle();
        let resolver = SlotResolver::new(&handle, RegionMatcher::default(), ResolverConfig::default());

        let mut capture = sword_a();
        capture.map_pixels(|c| {
            c.r = c.r.saturating_sub(3);
            c.b = c.b.saturating_add(2);
        });
        let region = SlotRegion {
            kind: EntityKind::Weapon,
            image: capture.as_image(),
            rarity: Some(Rarity::Rare),
        };

        let result = resolver.resolve_slot(&region).unwrap();
        assert_eq!(result.resolved.as_deref(), Some("sword_a"));
        assert!(result.confidence >= 0.6, "confidence = {}", result.confidence);
        assert!(result.alternates.iter().all(|c| c.entity_id != "sword_a"));
    }

    #[test]
    fn unknown_rarity_searches_every_tier() {
        let handle = handle();
        let resolver = SlotResolver::new(&handle, RegionMatcher::default(), ResolverConfig::default());
        let capture = sword_b();
        let region = SlotRegion {
            kind: EntityKind::Weapon,
            image: capture.as_image(),
            rarity: None,
        };
        assert_eq!(resolver.resolve_slot(&region).unwrap().resolved.as_deref(), Some("sword_b"));

        // Restricted to the wrong tier, sword_b is never a candidate.
        let restricted = resolver
            .resolve_slot(&SlotRegion { rarity: Some(Rarity::Rare), ..region })
            .unwrap();
        assert_ne!(restricted.resolved.as_deref(), Some("sword_b"));
        assert!(restricted.alternates.iter().all(|c| c.entity_id != "sword_b"));
    }

    #[test]
    fn data_shaped_misses_are_unresolved_not_errors() {
        let handle = handle();
        let resolver = SlotResolver::new(&handle, RegionMatcher::default(), ResolverConfig::default());
        let capture = sword_a();

        let empty = SlotRegion {
            kind: EntityKind::Weapon,
            image: capture.as_image().sub_image(0, 0, 0, 0),
            rarity: None,
        };
        assert_eq!(resolver.resolve_slot(&empty).unwrap(), SlotResult::unresolved(EntityKind::Weapon));

        let no_templates = SlotRegion {
            kind: EntityKind::Tome,
            image: capture.as_image(),
            rarity: None,
        };
        assert_eq!(resolver.resolve_slot(&no_templates).unwrap(), SlotResult::unresolved(EntityKind::Tome));
    }

    #[test]
    fn unloaded_catalog_is_a_distinct_error() {
        let handle = CatalogHandle::new();
        let resolver = SlotResolver::new(&handle, RegionMatcher::default(), ResolverConfig::default());
        let capture = sword_a();
        let region = SlotRegion {
            kind: EntityKind::Weapon,
            image: capture.as_image(),
            rarity: None,
        };
        assert_eq!(resolver.resolve_slot(&region), Err(ResolveError::CatalogNotReady(CatalogNotReady)));
        assert!(resolver.resolve_all(&[]).is_err());
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let handle = handle();
        let resolver = SlotResolver::new(&handle, RegionMatcher::default(), ResolverConfig::default());
        let a = sword_a();
        let b = sword_b();
        let noise = OwnedImage::from_fn(40, 40, |x, y| Color::new((x * 7) as u8, (y * 5) as u8, ((x + y) * 3) as u8));
        let regions = [
            SlotRegion { kind: EntityKind::Weapon, image: a.as_image(), rarity: None },
            SlotRegion { kind: EntityKind::Weapon, image: noise.as_image(), rarity: None },
            SlotRegion { kind: EntityKind::Weapon, image: b.as_image(), rarity: Some(Rarity::Epic) },
            SlotRegion { kind: EntityKind::Item, image: a.as_image(), rarity: None },
        ];
        let parallel = resolver.resolve_all(&regions).unwrap();
        let sequential = resolver.resolve_all_sequential(&regions).unwrap();
        assert_eq!(parallel, sequential);
        assert_eq!(parallel.len(), 4);
        assert_eq!(parallel[0].resolved.as_deref(), Some("sword_a"));
        assert_eq!(parallel[2].resolved.as_deref(), Some("sword_b"));
        assert!(!parallel[3].is_resolved());
    }

    #[test]
    fn below_threshold_keeps_top_candidates_as_alternates() {
        let config = ResolverConfig { max_alternates: 2, ..Default::default() };
        let result = pick(
            EntityKind::Item,
            vec![candidate("c", 0.3), candidate("a", 0.5), candidate("b", 0.4)],
            &config,
        );
        assert_eq!(result.resolved, None);
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.alternates, [candidate("a", 0.5), candidate("b", 0.4)]);
    }

    #[test]
    fn near_ties_go_to_the_smallest_id() {
        let result = pick(
            EntityKind::Item,
            vec![candidate("zeta", 0.905), candidate("alpha", 0.9), candidate("beta", 0.7)],
            &ResolverConfig::default(),
        );
        assert_eq!(result.resolved.as_deref(), Some("alpha"));
        assert_eq!(result.confidence, 0.905);
        assert_eq!(result.alternates, [candidate("zeta", 0.905), candidate("beta", 0.7)]);

        let clear = pick(
            EntityKind::Item,
            vec![candidate("zeta", 0.95), candidate("alpha", 0.9)],
            &ResolverConfig::default(),
        );
        assert_eq!(clear.resolved.as_deref(), Some("zeta"));
    }

    #[test]
    fn no_candidates_is_unresolved() {
        assert_eq!(pick(EntityKind::Tome, Vec::new(), &ResolverConfig::default()), SlotResult::unresolved(EntityKind::Tome));
    }

    fn arb_candidates() -> impl Strategy<Value = Vec<Candidate>> {
        proptest::collection::btree_map("[a-h]{1,3}", 0.0f32..=1.0, 1..8).prop_map(|m| {
            m.into_iter().map(|(id, score)| candidate(&id, score)).collect()
        })
    }

    proptest! {
        #[test]
        fn raising_the_top_score_never_unresolves(candidates in arb_candidates(), bump in 0.0f32..=0.5) {
            let config = ResolverConfig::default();
            let before = pick(EntityKind::Item, candidates.clone(), &config);

            let mut raised = candidates;
            raised.sort_by(best_first);
            raised[0].score = (raised[0].score + bump).min(1.0);
            let after = pick(EntityKind::Item, raised, &config);

            prop_assert!(!before.is_resolved() || after.is_resolved());
        }

        #[test]
        fn pick_ignores_input_order(mut candidates in arb_candidates()) {
            let config = ResolverConfig::default();
            let forward = pick(EntityKind::Item, candidates.clone(), &config);
            candidates.reverse();
            prop_assert_eq!(pick(EntityKind::Item, candidates, &config), forward);
        }
    }
}
