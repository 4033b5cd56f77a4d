use std::collections::HashMap;

use data::EntityKind;

use crate::{Descriptor, Image, Template};

/// One scored guess for a region.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Candidate {
    pub entity_id: String,
    pub kind: EntityKind,
    /// Match strength in `[0, 1]`, higher is better.
    pub score: f32,
}

/// Best-first ordering: higher score first, then ascending id so equal scores are stable.
pub(crate) fn best_first(a: &Candidate, b: &Candidate) -> std::cmp::Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.entity_id.cmp(&b.entity_id))
}

/// Scores a captured region against candidate templates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionMatcher {
    floor: f32,
}

impl Default for RegionMatcher {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FLOOR)
    }
}

impl RegionMatcher {
    pub const DEFAULT_FLOOR: f32 = 0.05;

    pub fn new(floor: f32) -> Self {
        Self {
            floor: floor.clamp(0.0, 1.0),
        }
    }

    pub fn floor(&self) -> f32 {
        self.floor
    }

    /// Ranks `templates` against `region`, best first.
    ///
    /// Only scores strictly above the floor are kept, so an empty result just
    /// means nothing looked similar. An entity with several templates appears
    /// once, with its best score.
    pub fn match_region<'t>(&self, region: Image, templates: impl IntoIterator<Item = &'t Template>) -> Vec<Candidate> {
        if region.is_empty() {
            return Vec::new();
        }

        // Region descriptors per side; a catalog normally uses just one.
        let mut described: Vec<(u32, Descriptor)> = Vec::new();
        let mut best: HashMap<&str, Candidate> = HashMap::new();

        for template in templates {
            let side = template.descriptor.side();
            let descriptor = match described.iter().position(|(s, _)| *s == side) {
                Some(i) => &described[i].1,
                None => match Descriptor::from_image(region, side) {
                    Ok(d) => {
                        described.push((side, d));
                        &described[described.len() - 1].1
                    }
                    Err(err) => {
                        tracing::warn!(error = %err, side, "failed to describe region");
                        continue;
                    }
                },
            };

            let score = descriptor.similarity(&template.descriptor);
            if score <= self.floor {
                continue;
            }

            best.entry(template.entity_id.as_str())
                .and_modify(|c| c.score = c.score.max(score))
                .or_insert_with(|| Candidate {
                    entity_id: template.entity_id.clone(),
                    kind: template.kind,
                    score,
                });
        }

        let mut candidates = best.into_values().collect::<Vec<_>>();
        candidates.sort_by(best_first);
        candidates
    }
}
