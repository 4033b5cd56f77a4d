use std::collections::HashSet;

use data::{Build, EntityKind, MAX_ITEMS, MAX_TOMES};

use crate::{Candidate, SlotResult};

/// A build plus the slot results it was made from, after deduplication.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Assembled {
    pub build: Build,
    pub slots: Vec<SlotResult>,
}

fn capacity(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Character | EntityKind::Weapon => 1,
        EntityKind::Tome => MAX_TOMES,
        EntityKind::Item => MAX_ITEMS,
    }
}

/// Builds a [`Build`] from resolved slots.
///
/// Unresolved slots leave their field absent. When the same entity resolved in
/// several slots, or a kind resolved in more slots than the layout has, the
/// highest-confidence slots win (earlier slot on ties) and the rest revert to
/// unresolved, with the dropped entity as their first alternate.
pub fn assemble(results: &[SlotResult]) -> Assembled {
    let mut slots = results.to_vec();

    let mut order = (0..slots.len()).filter(|&i| slots[i].is_resolved()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        slots[b]
            .confidence
            .total_cmp(&slots[a].confidence)
            .then(a.cmp(&b))
    });

    let mut seen: HashSet<(EntityKind, &str)> = HashSet::new();
    let mut kept = vec![false; slots.len()];
    for i in order {
        let slot = &slots[i];
        let Some(id) = slot.resolved.as_deref() else {
            continue;
        };
        let used = seen.iter().filter(|(kind, _)| *kind == slot.kind).count();
        if used < capacity(slot.kind) && seen.insert((slot.kind, id)) {
            kept[i] = true;
        }
    }

    let mut build = Build::new();
    for (i, slot) in slots.iter().enumerate() {
        let Some(id) = slot.resolved.clone().filter(|_| kept[i]) else {
            continue;
        };
        let inserted = match slot.kind {
            EntityKind::Character => build.set_character(Some(id)),
            EntityKind::Weapon => build.set_weapon(Some(id)),
            EntityKind::Tome => build.add_tome(id),
            EntityKind::Item => build.add_item(id),
        };
        if let Err(err) = inserted {
            tracing::warn!(slot = i, %err, "dropping slot from build");
            kept[i] = false;
        }
    }

    for (i, slot) in slots.iter_mut().enumerate() {
        if kept[i] {
            continue;
        }
        if let Some(id) = slot.resolved.take() {
            tracing::debug!(slot = i, kind = %slot.kind, %id, "slot reverted to unresolved");
            slot.alternates.insert(
                0,
                Candidate {
                    entity_id: id,
                    kind: slot.kind,
                    score: slot.confidence,
                },
            );
        }
    }

    Assembled { build, slots }
}
