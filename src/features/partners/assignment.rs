//! Partner assignment policy.
//!
//! Active partners reporting `high` or `medium` need are ranked by need tier,
//! then by fewest completed deliveries. When nobody qualifies the first active
//! partner of any need level is taken. Remaining ties keep the input order,
//! which the store supplies as registration order (oldest partner first).
//!
//! Pickup coordinates are not part of the ranking.

use uuid::Uuid;

use crate::features::partners::models::PartnerSnapshot;

/// Pick the partner that should receive a newly accepted delivery
pub fn select_partner(candidates: &[PartnerSnapshot]) -> Option<Uuid> {
    let ranked = candidates
        .iter()
        .filter(|p| p.active)
        .filter_map(|p| {
            p.need_level
                .priority()
                .map(|tier| (tier, p.delivered_count, p))
        })
        // min_by_key keeps the first of equal keys, preserving input order on ties
        .min_by_key(|(tier, delivered, _)| (*tier, *delivered))
        .map(|(_, _, p)| p.id);

    ranked.or_else(|| candidates.iter().find(|p| p.active).map(|p| p.id))
}
