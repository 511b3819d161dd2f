//! District visual state - the rendering-side consumer of fog deltas.
//!
//! The card economy and the boss director only *report* fog changes; this
//! module owns the mutation and the derived render model.

use serde::Serialize;

use game_content::{DistrictId, DistrictProgress, PlayerState};

/// Render model of one district.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictVisual {
    pub brightness: f32,
    pub lights_count: u32,
    pub fog_density: f32,
    pub unlocked: bool,
}

/// Visual state derived from district progress: brightness grows with the
/// district level, fog recedes with it and thickens with active boss fog.
pub fn visual_state(progress: &DistrictProgress) -> DistrictVisual {
    let brightness = if progress.unlocked {
        (0.3 + progress.level as f32 * 0.1).min(1.0)
    } else {
        0.1
    };
    let base_fog = (0.8 - progress.level as f32 * 0.1).max(0.2);

    DistrictVisual {
        brightness,
        lights_count: progress.level * 2,
        fog_density: (base_fog + progress.fog).clamp(0.0, 1.0),
        unlocked: progress.unlocked,
    }
}

/// Apply a reported fog reduction, saturating at clear. A reduction without
/// a district clears fog everywhere.
pub fn apply_fog_reduction(player: &mut PlayerState, district: Option<&DistrictId>, amount: f32) {
    match district {
        Some(district) => {
            if let Some(progress) = player.districts.get_mut(district) {
                progress.fog = (progress.fog - amount).max(0.0);
            }
        }
        None => {
            for progress in player.districts.values_mut() {
                progress.fog = (progress.fog - amount).max(0.0);
            }
        }
    }
}
