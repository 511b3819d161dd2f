//! Session lifecycle - cooldown gate, start/complete, district unlocks.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use game_content::{DistrictId, GameConfig, PlayerState, SessionRecord};

use crate::error::EngineError;

/// Summary returned by [`complete_session`].
#[derive(Debug, Clone, Serialize)]
pub struct SessionCompleted {
    pub points: u64,
    pub total_points: u64,
    pub district_level: u32,
}

/// Whether the cooldown allows a new session at `now`.
pub fn can_start_session(
    player: &PlayerState,
    config: &GameConfig,
    now: DateTime<Utc>,
) -> Result<(), EngineError> {
    if config.session_cooldown_hours == 0 {
        return Ok(());
    }
    let Some(last) = player.last_session_time else {
        return Ok(());
    };

    let cooldown = Duration::hours(i64::from(config.session_cooldown_hours));
    let elapsed = now - last;
    if elapsed < cooldown {
        let remaining = cooldown - elapsed;
        let hours = remaining.num_hours();
        let minutes = remaining.num_minutes() % 60;
        return Err(EngineError::precondition(format!(
            "next session available in {hours}h {minutes}m"
        )));
    }
    Ok(())
}

/// Open a session in a district. Applies the cooldown gate and marks the
/// district as the most recent one.
pub fn start_session(
    player: &mut PlayerState,
    config: &GameConfig,
    district: DistrictId,
    emotion: Option<String>,
    intensity: Option<u32>,
    now: DateTime<Utc>,
) -> Result<SessionRecord, EngineError> {
    can_start_session(player, config, now)?;

    player.last_session_district = Some(district.clone());
    player.last_session_time = Some(now);
    debug!(district = %district, "session started");

    Ok(SessionRecord {
        district,
        emotion,
        intensity,
        started_at: now,
        completed: false,
        completed_at: None,
        points_earned: 0,
        level_id: None,
        act: None,
        microsteps_count: 0,
    })
}

/// Close a session: record history, grant stability points, advance the
/// district's session count and level, mark the completed level and act,
/// and check threshold unlocks.
pub fn complete_session(
    player: &mut PlayerState,
    config: &GameConfig,
    mut session: SessionRecord,
    points: Option<u64>,
    now: DateTime<Utc>,
) -> SessionCompleted {
    let points = points.unwrap_or(config.points_per_session);
    session.completed = true;
    session.completed_at = Some(now);
    session.points_earned = points;

    let district = session.district.clone();
    let level_id = session.level_id.clone();
    let act = session.act;

    player.push_session(session);
    player.stability_points += points;

    *player.district_sessions.entry(district.clone()).or_insert(0) += 1;
    player.last_session_district = Some(district.clone());
    let progress = player.districts.entry(district.clone()).or_default();
    progress.sessions_count += 1;
    progress.level += 1;
    let district_level = progress.level;

    if let Some(level_id) = level_id {
        player.completed_levels.insert(level_id);
    }
    if let Some(act) = act {
        player.acts_completed = player.acts_completed.max(act);
    }

    check_unlocks(player, config);

    debug!(district = %district, points, "session completed");
    SessionCompleted {
        points,
        total_points: player.stability_points,
        district_level,
    }
}

/// Unlock every still-locked district once stability reaches the threshold.
pub fn check_unlocks(player: &mut PlayerState, config: &GameConfig) {
    if player.stability_points < config.unlock_threshold {
        return;
    }
    for progress in player.districts.values_mut() {
        progress.unlocked = true;
    }
}
