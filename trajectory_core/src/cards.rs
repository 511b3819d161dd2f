//! Card economy - unlock conditions, effort costs, equip and activation.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use game_content::{Card, CardId, CardKind, CardSet, DistrictId, PlayerState, UnlockCondition};

use crate::error::EngineError;

/// Uses a relic starts with when its content declares none.
const DEFAULT_RELIC_SESSIONS: u32 = 3;

/// Effect applied (or reported) by one activation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AppliedEffect {
    /// Stability bonus already credited to the player.
    Stability { value: u64 },
    /// Fog delta reported for the district-visual subsystem to apply.
    FogReduction {
        district: Option<DistrictId>,
        amount: f32,
    },
}

/// Successful unlock summary.
#[derive(Debug, Clone, Serialize)]
pub struct CardUnlocked {
    pub card: Card,
    pub effort_spent: u64,
    pub effort_remaining: u64,
}

/// Successful activation summary.
#[derive(Debug, Clone, Serialize)]
pub struct CardActivated {
    pub effects: Vec<AppliedEffect>,
    /// Skill card removed after its single use.
    pub consumed: bool,
    /// Relic card whose last use was just spent.
    pub expired: bool,
}

/// Inputs to the per-session effort payout.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionSummary {
    pub microsteps_count: u32,
}

/// Read-only card lookup plus the mutations of the card economy.
#[derive(Debug, Clone, Default)]
pub struct CardCatalog {
    cards: HashMap<CardId, Card>,
}

impl CardCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_card_set(set: CardSet) -> Self {
        Self {
            cards: set
                .cards
                .into_iter()
                .map(|card| (card.card_id.clone(), card))
                .collect(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::from_card_set(CardSet::from_json_str(json)?))
    }

    pub fn insert_card(&mut self, card: Card) {
        self.cards.insert(card.card_id.clone(), card);
    }

    pub fn get_card(&self, card_id: &CardId) -> Option<&Card> {
        self.cards.get(card_id)
    }

    /// Whether the card's unlock condition holds. Unknown cards never
    /// unlock; a card without a condition always does.
    pub fn check_unlock_conditions(&self, card_id: &CardId, player: &PlayerState) -> bool {
        match self.cards.get(card_id) {
            Some(card) => card
                .unlock_condition
                .as_ref()
                .map_or(true, |condition| condition_met(condition, player)),
            None => false,
        }
    }

    /// Effort price of a card at the given upgrade level. Unknown cards
    /// cost nothing.
    pub fn calculate_effort_cost(&self, card_id: &CardId, upgrade_level: u32) -> u64 {
        let Some(card) = self.cards.get(card_id) else {
            return 0;
        };
        if upgrade_level == 0 {
            card.effort_cost
        } else {
            (card.effort_cost as f64 * (1.0 + 0.5 * f64::from(upgrade_level))) as u64
        }
    }

    /// Every card not yet owned whose unlock condition currently holds,
    /// ordered by id.
    pub fn get_available_cards(&self, player: &PlayerState) -> Vec<&Card> {
        let mut available: Vec<&Card> = self
            .cards
            .values()
            .filter(|card| !player.owns_card(&card.card_id))
            .filter(|card| self.check_unlock_conditions(&card.card_id, player))
            .collect();
        available.sort_by(|a, b| a.card_id.as_str().cmp(b.card_id.as_str()));
        available
    }

    /// Unlock a card for effort. Atomic: on any failure neither ownership
    /// nor effort changes.
    pub fn unlock_card(
        &self,
        card_id: &CardId,
        player: &mut PlayerState,
    ) -> Result<CardUnlocked, EngineError> {
        let card = self
            .cards
            .get(card_id)
            .ok_or_else(|| EngineError::not_found("card", card_id.as_str()))?;

        if player.owns_card(card_id) {
            return Err(EngineError::precondition(format!(
                "card {card_id} is already owned"
            )));
        }
        if !self.check_unlock_conditions(card_id, player) {
            return Err(EngineError::precondition(format!(
                "unlock condition for {card_id} is not met"
            )));
        }

        let cost = self.calculate_effort_cost(card_id, 0);
        if player.effort < cost {
            return Err(EngineError::precondition(format!(
                "not enough effort: need {cost}, have {}",
                player.effort
            )));
        }

        player.effort -= cost;
        player.grant_card(card_id.clone());
        debug!(card = %card_id, cost, "card unlocked");

        Ok(CardUnlocked {
            card: card.clone(),
            effort_spent: cost,
            effort_remaining: player.effort,
        })
    }

    /// Equip a card into the single active slot, displacing any current one.
    pub fn equip_card(&self, card_id: &CardId, player: &mut PlayerState) -> Result<(), EngineError> {
        if !player.owns_card(card_id) {
            return Err(EngineError::precondition(format!(
                "card {card_id} is not owned"
            )));
        }

        if player.equipped_card.is_some() {
            self.unequip_card(player);
        }
        player.equipped_card = Some(card_id.clone());
        player.equipped_at = Some(Utc::now());
        Ok(())
    }

    /// Clear the active slot and its equip timestamp.
    pub fn unequip_card(&self, player: &mut PlayerState) {
        player.unequip();
    }

    /// Activate the equipped card and apply its effects.
    ///
    /// The stability bonus is credited immediately; fog reduction is only
    /// reported, the district-visual subsystem mutates fog (see
    /// [`crate::city::apply_fog_reduction`]).
    pub fn activate_card(
        &self,
        card_id: &CardId,
        player: &mut PlayerState,
    ) -> Result<CardActivated, EngineError> {
        let card = self
            .cards
            .get(card_id)
            .ok_or_else(|| EngineError::not_found("card", card_id.as_str()))?;

        if player.equipped_card.as_ref() != Some(card_id) {
            return Err(EngineError::precondition(format!(
                "card {card_id} is not equipped"
            )));
        }

        let mut effects = Vec::new();
        if let Some(bonus) = card.effect.stability_points {
            player.stability_points += bonus;
            effects.push(AppliedEffect::Stability { value: bonus });
        }
        if let Some(fog) = &card.effect.fog_reduction {
            effects.push(AppliedEffect::FogReduction {
                district: fog.district.clone(),
                amount: fog.amount,
            });
        }

        player.last_card_used = Some(card_id.clone());

        let mut consumed = false;
        let mut expired = false;
        match card.kind {
            CardKind::Skill => {
                player.remove_card(card_id);
                player.unequip();
                consumed = true;
            }
            CardKind::Relic => {
                let duration = card.duration_sessions.unwrap_or(DEFAULT_RELIC_SESSIONS);
                let uses = player.relic_uses.entry(card_id.clone()).or_insert(duration);
                *uses = uses.saturating_sub(1);
                if *uses == 0 {
                    player.relic_uses.remove(card_id);
                    player.remove_card(card_id);
                    player.unequip();
                    expired = true;
                }
            }
            CardKind::Permanent => {}
        }

        debug!(card = %card_id, consumed, expired, "card activated");
        Ok(CardActivated {
            effects,
            consumed,
            expired,
        })
    }

    /// Grant raw effort.
    pub fn add_effort(&self, player: &mut PlayerState, amount: u64) {
        player.effort += amount;
    }

    /// Effort payout for a completed session: a base of 2, +1 per recorded
    /// microstep, +1 when the session streak is at least 2.
    pub fn calculate_session_effort(&self, session: &SessionSummary, player: &PlayerState) -> u64 {
        let base = 2;
        let microsteps = u64::from(session.microsteps_count);
        let streak_bonus = u64::from(player.session_streak >= 2);
        base + microsteps + streak_bonus
    }
}

fn condition_met(condition: &UnlockCondition, player: &PlayerState) -> bool {
    match condition {
        UnlockCondition::Action { action, count } => {
            player.actions_history.get(action).copied().unwrap_or(0) >= *count
        }
        UnlockCondition::SessionsInDistrict { district, count } => {
            player.sessions_in(district) >= *count
        }
        UnlockCondition::CompleteLevel { level } => player.completed_levels.contains(level),
        UnlockCondition::StabilityPoints { amount } => player.stability_points >= *amount,
        UnlockCondition::ContractCompletion { contract } => {
            player.completed_contracts.contains(contract)
        }
        UnlockCondition::Combined { conditions } => {
            conditions.iter().all(|sub| condition_met(sub, player))
        }
    }
}
