//! Main game state structure

use crate::core::{Card, CardId, EntityStore, Keyword, Player, PlayerId, SearchFilter, TargetRef};
use crate::core::Effect;
use crate::game::catalog;
use crate::game::{CombatState, Step, TurnStructure};
use crate::zones::{CardZone, PlayerZones};
use crate::{MtgError, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// First id handed out to cards; players take the ids below it
const FIRST_CARD_ID: u32 = 100;

pub const STARTING_LIFE: i32 = 20;
pub const MAX_HAND_SIZE: usize = 7;

/// A spell or ability waiting on the stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackItem {
    pub source: CardId,
    pub controller: PlayerId,
    /// Spells move their card when they leave the stack; abilities do not
    pub is_spell: bool,
    pub effects: SmallVec<[Effect; 2]>,
    pub target: Option<TargetRef>,
    /// Card picked for a library search, fixed before resolution
    pub search_choice: Option<CardId>,
}

impl StackItem {
    pub fn search_filter(&self) -> Option<SearchFilter> {
        self.effects.iter().find_map(|e| match e {
            Effect::SearchLibrary { filter } => Some(*filter),
            _ => None,
        })
    }
}

/// Complete game state
///
/// Cloning is a deep copy, which is what the search relies on when it
/// branches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub cards: EntityStore<Card>,
    /// Turn order
    pub players: Vec<Player>,
    /// Indexed like `players`
    pub player_zones: Vec<PlayerZones>,
    pub battlefield: CardZone,
    /// Top of the stack is the last element
    pub stack: Vec<StackItem>,
    pub turn: TurnStructure,
    pub combat: CombatState,
    /// Used for shuffles
    pub rng: ChaCha12Rng,
}

impl GameState {
    /// Create a new game with two players; the first one starts
    pub fn new_two_player(player1_name: &str, player2_name: &str, seed: u64) -> Self {
        let p1 = PlayerId::new(0);
        let p2 = PlayerId::new(1);
        GameState {
            cards: EntityStore::starting_at(FIRST_CARD_ID),
            players: vec![
                Player::new(p1, player1_name, STARTING_LIFE),
                Player::new(p2, player2_name, STARTING_LIFE),
            ],
            player_zones: vec![PlayerZones::new(p1), PlayerZones::new(p2)],
            battlefield: CardZone::new(),
            stack: Vec::new(),
            turn: TurnStructure::new(p1),
            combat: CombatState::new(),
            rng: ChaCha12Rng::seed_from_u64(seed),
        }
    }

    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.players.iter().map(|p| p.id)
    }

    fn player_index(&self, id: PlayerId) -> Result<usize> {
        self.players
            .iter()
            .position(|p| p.id == id)
            .ok_or(MtgError::EntityNotFound(id.as_u32()))
    }

    pub fn get_player(&self, id: PlayerId) -> Result<&Player> {
        let idx = self.player_index(id)?;
        Ok(&self.players[idx])
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Result<&mut Player> {
        let idx = self.player_index(id)?;
        Ok(&mut self.players[idx])
    }

    pub fn get_player_zones(&self, id: PlayerId) -> Result<&PlayerZones> {
        let idx = self.player_index(id)?;
        Ok(&self.player_zones[idx])
    }

    pub fn get_player_zones_mut(&mut self, id: PlayerId) -> Result<&mut PlayerZones> {
        let idx = self.player_index(id)?;
        Ok(&mut self.player_zones[idx])
    }

    pub fn card(&self, id: CardId) -> Result<&Card> {
        self.cards.get(id)
    }

    pub fn card_mut(&mut self, id: CardId) -> Result<&mut Card> {
        self.cards.get_mut(id)
    }

    /// Player after `id` in turn order
    pub fn next_player_after(&self, id: PlayerId) -> PlayerId {
        match self.player_index(id) {
            Ok(idx) => self.players[(idx + 1) % self.players.len()].id,
            Err(_) => self.players[0].id,
        }
    }

    /// The other player of a two-player game
    pub fn opponent_of(&self, id: PlayerId) -> PlayerId {
        self.next_player_after(id)
    }

    pub fn active_player(&self) -> PlayerId {
        self.turn.active_player
    }

    pub fn current_step(&self) -> Step {
        self.turn.current_step
    }

    /// Create a catalog card in `owner`'s library
    pub fn add_card_to_library(&mut self, owner: PlayerId, name: &str) -> Result<CardId> {
        let id = self.cards.next_id();
        let card = catalog::create_card(id, name, owner)?;
        self.cards.insert(id, card);
        self.get_player_zones_mut(owner)?.library.add(id);
        Ok(id)
    }

    /// Create a catalog card directly in `owner`'s hand
    pub fn add_card_to_hand(&mut self, owner: PlayerId, name: &str) -> Result<CardId> {
        let id = self.cards.next_id();
        let card = catalog::create_card(id, name, owner)?;
        self.cards.insert(id, card);
        self.get_player_zones_mut(owner)?.hand.add(id);
        Ok(id)
    }

    /// Create a catalog card directly on the battlefield, ready to use
    pub fn add_card_to_battlefield(&mut self, owner: PlayerId, name: &str) -> Result<CardId> {
        let id = self.cards.next_id();
        let card = catalog::create_card(id, name, owner)?;
        self.cards.insert(id, card);
        self.battlefield.add(id);
        Ok(id)
    }

    pub fn shuffle_library(&mut self, player: PlayerId) -> Result<()> {
        let idx = self.player_index(player)?;
        self.player_zones[idx].library.shuffle(&mut self.rng);
        Ok(())
    }

    /// Draw one card; drawing from an empty library is recorded for the
    /// next state check
    pub fn draw_card(&mut self, player: PlayerId) -> Result<Option<CardId>> {
        let zones = self.get_player_zones_mut(player)?;
        match zones.library.draw_top() {
            Some(card) => {
                zones.hand.add(card);
                Ok(Some(card))
            }
            None => {
                self.get_player_mut(player)?.drew_from_empty = true;
                Ok(None)
            }
        }
    }

    pub fn is_on_battlefield(&self, card: CardId) -> bool {
        self.battlefield.contains(card)
    }

    pub fn is_in_hand(&self, player: PlayerId, card: CardId) -> bool {
        self.get_player_zones(player)
            .is_ok_and(|z| z.hand.contains(card))
    }

    /// Permanents `player` controls, in battlefield order
    pub fn permanents_of(&self, player: PlayerId) -> impl Iterator<Item = &Card> + '_ {
        self.battlefield
            .iter()
            .filter_map(|id| self.cards.get(id).ok())
            .filter(move |c| c.controller == player)
    }

    pub fn creatures_of(&self, player: PlayerId) -> Vec<CardId> {
        self.permanents_of(player)
            .filter(|c| c.is_creature())
            .map(|c| c.id)
            .collect()
    }

    fn equipment_on(&self, creature: CardId) -> impl Iterator<Item = &Card> + '_ {
        self.battlefield
            .iter()
            .filter_map(|id| self.cards.get(id).ok())
            .filter(move |c| c.attached_to == Some(creature) && c.equipment.is_some())
    }

    /// Power including equipment
    pub fn power(&self, card: CardId) -> i32 {
        let Ok(c) = self.card(card) else { return 0 };
        let equip: i32 = self
            .equipment_on(card)
            .filter_map(|e| e.equipment)
            .map(|b| b.power as i32)
            .sum();
        c.current_power() + equip
    }

    /// Toughness including equipment
    pub fn toughness(&self, card: CardId) -> i32 {
        let Ok(c) = self.card(card) else { return 0 };
        let equip: i32 = self
            .equipment_on(card)
            .filter_map(|e| e.equipment)
            .map(|b| b.toughness as i32)
            .sum();
        c.current_toughness() + equip
    }

    pub fn has_keyword(&self, card: CardId, keyword: Keyword) -> bool {
        self.card(card).is_ok_and(|c| c.has_keyword(keyword))
    }

    /// Put a card from anywhere onto the battlefield under `controller`
    pub fn put_onto_battlefield(&mut self, card: CardId, controller: PlayerId) -> Result<()> {
        let turn = self.turn.turn_number;
        let owner = self.card(card)?.owner;
        self.get_player_zones_mut(owner)?.hand.remove(card);
        let c = self.card_mut(card)?;
        c.controller = controller;
        c.tapped = false;
        c.entered_turn = Some(turn);
        self.battlefield.add(card);
        Ok(())
    }

    /// Move a card to its owner's graveyard, resetting permanent state
    pub fn put_into_graveyard(&mut self, card: CardId) -> Result<()> {
        let owner = self.card(card)?.owner;
        self.battlefield.remove(card);
        self.combat.remove_creature(card);
        let zones = self.get_player_zones_mut(owner)?;
        zones.hand.remove(card);
        zones.graveyard.add(card);
        let c = self.card_mut(card)?;
        c.controller = owner;
        c.tapped = false;
        c.level = 0;
        c.attached_to = None;
        c.entered_turn = None;
        c.end_turn_cleanup();
        Ok(())
    }

    /// Damage from `source` to a creature or player. Deathtouch and
    /// lifelink of the source apply.
    pub fn deal_damage(&mut self, source: CardId, target: TargetRef, amount: i32) -> Result<()> {
        if amount <= 0 {
            return Ok(());
        }
        let (deathtouch, lifelink, source_controller) = match self.card(source) {
            Ok(c) => (
                c.has_keyword(Keyword::Deathtouch),
                c.has_keyword(Keyword::Lifelink),
                Some(c.controller),
            ),
            Err(_) => (false, false, None),
        };
        match target {
            TargetRef::Player(p) => self.get_player_mut(p)?.lose_life(amount),
            TargetRef::Card(c) => {
                if !self.is_on_battlefield(c) {
                    return Ok(());
                }
                let card = self.card_mut(c)?;
                card.damage += amount;
                card.deathtouch_damage |= deathtouch;
            }
        }
        if lifelink {
            if let Some(controller) = source_controller {
                self.get_player_mut(controller)?.gain_life(amount);
            }
        }
        Ok(())
    }

    /// State-based actions, repeated until nothing changes
    pub fn check_state_based_actions(&mut self) -> Result<()> {
        loop {
            let mut changed = false;

            for player in &mut self.players {
                if !player.has_lost && (player.life <= 0 || player.drew_from_empty) {
                    player.has_lost = true;
                    changed = true;
                }
            }

            let mut dying: Vec<CardId> = Vec::new();
            let mut detached: Vec<CardId> = Vec::new();
            for id in self.battlefield.iter() {
                let card = self.card(id)?;
                if card.is_creature() {
                    let toughness = self.toughness(id);
                    let indestructible = card.has_keyword(Keyword::Indestructible);
                    let lethal =
                        card.damage >= toughness || (card.deathtouch_damage && card.damage > 0);
                    if toughness <= 0 || (lethal && !indestructible) {
                        dying.push(id);
                    }
                }
                if let Some(host) = card.attached_to {
                    let host_ok = self.is_on_battlefield(host)
                        && self.card(host).is_ok_and(|h| h.is_creature());
                    if !host_ok {
                        detached.push(id);
                    }
                }
            }
            for id in detached {
                self.card_mut(id)?.attached_to = None;
                changed = true;
            }
            for id in dying {
                self.put_into_graveyard(id)?;
                changed = true;
            }

            if !changed {
                return Ok(());
            }
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.players.iter().any(|p| p.has_lost)
    }

    /// The only player left standing, if any
    pub fn get_winner(&self) -> Option<PlayerId> {
        let mut standing = self.players.iter().filter(|p| !p.has_lost);
        match (standing.next(), standing.next()) {
            (Some(p), None) if self.is_game_over() => Some(p.id),
            _ => None,
        }
    }

    pub fn reset_passes(&mut self) {
        for player in &mut self.players {
            player.passed = false;
        }
    }

    pub fn all_players_passed(&self) -> bool {
        self.players.iter().all(|p| p.passed)
    }

    /// Mark `player` as passed and hand priority to the next player
    pub fn pass_priority(&mut self, player: PlayerId) {
        if let Ok(p) = self.get_player_mut(player) {
            p.passed = true;
        }
        self.turn.priority_player = self.next_player_after(player);
    }

    /// Give priority to the active player for a fresh round
    pub fn begin_priority_round(&mut self) {
        self.reset_passes();
        self.turn.priority_player = self.turn.active_player;
    }

    pub fn empty_mana_pools(&mut self) {
        for player in &mut self.players {
            player.mana_pool.clear();
        }
    }

    /// Untap step work for the active player
    pub fn untap_all(&mut self, player: PlayerId) -> Result<()> {
        let ids: Vec<CardId> = self.permanents_of(player).map(|c| c.id).collect();
        for id in ids {
            self.card_mut(id)?.untap();
        }
        self.get_player_mut(player)?.reset_lands_played();
        Ok(())
    }

    /// Damage and until-end-of-turn effects wear off
    pub fn cleanup_temporary_effects(&mut self) {
        for card in self.cards.values_mut() {
            card.end_turn_cleanup();
        }
    }

    /// Move to the next step, starting the next turn after cleanup.
    /// Only turn bookkeeping happens here; step actions belong to the
    /// game loop.
    pub fn advance_step(&mut self) {
        self.empty_mana_pools();
        if !self.turn.advance_step() {
            let next = self.next_player_after(self.turn.active_player);
            self.turn.next_turn(next);
            self.combat.clear();
        }
        self.begin_priority_round();
    }
}
