//! Lobby registry and authoritative match state machine
//!
//! All mutations run synchronously under the caller's lock and return
//! `Directive`s describing what to send where; the relay delivers them while
//! the lock is still held, so each transition and its broadcast are atomic.

use std::collections::HashMap;

use rand::Rng;
use tokio::net::tcp::OwnedWriteHalf;
use tracing::{debug, info};

use crate::game::player::{Player, PlayerId, BLUE_BOT_NAMES, RED_BOT_NAMES};
use crate::ws::protocol::{
    ClientMsg, GameMode, LobbyConfig, Phase, PlayerView, ServerMsg, Team, TeamScores,
};

/// Points awarded to the killer per kill.
const KILL_SCORE: u32 = 100;
/// Points deducted from the victim, floored at zero.
const DEATH_PENALTY: u32 = 25;
/// Chat lines are truncated to this many characters.
const CHAT_MAX_CHARS: usize = 80;

/// What the relay should send, and to whom.
#[derive(Debug)]
pub enum Directive {
    Broadcast(ServerMsg),
    BroadcastExcept(PlayerId, ServerMsg),
    To(PlayerId, ServerMsg),
}

/// The singleton lobby: live players, configuration, and match phase.
pub struct Lobby {
    players: HashMap<PlayerId, Player>,
    pub phase: Phase,
    pub config: LobbyConfig,
    pub scores: TeamScores,
    pub map_seed: u32,
    pub host_id: Option<PlayerId>,
    next_id: PlayerId,
}

impl Lobby {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            phase: Phase::Lobby,
            config: LobbyConfig::default(),
            scores: TeamScores::default(),
            map_seed: 0,
            host_id: None,
            next_id: 1,
        }
    }

    /// Register a freshly upgraded connection.
    ///
    /// The new player becomes host when no live human currently holds the
    /// role. Returns the private welcome plus a lobby snapshot for everyone.
    pub fn join(&mut self, writer: Option<OwnedWriteHalf>) -> (PlayerId, Vec<Directive>) {
        let id = self.alloc_id();
        self.players.insert(id, Player::connected(id, writer));

        let host_live = self
            .host_id
            .and_then(|h| self.players.get(&h))
            .map(|p| !p.bot)
            .unwrap_or(false);
        if !host_live {
            self.host_id = Some(id);
        }
        let is_host = self.host_id == Some(id);
        info!(player_id = id, is_host, "Player registered");

        let directives = vec![
            Directive::To(id, ServerMsg::Welcome { id, is_host }),
            Directive::Broadcast(self.snapshot()),
        ];
        (id, directives)
    }

    /// Remove a player (disconnect, protocol error, or broadcast write failure).
    ///
    /// Host status falls over to an arbitrary remaining human; the survivor is
    /// notified privately and everyone gets a fresh snapshot.
    pub fn remove(&mut self, id: PlayerId) -> Vec<Directive> {
        let Some(player) = self.players.remove(&id) else {
            return Vec::new();
        };
        info!(player_id = id, name = %player.name, "Player removed");

        let mut out = Vec::new();
        if self.host_id == Some(id) {
            self.host_id = self.players.values().find(|p| !p.bot).map(|p| p.id);
            match self.host_id {
                Some(new_host) => {
                    info!(player_id = new_host, "Host reassigned");
                    out.push(Directive::To(new_host, ServerMsg::PromotedHost));
                }
                None => info!("No host remaining"),
            }
        }
        out.push(Directive::Broadcast(self.snapshot()));
        out
    }

    /// Apply one inbound message against the sender's record.
    ///
    /// Unauthorized, wrong-phase, and over-capacity requests are silently
    /// ignored; an unregistered sender is a no-op.
    pub fn apply(&mut self, id: PlayerId, msg: ClientMsg) -> Vec<Directive> {
        if !self.players.contains_key(&id) {
            return Vec::new();
        }
        match msg {
            ClientMsg::SetName { name } => {
                self.update_self(id, |p| p.name = Player::normalize_name(&name))
            }
            ClientMsg::SetSkin { skin } => self.update_self(id, |p| p.skin = skin),
            ClientMsg::SetGun { gun_id } => self.update_self(id, |p| p.gun_id = gun_id),
            ClientMsg::SetReady { ready } => self.update_self(id, |p| p.ready = ready),
            ClientMsg::SetTeam { team } => self.set_team(id, team),
            ClientMsg::SetConfig {
                mode,
                team_size,
                target,
            } => self.set_config(id, mode, team_size, target),
            ClientMsg::Start => self.start_match(id),
            ClientMsg::State {
                x,
                y,
                angle,
                hp,
                dead,
                vx,
                vy,
                gun_id,
                ammo,
                reloading,
                has_flag,
                attacking,
            } => {
                let Some(p) = self.players.get_mut(&id) else {
                    return Vec::new();
                };
                p.x = x;
                p.y = y;
                p.angle = angle;
                p.hp = hp;
                p.dead = dead;
                p.vx = vx;
                p.vy = vy;
                p.gun_id = gun_id;
                p.ammo = ammo;
                p.reloading = reloading;
                p.has_flag = has_flag;
                p.attacking = attacking;
                let relayed = ServerMsg::State {
                    id,
                    x: p.x,
                    y: p.y,
                    angle: p.angle,
                    hp: p.hp,
                    dead: p.dead,
                    vx: p.vx,
                    vy: p.vy,
                    gun_id: p.gun_id.clone(),
                    ammo: p.ammo,
                    reloading: p.reloading,
                    has_flag: p.has_flag,
                    attacking: p.attacking,
                    skin: p.skin.clone(),
                    name: p.name.clone(),
                    team: p.team,
                };
                vec![Directive::BroadcastExcept(id, relayed)]
            }
            ClientMsg::Kill {
                killer_id,
                victim_id,
            } => self.apply_kill(killer_id, victim_id),
            ClientMsg::KothTick { scores } => self.koth_tick(id, scores),
            ClientMsg::CtfCap { team } => self.ctf_cap(team),
            ClientMsg::Chat { text } => self.chat(id, text),
            ClientMsg::PlayAgain => self.play_again(id),
        }
    }

    /// Full lobby snapshot message.
    pub fn snapshot(&self) -> ServerMsg {
        ServerMsg::Lobby {
            players: self.views(),
            config: self.config,
            host_id: self.host_id,
            phase: self.phase,
        }
    }

    /// All player views, ordered by id for stable wire output.
    pub fn views(&self) -> Vec<PlayerView> {
        let mut views: Vec<PlayerView> = self.players.values().map(Player::view).collect();
        views.sort_by_key(|v| v.id);
        views
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(&id)
    }

    /// Ids of players holding a live connection, ordered.
    pub fn live_ids(&self) -> Vec<PlayerId> {
        let mut ids: Vec<PlayerId> = self
            .players
            .values()
            .filter(|p| p.writer.is_some())
            .map(|p| p.id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn writer_mut(&mut self, id: PlayerId) -> Option<&mut OwnedWriteHalf> {
        self.players.get_mut(&id).and_then(|p| p.writer.as_mut())
    }

    fn alloc_id(&mut self) -> PlayerId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn update_self(&mut self, id: PlayerId, f: impl FnOnce(&mut Player)) -> Vec<Directive> {
        if let Some(p) = self.players.get_mut(&id) {
            f(p);
        }
        vec![Directive::Broadcast(self.snapshot())]
    }

    /// Guarded team join: red/blue are capacity-limited, spectator is not.
    fn set_team(&mut self, id: PlayerId, team: Team) -> Vec<Directive> {
        if self.phase != Phase::Lobby {
            return Vec::new();
        }
        if matches!(team, Team::Red | Team::Blue) {
            let occupied = self
                .players
                .values()
                .filter(|p| p.team == team && p.id != id)
                .count();
            if occupied >= self.config.team_size as usize {
                debug!(player_id = id, ?team, "Team full, join rejected");
                return Vec::new();
            }
        }
        self.update_self(id, |p| p.team = team)
    }

    /// Host-only, lobby-only configuration change.
    ///
    /// A mode change resets the target to the mode default before an explicit
    /// target in the same message is applied.
    fn set_config(
        &mut self,
        id: PlayerId,
        mode: Option<GameMode>,
        team_size: Option<u8>,
        target: Option<u32>,
    ) -> Vec<Directive> {
        if self.host_id != Some(id) || self.phase != Phase::Lobby {
            return Vec::new();
        }
        if let Some(mode) = mode {
            self.config.mode = mode;
            self.config.target = mode.default_target();
        }
        if let Some(size) = team_size {
            if (1..=4).contains(&size) {
                self.config.team_size = size;
            }
        }
        if let Some(target) = target {
            self.config.target = Some(target);
        }
        vec![Directive::Broadcast(self.snapshot())]
    }

    /// Host-only match start: auto-assign, bot fill, counter reset, new seed.
    fn start_match(&mut self, id: PlayerId) -> Vec<Directive> {
        if self.host_id != Some(id) || self.phase != Phase::Lobby {
            return Vec::new();
        }

        for p in self.players.values_mut() {
            if p.team == Team::Unassigned {
                p.team = Team::Red;
            }
        }

        let size = self.config.team_size as usize;
        for (side, pool) in [(Team::Red, RED_BOT_NAMES), (Team::Blue, BLUE_BOT_NAMES)] {
            let occupied = self.players.values().filter(|p| p.team == side).count();
            for slot in occupied..size {
                let bot_id = self.alloc_id();
                let name = pool[slot % pool.len()];
                self.players.insert(bot_id, Player::bot(bot_id, side, name));
            }
        }

        for p in self.players.values_mut() {
            p.reset_match_counters();
        }
        self.scores = TeamScores::default();
        self.map_seed = rand::thread_rng().gen();
        self.phase = Phase::Playing;
        info!(
            map_seed = self.map_seed,
            mode = ?self.config.mode,
            players = self.players.len(),
            "Match started"
        );

        vec![Directive::Broadcast(ServerMsg::Start {
            map_seed: self.map_seed,
            config: self.config,
            players: self.views(),
            host_id: self.host_id,
        })]
    }

    /// Score a reported kill and run win detection.
    fn apply_kill(&mut self, killer_id: PlayerId, victim_id: PlayerId) -> Vec<Directive> {
        if self.phase != Phase::Playing || killer_id == victim_id {
            return Vec::new();
        }
        if !self.players.contains_key(&killer_id) {
            return Vec::new();
        }
        let Some(victim) = self.players.get_mut(&victim_id) else {
            return Vec::new();
        };
        victim.score = victim.score.saturating_sub(DEATH_PENALTY);
        victim.streak = 0;
        victim.deaths += 1;
        let victim_name = victim.name.clone();

        let Some(killer) = self.players.get_mut(&killer_id) else {
            return Vec::new();
        };
        killer.kills += 1;
        killer.streak += 1;
        killer.score += KILL_SCORE;
        let (killer_name, killer_team, killer_kills, streak) = (
            killer.name.clone(),
            killer.team,
            killer.kills,
            killer.streak,
        );

        if self.config.mode == GameMode::Tdm {
            match killer_team {
                Team::Red => self.scores.red += 1,
                Team::Blue => self.scores.blue += 1,
                _ => {}
            }
        }

        debug!(killer_id, victim_id, killer_kills, "Kill scored");
        let mut out = vec![Directive::Broadcast(ServerMsg::Kill {
            killer_id,
            victim_id,
            killer_name,
            victim_name,
            killer_team,
            killer_kills,
            scores: self.scores,
            streak,
        })];
        if let Some(end) = self.check_win() {
            out.push(Directive::Broadcast(end));
        }
        out
    }

    /// Host-reported koth score overwrite.
    fn koth_tick(&mut self, id: PlayerId, scores: TeamScores) -> Vec<Directive> {
        if self.host_id != Some(id) || self.phase != Phase::Playing {
            return Vec::new();
        }
        self.scores = scores;
        let mut out = vec![Directive::BroadcastExcept(
            id,
            ServerMsg::KothUpdate {
                scores: self.scores,
                players: self.views(),
            },
        )];
        if let Some(end) = self.check_win() {
            out.push(Directive::Broadcast(end));
        }
        out
    }

    /// Flag capture for a team.
    fn ctf_cap(&mut self, team: Team) -> Vec<Directive> {
        if self.phase != Phase::Playing {
            return Vec::new();
        }
        match team {
            Team::Red => self.scores.red += 1,
            Team::Blue => self.scores.blue += 1,
            _ => return Vec::new(),
        }
        let mut out = vec![Directive::Broadcast(ServerMsg::CtfCap {
            team,
            scores: self.scores,
        })];
        if let Some(end) = self.check_win() {
            out.push(Directive::Broadcast(end));
        }
        out
    }

    fn chat(&mut self, id: PlayerId, text: String) -> Vec<Directive> {
        let Some(p) = self.players.get(&id) else {
            return Vec::new();
        };
        let text: String = text.chars().take(CHAT_MAX_CHARS).collect();
        vec![Directive::Broadcast(ServerMsg::Chat {
            from: p.name.clone(),
            team: p.team,
            text,
        })]
    }

    /// Host-only reset back to the lobby.
    ///
    /// Bots are purged; humans keep team/name/skin but lose readiness and
    /// per-match counters.
    fn play_again(&mut self, id: PlayerId) -> Vec<Directive> {
        if self.host_id != Some(id) {
            return Vec::new();
        }
        self.players.retain(|_, p| !p.bot);
        for p in self.players.values_mut() {
            p.reset_match_counters();
            p.ready = false;
        }
        self.scores = TeamScores::default();
        self.phase = Phase::Lobby;
        info!("Lobby reset");
        vec![Directive::Broadcast(self.snapshot())]
    }

    /// Evaluate the win condition; transitions to `ended` at most once.
    fn check_win(&mut self) -> Option<ServerMsg> {
        if self.phase != Phase::Playing {
            return None;
        }
        let winner = match self.config.mode {
            GameMode::Tdm | GameMode::Koth | GameMode::Ctf => {
                let target = self.config.target?;
                if self.scores.red >= target {
                    Some(("RED TEAM WINS!".to_string(), Some(Team::Red)))
                } else if self.scores.blue >= target {
                    Some(("BLUE TEAM WINS!".to_string(), Some(Team::Blue)))
                } else {
                    None
                }
            }
            GameMode::Ffa | GameMode::Duel => {
                let target = self.config.target?;
                self.players
                    .values()
                    .find(|p| p.kills >= target)
                    .map(|p| (format!("{} WINS!", p.name), Some(p.team)))
            }
            // Gun game progression is client-driven; no numeric target
            GameMode::Gun => None,
        };
        let (winner_text, winner_team) = winner?;

        self.phase = Phase::Ended;
        info!(winner = %winner_text, "Match ended");
        Some(ServerMsg::End {
            winner_text,
            winner_team,
            scores: self.scores,
            players: self.views(),
        })
    }
}

impl Default for Lobby {
    fn default() -> Self {
        Self::new()
    }
}
