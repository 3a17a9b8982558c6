//! Player records owned by the lobby registry

use rand::seq::SliceRandom;
use tokio::net::tcp::OwnedWriteHalf;

use crate::ws::protocol::{PlayerView, Team};

pub type PlayerId = u32;

pub const START_HP: i32 = 3;
pub const DEFAULT_GUN: &str = "pistol";
pub const DEFAULT_AMMO: u32 = 12;
pub const DEFAULT_SKIN: &str = "phantom";

const MAX_NAME_LEN: usize = 12;

/// Bot name pools, one per side, sized to the maximum team size.
pub const RED_BOT_NAMES: [&str; 4] = ["VIPER", "BLAZE", "FANG", "ONYX"];
pub const BLUE_BOT_NAMES: [&str; 4] = ["FROST", "BOLT", "ECHO", "DRIFT"];

/// Weapons a bot may spawn with.
const BOT_GUNS: [&str; 5] = ["pistol", "smg", "shotgun", "assault", "sniper"];

/// Authoritative per-player record.
///
/// Human players carry the write half of their connection; bots do not.
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub team: Team,
    pub skin: String,
    pub gun_id: String,
    pub ready: bool,

    // Self-reported transient state
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub vx: f32,
    pub vy: f32,
    pub hp: i32,
    pub dead: bool,
    pub ammo: u32,
    pub reloading: bool,
    pub has_flag: bool,
    pub attacking: bool,

    // Match counters
    pub kills: u32,
    pub deaths: u32,
    pub score: u32,
    pub streak: u32,

    pub bot: bool,
    pub writer: Option<OwnedWriteHalf>,
}

impl Player {
    /// Fresh record for a newly upgraded connection.
    pub fn connected(id: PlayerId, writer: Option<OwnedWriteHalf>) -> Self {
        Self {
            id,
            name: "PLAYER".to_string(),
            team: Team::Unassigned,
            skin: DEFAULT_SKIN.to_string(),
            gun_id: DEFAULT_GUN.to_string(),
            ready: false,
            x: spawn_x(Team::Unassigned),
            y: SPAWN_Y,
            angle: 0.0,
            vx: 0.0,
            vy: 0.0,
            hp: START_HP,
            dead: false,
            ammo: DEFAULT_AMMO,
            reloading: false,
            has_flag: false,
            attacking: false,
            kills: 0,
            deaths: 0,
            score: 0,
            streak: 0,
            bot: false,
            writer,
        }
    }

    /// Synthetic fill-in for an empty team slot.
    pub fn bot(id: PlayerId, team: Team, name: &str) -> Self {
        let gun = BOT_GUNS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(DEFAULT_GUN);
        let mut player = Self::connected(id, None);
        player.name = name.to_string();
        player.team = team;
        player.gun_id = gun.to_string();
        player.x = spawn_x(team);
        player.bot = true;
        player
    }

    /// Trim, uppercase, and truncate a display name; empty falls back to "PLAYER".
    pub fn normalize_name(raw: &str) -> String {
        let name: String = raw.trim().to_uppercase().chars().take(MAX_NAME_LEN).collect();
        if name.is_empty() {
            "PLAYER".to_string()
        } else {
            name
        }
    }

    /// Clear everything a new match starts from, keeping identity and cosmetics.
    pub fn reset_match_counters(&mut self) {
        self.kills = 0;
        self.deaths = 0;
        self.score = 0;
        self.streak = 0;
        self.hp = START_HP;
        self.dead = false;
        self.ammo = DEFAULT_AMMO;
        self.reloading = false;
        self.has_flag = false;
        self.attacking = false;
        self.x = spawn_x(self.team);
        self.y = SPAWN_Y;
        self.vx = 0.0;
        self.vy = 0.0;
    }

    pub fn view(&self) -> PlayerView {
        PlayerView {
            id: self.id,
            name: self.name.clone(),
            team: self.team,
            skin: self.skin.clone(),
            gun_id: self.gun_id.clone(),
            ready: self.ready,
            x: self.x,
            y: self.y,
            angle: self.angle,
            vx: self.vx,
            vy: self.vy,
            hp: self.hp,
            dead: self.dead,
            kills: self.kills,
            deaths: self.deaths,
            score: self.score,
            streak: self.streak,
            ammo: self.ammo,
            reloading: self.reloading,
            has_flag: self.has_flag,
            attacking: self.attacking,
            bot: self.bot,
        }
    }
}

const SPAWN_Y: f32 = 400.0;

/// Red spawns on the left edge, everyone else on the right.
fn spawn_x(team: Team) -> f32 {
    match team {
        Team::Red => 100.0,
        _ => 1300.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_normalization() {
        assert_eq!(Player::normalize_name("  ace  "), "ACE");
        assert_eq!(Player::normalize_name(""), "PLAYER");
        assert_eq!(Player::normalize_name("   "), "PLAYER");
        assert_eq!(
            Player::normalize_name("averyverylongname"),
            "AVERYVERYLON"
        );
    }

    #[test]
    fn connected_player_defaults() {
        let p = Player::connected(1, None);
        assert_eq!(p.name, "PLAYER");
        assert_eq!(p.team, Team::Unassigned);
        assert_eq!(p.hp, START_HP);
        assert_eq!(p.gun_id, DEFAULT_GUN);
        assert_eq!(p.ammo, DEFAULT_AMMO);
        assert!(!p.bot);
        assert!(!p.dead);
    }

    #[test]
    fn bot_has_flag_set_and_no_writer() {
        let b = Player::bot(9, Team::Blue, "FROST");
        assert!(b.bot);
        assert!(b.writer.is_none());
        assert_eq!(b.team, Team::Blue);
        assert_eq!(b.name, "FROST");
        assert!(BOT_GUNS.contains(&b.gun_id.as_str()));
    }

    #[test]
    fn counter_reset_preserves_identity() {
        let mut p = Player::connected(1, None);
        p.name = "ACE".to_string();
        p.team = Team::Red;
        p.skin = "wraith".to_string();
        p.kills = 5;
        p.score = 400;
        p.streak = 3;
        p.dead = true;
        p.hp = 0;

        p.reset_match_counters();

        assert_eq!(p.kills, 0);
        assert_eq!(p.score, 0);
        assert_eq!(p.streak, 0);
        assert_eq!(p.hp, START_HP);
        assert!(!p.dead);
        assert_eq!(p.name, "ACE");
        assert_eq!(p.team, Team::Red);
        assert_eq!(p.skin, "wraith");
        assert_eq!(p.x, 100.0);
    }
}
