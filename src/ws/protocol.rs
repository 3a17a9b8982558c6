//! WebSocket protocol message definitions
//! These are the wire types for client-server communication

use serde::{Deserialize, Serialize};

/// Team assignment for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    Red,
    Blue,
    Spectator,
    Unassigned,
}

impl Default for Team {
    fn default() -> Self {
        Self::Unassigned
    }
}

/// Match modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Team deathmatch - first team to the kill target
    Tdm,
    /// Free-for-all - first player to the kill target
    Ffa,
    /// King of the hill - host-reported hold scores vs target
    Koth,
    /// Capture the flag - capture events vs target
    Ctf,
    /// Gun game - progression driven, no numeric target
    Gun,
    /// 1v1 duel - ffa rules with a short target
    #[serde(rename = "1v1")]
    Duel,
}

impl GameMode {
    /// Default win target applied whenever the mode changes.
    pub fn default_target(self) -> Option<u32> {
        match self {
            GameMode::Tdm => Some(30),
            GameMode::Ffa => Some(8),
            GameMode::Koth => Some(20),
            GameMode::Ctf => Some(3),
            GameMode::Gun => None,
            GameMode::Duel => Some(10),
        }
    }
}

impl Default for GameMode {
    fn default() -> Self {
        Self::Tdm
    }
}

/// Match lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Lobby,
    Playing,
    Ended,
}

/// Lobby configuration chosen by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyConfig {
    pub mode: GameMode,
    /// Players per side, 1-4
    pub team_size: u8,
    /// Win target; None for modes without a numeric target
    pub target: Option<u32>,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::Tdm,
            team_size: 2,
            target: GameMode::Tdm.default_target(),
        }
    }
}

/// Red/blue tallies; reused for koth hold and ctf capture scores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScores {
    pub red: u32,
    pub blue: u32,
}

/// One player's full view in lobby and roster snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub id: u32,
    pub name: String,
    pub team: Team,
    pub skin: String,
    pub gun_id: String,
    pub ready: bool,
    pub x: f32,
    pub y: f32,
    pub angle: f32,
    pub vx: f32,
    pub vy: f32,
    pub hp: i32,
    pub dead: bool,
    pub kills: u32,
    pub deaths: u32,
    pub score: u32,
    pub streak: u32,
    pub ammo: u32,
    pub reloading: bool,
    pub has_flag: bool,
    pub attacking: bool,
    pub bot: bool,
}

/// Messages sent from client to server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMsg {
    /// Set own display name (normalized server-side)
    SetName { name: String },

    /// Set own cosmetic skin
    SetSkin { skin: String },

    /// Set own equipped weapon
    SetGun {
        #[serde(rename = "gunId")]
        gun_id: String,
    },

    /// Toggle readiness in the lobby
    SetReady { ready: bool },

    /// Request a team; capacity-guarded for red/blue
    SetTeam { team: Team },

    /// Host-only lobby configuration change
    SetConfig {
        #[serde(default)]
        mode: Option<GameMode>,
        #[serde(default)]
        team_size: Option<u8>,
        #[serde(default)]
        target: Option<u32>,
    },

    /// Host-only match start
    Start,

    /// Self-reported transient state, relayed to everyone else
    State {
        x: f32,
        y: f32,
        angle: f32,
        hp: i32,
        dead: bool,
        vx: f32,
        vy: f32,
        #[serde(rename = "gunId")]
        gun_id: String,
        ammo: u32,
        reloading: bool,
        #[serde(rename = "hasFlag")]
        has_flag: bool,
        attacking: bool,
    },

    /// Kill report; killer may be a bot, so both ids are explicit
    Kill { killer_id: u32, victim_id: u32 },

    /// Host-reported king-of-the-hill score overwrite
    KothTick { scores: TeamScores },

    /// Flag capture for the given team
    CtfCap { team: Team },

    /// Chat line (truncated server-side)
    Chat { text: String },

    /// Host-only reset back to the lobby
    PlayAgain,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMsg {
    /// Private greeting after the upgrade
    Welcome { id: u32, is_host: bool },

    /// Full lobby snapshot
    Lobby {
        players: Vec<PlayerView>,
        config: LobbyConfig,
        host_id: Option<u32>,
        phase: Phase,
    },

    /// Match start: roster and the seed every client builds the map from
    Start {
        map_seed: u32,
        config: LobbyConfig,
        players: Vec<PlayerView>,
        host_id: Option<u32>,
    },

    /// One player's transient state, relayed from their own report
    State {
        id: u32,
        x: f32,
        y: f32,
        angle: f32,
        hp: i32,
        dead: bool,
        vx: f32,
        vy: f32,
        #[serde(rename = "gunId")]
        gun_id: String,
        ammo: u32,
        reloading: bool,
        #[serde(rename = "hasFlag")]
        has_flag: bool,
        attacking: bool,
        skin: String,
        name: String,
        team: Team,
    },

    /// A scored kill
    Kill {
        killer_id: u32,
        victim_id: u32,
        killer_name: String,
        victim_name: String,
        killer_team: Team,
        killer_kills: u32,
        scores: TeamScores,
        streak: u32,
    },

    /// King-of-the-hill progress
    KothUpdate {
        scores: TeamScores,
        players: Vec<PlayerView>,
    },

    /// Flag capture
    CtfCap { team: Team, scores: TeamScores },

    /// Chat line
    Chat {
        from: String,
        team: Team,
        text: String,
    },

    /// Match over
    End {
        winner_text: String,
        winner_team: Option<Team>,
        scores: TeamScores,
        players: Vec<PlayerView>,
    },

    /// Private notification to a newly promoted host
    PromotedHost,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_tags_deserialize() {
        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"set_team","team":"red"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::SetTeam { team: Team::Red }));

        let msg: ClientMsg = serde_json::from_str(r#"{"type":"play_again"}"#).unwrap();
        assert!(matches!(msg, ClientMsg::PlayAgain));

        let msg: ClientMsg =
            serde_json::from_str(r#"{"type":"set_config","mode":"1v1"}"#).unwrap();
        match msg {
            ClientMsg::SetConfig { mode, team_size, target } => {
                assert_eq!(mode, Some(GameMode::Duel));
                assert_eq!(team_size, None);
                assert_eq!(target, None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn state_uses_wire_field_names() {
        let raw = r#"{"type":"state","x":1.0,"y":2.0,"angle":0.5,"hp":3,"dead":false,
                      "vx":0.0,"vy":0.0,"gunId":"smg","ammo":30,"reloading":false,
                      "hasFlag":true,"attacking":false}"#;
        let msg: ClientMsg = serde_json::from_str(raw).unwrap();
        match msg {
            ClientMsg::State { gun_id, has_flag, .. } => {
                assert_eq!(gun_id, "smg");
                assert!(has_flag);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn unknown_type_fails_deserialization() {
        assert!(serde_json::from_str::<ClientMsg>(r#"{"type":"teleport"}"#).is_err());
        assert!(serde_json::from_str::<ClientMsg>("not json").is_err());
    }

    #[test]
    fn server_welcome_serializes_with_tag() {
        let json = serde_json::to_value(ServerMsg::Welcome {
            id: 7,
            is_host: true,
        })
        .unwrap();
        assert_eq!(json["type"], "welcome");
        assert_eq!(json["id"], 7);
        assert_eq!(json["is_host"], true);
    }

    #[test]
    fn mode_defaults_match_table() {
        assert_eq!(GameMode::Tdm.default_target(), Some(30));
        assert_eq!(GameMode::Ffa.default_target(), Some(8));
        assert_eq!(GameMode::Koth.default_target(), Some(20));
        assert_eq!(GameMode::Ctf.default_target(), Some(3));
        assert_eq!(GameMode::Gun.default_target(), None);
        assert_eq!(GameMode::Duel.default_target(), Some(10));
    }
}
