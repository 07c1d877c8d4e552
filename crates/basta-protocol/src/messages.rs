//! Client and server messages, plus the snapshot views they carry.
//!
//! Both message enums are internally tagged (`#[serde(tag = "type")]`), so
//! `ClientMessage::PlayCard { card_id: 12 }` is `{"type":"PlayCard","card_id":12}`
//! on the wire.

use serde::{Deserialize, Serialize};

use crate::PlayerId;

// ---------------------------------------------------------------------------
// Game vocabulary
// ---------------------------------------------------------------------------

/// One of the eight card sections, which are also the outer-ring sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Poverty,
    Hunger,
    Health,
    Education,
    Gender,
    Environment,
    Consumption,
    Institutions,
}

impl Section {
    /// All sections in outer-ring order. Sector `i` of the outer ring is
    /// `Section::ALL[i]`.
    pub const ALL: [Section; 8] = [
        Section::Poverty,
        Section::Hunger,
        Section::Health,
        Section::Education,
        Section::Gender,
        Section::Environment,
        Section::Consumption,
        Section::Institutions,
    ];

    /// Position of this section on the outer ring.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable section title shown when the wheel lands on it.
    pub fn display_name(self) -> &'static str {
        match self {
            Section::Poverty => "Poverty and social inequality",
            Section::Hunger => "Hunger and lack of access to food",
            Section::Health => "Insufficient health and well-being",
            Section::Education => "Unequal or limited education",
            Section::Gender => "Gender inequality and discrimination",
            Section::Environment => "Environmental degradation and climate change",
            Section::Consumption => "Unsustainable consumption and production",
            Section::Institutions => "Lack of peace, justice and strong institutions",
        }
    }
}

/// Which ring the dice selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ring {
    /// 17 numbered goals. Rolled on 1–4.
    Inner,
    /// 8 sections. Rolled on 5–6.
    Outer,
}

/// Per-turn phase of an active game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    AwaitRoll,
    AwaitSpin,
    Play,
    Verifying,
}

/// Lifecycle of a lobby.
///
/// ```text
/// Waiting → Countdown → Playing → Ended
///  ↑ ↑          │                   │
///  │ └──────────┘ (cancelled)       │
///  └────────────────────────────────┘ (rematch)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lifecycle {
    Waiting,
    Countdown,
    Playing,
    Ended,
}

/// The target a settled spin resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "ring", rename_all = "lowercase")]
pub enum WheelSelection {
    Outer { index: usize, section: Section },
    Inner { number: u8 },
}

impl WheelSelection {
    pub fn ring(&self) -> Ring {
        match self {
            WheelSelection::Outer { .. } => Ring::Outer,
            WheelSelection::Inner { .. } => Ring::Inner,
        }
    }
}

/// Why a played card failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidReason {
    /// Outer ring: the card belongs to another section.
    WrongSection,
    /// Inner ring: the card does not carry the selected number.
    WrongNumber,
}

/// How a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    /// The winner emptied their hand with valid cards and rang the bell.
    Basta,
    /// Every other player left.
    Forfeit,
}

// ---------------------------------------------------------------------------
// Snapshot views
// ---------------------------------------------------------------------------

/// A card as clients see it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardView {
    pub id: u32,
    /// `None` for wildcards.
    pub section: Option<Section>,
    pub goals: Vec<u8>,
    pub wildcard: bool,
    /// Opaque artwork key.
    pub image: String,
    pub color: String,
}

/// A lobby member before the game starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
}

/// A seated player inside a game-state snapshot. Hands stay private.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    pub card_count: usize,
    pub is_active: bool,
    pub blocked: bool,
}

/// Full public state of a lobby's game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateView {
    pub lifecycle: Lifecycle,
    pub players: Vec<PlayerSummary>,
    pub turn_index: usize,
    pub phase: Phase,
    pub dice_value: Option<u8>,
    pub ring: Option<Ring>,
    pub selection: Option<WheelSelection>,
    pub deck_count: usize,
    pub discard_count: usize,
}

/// Outcome for one played card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub card: CardView,
    pub player_id: PlayerId,
    pub player_name: String,
    pub valid: bool,
    pub reason: Option<InvalidReason>,
}

/// Penalty applied to a player who played at least one invalid card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PenaltySummary {
    pub player_id: PlayerId,
    pub player_name: String,
    pub cards_drawn: usize,
    /// The deck was empty, so the player sits out the rest of this turn.
    pub blocked: bool,
}

// ---------------------------------------------------------------------------
// ClientMessage
// ---------------------------------------------------------------------------

/// Everything a client can ask of the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    // -- Lobby membership (handled by the registry) --
    Join { name: String },
    CancelJoin,
    LeaveGame,

    // -- Pre-game --
    Ready,
    Unready,
    Chat { text: String },

    // -- Turn actions --
    RequestHand,
    RollDice,
    SpinWheel,
    PlayCard { card_id: u32 },
    DrawCard,
    SkipTurn,
    RingBell,
    /// Sent by the bell ringer once verification animations finish.
    VerifyAcknowledged,

    // -- Connection --
    Heartbeat { client_time: u64 },
}

// ---------------------------------------------------------------------------
// ServerMessage
// ---------------------------------------------------------------------------

/// Everything the server tells clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    // -- Connection --
    /// First message on every connection.
    Welcome { player_id: PlayerId },
    HeartbeatAck { client_time: u64, server_time: u64 },
    /// An action was rejected. Codes follow HTTP conventions.
    Error { code: u16, message: String },

    // -- Lobby --
    RosterUpdate { players: Vec<RosterEntry>, message: String },
    CountdownTick { seconds_remaining: u32 },
    CountdownCancelled,
    Chat { player_name: String, text: String },

    // -- Game lifecycle --
    GameStarted,
    HandUpdate { cards: Vec<CardView> },
    GameState(GameStateView),
    GameEnded {
        winner_id: PlayerId,
        winner_name: String,
        reason: EndReason,
    },
    PlayerLeft { player_id: PlayerId, player_name: String },
    ReturnedToLobby,

    // -- Roll and spin --
    DiceRolled { player_id: PlayerId, value: u8, ring: Ring },
    WheelSpinning { rotation: u32 },
    WheelResolved { selection: WheelSelection, display_name: String },
    SelectionRepeated { display_name: String },

    // -- Play phase --
    CardPlayed {
        player_id: PlayerId,
        player_name: String,
        card: CardView,
    },
    CardDrawn { player_id: PlayerId, player_name: String },
    PlayerSkipped { player_id: PlayerId, player_name: String },
    AllSkipped,
    PlayerEmptiedHand { player_id: PlayerId, player_name: String },

    // -- Verification --
    BellRang { player_id: PlayerId, player_name: String },
    /// The obligation holder was beaten to the bell.
    BellPenalty {
        penalized: String,
        ringer: String,
        penalty_cards: usize,
        blocked: bool,
    },
    VerifyResult {
        verdicts: Vec<Verdict>,
        penalties: Vec<PenaltySummary>,
        penalty_message: String,
        selection: Option<WheelSelection>,
        deck_count: usize,
    },
    /// `names` drew a penalty card; `blocked_names` could not draw.
    PenaltyAnnouncement {
        names: Vec<String>,
        blocked_names: Vec<String>,
        message: String,
    },
    /// The bell ringer emptied their hand with an invalid card.
    VictoryFailed { player_name: String },
    PlayersUnblocked { names: Vec<String>, message: String },
}
