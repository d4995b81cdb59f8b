//! # Message Field Decoder
//!
//! Reconstructs structured records from the engine's flat stream of
//! typed field writes.
//!
//! ## State Machine
//!
//! ```text
//!          begin(id, subject)          field(v)
//!   IDLE ─────────────────────► DECODING ◄──────┐
//!    ▲                              │  └────────┘  state += 1
//!    └──────────── end() ───────────┘
//! ```
//!
//! ## Registry
//!
//! The engine assigns numeric ids to message names at startup. Each
//! [`MessageKind`] has a static handler table: the `FieldSlot` that the
//! Nth field write means, plus an optional `EndSlot`. Binding validates
//! names and rejects duplicate kinds or ids, so a bad registration is
//! caught before the first message arrives. Unbound or out-of-range ids
//! decode through an empty table.

use crate::error::{TrackerError, TrackerResult};
use skirmish_core::PlayerSlot;

/// Size of the engine's message id space.
pub const MAX_MESSAGE_IDS: usize = 256;

/// Engine messages the tracker decodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Weapon change and clip update.
    CurWeapon,
    /// Player objective score.
    ObjScore,
    /// Round start/end state.
    RoundState,
    /// Health change, carries no fields we use.
    Health,
    /// HUD reset at spawn.
    ResetHud,
    /// Team score.
    TeamScore,
    /// Reserve ammo (byte amount).
    AmmoX,
    /// Reserve ammo (short amount).
    AmmoShort,
    /// Field of view change.
    SetFov,
    /// Objective carried icon.
    Object,
    /// Player status (spawn).
    PStatus,
    /// Scoreboard row. Registered, not decoded.
    ScoreShort,
    /// Team assignment. Registered, not decoded.
    PTeam,
}

/// Meaning of one positional field within a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldSlot {
    /// CurWeapon: nonzero when the record is active.
    SwitchFlag,
    /// CurWeapon: weapon id.
    WeaponId,
    /// CurWeapon: clip count.
    Clip,
    /// ObjScore: player index.
    ScorePlayer,
    /// ObjScore: score value.
    ScoreValue,
    /// RoundState: state value.
    RoundStateValue,
    /// TeamScore: team index.
    TeamIndex,
    /// TeamScore: score value.
    TeamScoreValue,
    /// AmmoX/AmmoShort: ammo slot.
    AmmoSlot,
    /// AmmoX/AmmoShort: amount.
    AmmoAmount,
    /// SetFOV: field of view.
    FovValue,
    /// Object: icon name.
    ObjectName,
    /// PStatus: player index.
    StatusPlayer,
}

/// Handler run when a message ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndSlot {
    /// CurWeapon: announce a weapon switch.
    WeaponSwitch,
    /// Health: resolve pending damage.
    Damage,
    /// ResetHUD: schedule a life clear.
    LifeReset,
    /// SetFOV: compare against the current scope state.
    ScopeCheck,
    /// Object: toggle carried state.
    ObjectToggle,
}

/// Static handler table of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MessageSchema {
    /// Field meanings in write order.
    pub fields: &'static [FieldSlot],
    /// End handler.
    pub end: Option<EndSlot>,
}

const EMPTY: MessageSchema = MessageSchema { fields: &[], end: None };

impl MessageKind {
    /// Every kind, in registry order.
    pub const ALL: [Self; 13] = [
        Self::CurWeapon,
        Self::ObjScore,
        Self::RoundState,
        Self::Health,
        Self::ResetHud,
        Self::TeamScore,
        Self::AmmoX,
        Self::AmmoShort,
        Self::SetFov,
        Self::Object,
        Self::PStatus,
        Self::ScoreShort,
        Self::PTeam,
    ];

    /// Engine message name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::CurWeapon => "CurWeapon",
            Self::ObjScore => "ObjScore",
            Self::RoundState => "RoundState",
            Self::Health => "Health",
            Self::ResetHud => "ResetHUD",
            Self::TeamScore => "TeamScore",
            Self::AmmoX => "AmmoX",
            Self::AmmoShort => "AmmoShort",
            Self::SetFov => "SetFOV",
            Self::Object => "Object",
            Self::PStatus => "PStatus",
            Self::ScoreShort => "ScoreShort",
            Self::PTeam => "PTeam",
        }
    }

    /// Looks up a kind by engine name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }

    /// Handler table.
    #[must_use]
    pub const fn schema(self) -> MessageSchema {
        match self {
            Self::CurWeapon => MessageSchema {
                fields: &[FieldSlot::SwitchFlag, FieldSlot::WeaponId, FieldSlot::Clip],
                end: Some(EndSlot::WeaponSwitch),
            },
            Self::ObjScore => MessageSchema {
                fields: &[FieldSlot::ScorePlayer, FieldSlot::ScoreValue],
                end: None,
            },
            Self::RoundState => MessageSchema {
                fields: &[FieldSlot::RoundStateValue],
                end: None,
            },
            Self::Health => MessageSchema {
                fields: &[],
                end: Some(EndSlot::Damage),
            },
            Self::ResetHud => MessageSchema {
                fields: &[],
                end: Some(EndSlot::LifeReset),
            },
            Self::TeamScore => MessageSchema {
                fields: &[FieldSlot::TeamIndex, FieldSlot::TeamScoreValue],
                end: None,
            },
            Self::AmmoX | Self::AmmoShort => MessageSchema {
                fields: &[FieldSlot::AmmoSlot, FieldSlot::AmmoAmount],
                end: None,
            },
            Self::SetFov => MessageSchema {
                fields: &[FieldSlot::FovValue],
                end: Some(EndSlot::ScopeCheck),
            },
            Self::Object => MessageSchema {
                fields: &[FieldSlot::ObjectName],
                end: Some(EndSlot::ObjectToggle),
            },
            Self::PStatus => MessageSchema {
                fields: &[FieldSlot::StatusPlayer],
                end: None,
            },
            Self::ScoreShort | Self::PTeam => EMPTY,
        }
    }

    const fn ordinal(self) -> usize {
        self as usize
    }
}

/// One field write as seen on the wire.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FieldValue<'a> {
    /// Byte, char, short, long, or entity write.
    Int(i32),
    /// Coord or angle write.
    Float(f32),
    /// String write.
    Str(&'a str),
}

impl FieldValue<'_> {
    /// Integer view; floats truncate, strings have none.
    #[must_use]
    pub fn as_int(&self) -> Option<i32> {
        match *self {
            Self::Int(v) => Some(v),
            Self::Float(v) => Some(v as i32),
            Self::Str(_) => None,
        }
    }
}

// ============================================================================
// REGISTRY
// ============================================================================

/// Engine id to message kind bindings.
#[derive(Clone, Debug)]
pub struct MessageRegistry {
    by_id: [Option<MessageKind>; MAX_MESSAGE_IDS],
    ids: [Option<i32>; MessageKind::ALL.len()],
}

impl Default for MessageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageRegistry {
    /// Creates a registry with nothing bound.
    #[must_use]
    pub fn new() -> Self {
        Self {
            by_id: [None; MAX_MESSAGE_IDS],
            ids: [None; MessageKind::ALL.len()],
        }
    }

    /// Binds an engine message name to its id.
    ///
    /// # Errors
    ///
    /// Rejects unknown names, out-of-range ids, a kind bound twice, and
    /// an id already taken by another kind.
    pub fn bind(&mut self, name: &str, id: i32) -> TrackerResult<MessageKind> {
        let kind =
            MessageKind::from_name(name).ok_or_else(|| TrackerError::UnknownMessage(name.to_owned()))?;
        let index = usize::try_from(id)
            .ok()
            .filter(|i| *i < MAX_MESSAGE_IDS)
            .ok_or(TrackerError::MessageIdOutOfRange(id))?;

        if let Some(previous) = self.ids[kind.ordinal()] {
            return Err(TrackerError::DuplicateMessage {
                name: kind.name(),
                id: previous,
            });
        }
        if let Some(existing) = self.by_id[index] {
            return Err(TrackerError::DuplicateMessageId {
                id,
                existing: existing.name(),
            });
        }

        self.by_id[index] = Some(kind);
        self.ids[kind.ordinal()] = Some(id);
        tracing::debug!("message {} bound to id {}", kind.name(), id);
        Ok(kind)
    }

    /// Kind bound to an engine id.
    #[must_use]
    pub fn kind_of(&self, id: i32) -> Option<MessageKind> {
        usize::try_from(id)
            .ok()
            .and_then(|i| self.by_id.get(i).copied().flatten())
    }

    /// Engine id of a kind.
    #[must_use]
    pub fn id_of(&self, kind: MessageKind) -> Option<i32> {
        self.ids[kind.ordinal()]
    }

    /// Kinds the engine never registered.
    #[must_use]
    pub fn unbound(&self) -> Vec<MessageKind> {
        MessageKind::ALL
            .into_iter()
            .filter(|k| self.ids[k.ordinal()].is_none())
            .collect()
    }
}

// ============================================================================
// DECODER
// ============================================================================

/// In-flight decode state, alive between `begin` and `end`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeContext {
    /// Active kind, `None` for unbound ids.
    pub kind: Option<MessageKind>,
    /// Player the message concerns.
    pub subject: Option<PlayerSlot>,
    /// Index of the next field.
    pub state: usize,
}

/// A field write resolved to its handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldCall {
    /// Handler to run.
    pub slot: FieldSlot,
    /// Subject as of `begin`.
    pub subject: Option<PlayerSlot>,
}

/// An end signal resolved to its handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EndCall {
    /// Handler to run.
    pub slot: EndSlot,
    /// Subject as of `begin`.
    pub subject: Option<PlayerSlot>,
}

/// Single-instance decode state machine.
#[derive(Clone, Debug, Default)]
pub struct MessageDecoder {
    registry: MessageRegistry,
    context: Option<DecodeContext>,
}

impl MessageDecoder {
    /// Creates a decoder over a registry.
    #[must_use]
    pub fn new(registry: MessageRegistry) -> Self {
        Self {
            registry,
            context: None,
        }
    }

    /// The registry.
    #[must_use]
    pub fn registry(&self) -> &MessageRegistry {
        &self.registry
    }

    /// Mutable registry, for startup binding.
    pub fn registry_mut(&mut self) -> &mut MessageRegistry {
        &mut self.registry
    }

    /// Current decode context.
    #[must_use]
    pub fn context(&self) -> Option<&DecodeContext> {
        self.context.as_ref()
    }

    /// Starts a message. A `begin` without `end` simply replaces the
    /// previous context.
    pub fn begin(&mut self, id: i32, subject: Option<PlayerSlot>) -> Option<MessageKind> {
        let kind = self.registry.kind_of(id);
        tracing::trace!("message begin id={} kind={:?} subject={:?}", id, kind, subject);
        self.context = Some(DecodeContext {
            kind,
            subject,
            state: 0,
        });
        kind
    }

    /// Advances past one field write and returns its handler, if any.
    pub fn field(&mut self) -> Option<FieldCall> {
        let ctx = self.context.as_mut()?;
        let state = ctx.state;
        ctx.state += 1;
        let slot = *ctx.kind?.schema().fields.get(state)?;
        Some(FieldCall {
            slot,
            subject: ctx.subject,
        })
    }

    /// Ends the message and returns its end handler, if any.
    pub fn end(&mut self) -> Option<EndCall> {
        let ctx = self.context.take()?;
        let slot = ctx.kind?.schema().end?;
        Some(EndCall {
            slot,
            subject: ctx.subject,
        })
    }
}
