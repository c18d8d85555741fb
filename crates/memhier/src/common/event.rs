//! Coherence commands and memory events.
//!
//! A `MemEvent` is the unit of work that flows between caches. The controller only
//! needs to know which broad class a command belongs to; the meaning of each command
//! is left to the coherence protocol plugged into the controller.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use super::addr::{Addr, Cycle, line_base};

/// Unique identifier of a memory event.
pub type EventId = u64;

/// The link an event arrived on or is sent to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Toward the processor (the cache above this one).
    #[default]
    Up,
    /// Toward memory (the cache below this one).
    Down,
}

impl Side {
    /// Returns the opposite link.
    #[inline]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }
}

/// How the controller treats a command during admission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandClass {
    /// A new request from above: needs an MSHR entry and respects the reserve.
    Request,
    /// A request forwarded from below (invalidations, fetches): may use the
    /// reserved MSHR entry.
    ForwardRequest,
    /// A response or acknowledgement: completes work already tracked, so it
    /// bypasses MSHR admission.
    Response,
}

/// A coherence command carried by a memory event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Command {
    /// Read request (shared).
    GetS,
    /// Write request (exclusive).
    GetX,
    /// Atomic read-modify-write request.
    GetSX,
    /// Response to a shared read.
    GetSResp,
    /// Response to an exclusive read.
    GetXResp,
    /// Clean shared writeback.
    PutS,
    /// Dirty writeback.
    PutM,
    /// Clean exclusive writeback.
    PutE,
    /// Request for data without invalidation.
    Fetch,
    /// Request for data with invalidation.
    FetchInv,
    /// Request for data with downgrade to shared.
    FetchInvX,
    /// Forced invalidation.
    ForceInv,
    /// Invalidation of shared copies.
    Inv,
    /// Negative acknowledgement; the sender should retry.
    NACK,
    /// Acknowledges an invalidation.
    AckInv,
    /// Acknowledges a writeback.
    AckPut,
    /// Data response to a fetch.
    FetchResp,
    /// Data response to a downgrading fetch.
    FetchXResp,
    /// Flush a line to memory.
    FlushLine,
    /// Flush and invalidate a line.
    FlushLineInv,
    /// Acknowledges a flush.
    FlushLineResp,
    /// Incoherent write.
    Put,
    /// Incoherent read.
    Get,
    /// Acknowledges a data move.
    AckMove,
    /// Implementation-defined request.
    CustomReq,
    /// Implementation-defined response.
    CustomResp,
    /// Implementation-defined acknowledgement.
    CustomAck,
}

impl Command {
    /// Every command, in declaration order.
    pub const ALL: [Self; 27] = [
        Self::GetS,
        Self::GetX,
        Self::GetSX,
        Self::GetSResp,
        Self::GetXResp,
        Self::PutS,
        Self::PutM,
        Self::PutE,
        Self::Fetch,
        Self::FetchInv,
        Self::FetchInvX,
        Self::ForceInv,
        Self::Inv,
        Self::NACK,
        Self::AckInv,
        Self::AckPut,
        Self::FetchResp,
        Self::FetchXResp,
        Self::FlushLine,
        Self::FlushLineInv,
        Self::FlushLineResp,
        Self::Put,
        Self::Get,
        Self::AckMove,
        Self::CustomReq,
        Self::CustomResp,
        Self::CustomAck,
    ];

    /// Returns the command name as it appears in traces and statistics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetS => "GetS",
            Self::GetX => "GetX",
            Self::GetSX => "GetSX",
            Self::GetSResp => "GetSResp",
            Self::GetXResp => "GetXResp",
            Self::PutS => "PutS",
            Self::PutM => "PutM",
            Self::PutE => "PutE",
            Self::Fetch => "Fetch",
            Self::FetchInv => "FetchInv",
            Self::FetchInvX => "FetchInvX",
            Self::ForceInv => "ForceInv",
            Self::Inv => "Inv",
            Self::NACK => "NACK",
            Self::AckInv => "AckInv",
            Self::AckPut => "AckPut",
            Self::FetchResp => "FetchResp",
            Self::FetchXResp => "FetchXResp",
            Self::FlushLine => "FlushLine",
            Self::FlushLineInv => "FlushLineInv",
            Self::FlushLineResp => "FlushLineResp",
            Self::Put => "Put",
            Self::Get => "Get",
            Self::AckMove => "AckMove",
            Self::CustomReq => "CustomReq",
            Self::CustomResp => "CustomResp",
            Self::CustomAck => "CustomAck",
        }
    }

    /// Classifies the command for MSHR admission.
    pub const fn class(self) -> CommandClass {
        match self {
            Self::GetS
            | Self::GetX
            | Self::GetSX
            | Self::PutS
            | Self::PutM
            | Self::PutE
            | Self::FlushLine
            | Self::FlushLineInv
            | Self::Put
            | Self::Get
            | Self::CustomReq => CommandClass::Request,
            Self::Fetch | Self::FetchInv | Self::FetchInvX | Self::ForceInv | Self::Inv => {
                CommandClass::ForwardRequest
            }
            Self::GetSResp
            | Self::GetXResp
            | Self::NACK
            | Self::AckInv
            | Self::AckPut
            | Self::FetchResp
            | Self::FetchXResp
            | Self::FlushLineResp
            | Self::AckMove
            | Self::CustomResp
            | Self::CustomAck => CommandClass::Response,
        }
    }

    /// Returns true for the demand data requests tracked by hit/miss statistics.
    #[inline]
    pub const fn is_data_request(self) -> bool {
        matches!(self, Self::GetS | Self::GetX | Self::GetSX)
    }

    /// Returns the response command that answers this request, if any.
    pub const fn response(self) -> Option<Self> {
        match self {
            Self::GetS | Self::Get => Some(Self::GetSResp),
            Self::GetX | Self::GetSX | Self::Put => Some(Self::GetXResp),
            Self::PutS | Self::PutM | Self::PutE => Some(Self::AckPut),
            Self::Fetch => Some(Self::FetchResp),
            Self::FetchInv | Self::FetchInvX => Some(Self::FetchXResp),
            Self::Inv | Self::ForceInv => Some(Self::AckInv),
            Self::FlushLine | Self::FlushLineInv => Some(Self::FlushLineResp),
            Self::CustomReq => Some(Self::CustomResp),
            _ => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a command name is not recognized.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown command '{0}'")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// A memory event travelling between caches.
///
/// Events are created by the surrounding system (or a coherence protocol) and
/// received by the controller, which stamps the arrival cycle, sequence number and
/// line base address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemEvent {
    /// Unique event identifier.
    pub id: EventId,
    /// Coherence command.
    pub cmd: Command,
    /// Requested byte address.
    pub addr: Addr,
    /// Line base address (set by the controller on receipt).
    pub base_addr: Addr,
    /// Access size in bytes.
    pub size: u32,
    /// Link the event arrived on.
    pub src: Side,
    /// Bypasses the cache entirely when set.
    pub noncacheable: bool,
    /// Issued by a prefetcher rather than a demand access.
    pub prefetch: bool,
    /// Cycle at which the controller received the event.
    pub arrival: Cycle,
    /// Controller-assigned receive order, used to keep retries FIFO.
    pub seq: u64,
}

impl MemEvent {
    /// Creates a demand event arriving from above.
    ///
    /// # Arguments
    ///
    /// * `id` - Event identifier.
    /// * `cmd` - Coherence command.
    /// * `addr` - Requested byte address.
    pub const fn new(id: EventId, cmd: Command, addr: Addr) -> Self {
        Self {
            id,
            cmd,
            addr,
            base_addr: addr,
            size: 0,
            src: Side::Up,
            noncacheable: false,
            prefetch: false,
            arrival: 0,
            seq: 0,
        }
    }

    /// Marks the event as arriving on `side`.
    #[must_use]
    pub const fn from_side(mut self, side: Side) -> Self {
        self.src = side;
        self
    }

    /// Sets the access size in bytes.
    #[must_use]
    pub const fn with_size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    /// Marks the event as noncacheable.
    #[must_use]
    pub const fn noncacheable(mut self) -> Self {
        self.noncacheable = true;
        self
    }

    /// Marks the event as a prefetch.
    #[must_use]
    pub const fn prefetch(mut self) -> Self {
        self.prefetch = true;
        self
    }

    /// Builds the response to this event, addressed to the same line and travelling
    /// back toward the requester.
    #[must_use]
    pub fn make_response(&self, cmd: Command) -> Self {
        Self {
            cmd,
            src: self.src.opposite(),
            ..self.clone()
        }
    }

    /// Recomputes the line base address for the given line size.
    #[inline]
    pub const fn align(&mut self, line_size: u64) {
        self.base_addr = line_base(self.addr, line_size);
    }

    /// Admission class of the carried command.
    #[inline]
    pub const fn class(&self) -> CommandClass {
        self.cmd.class()
    }
}

impl fmt::Display for MemEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{} {:#x} (line {:#x}) from {:?}{}{}",
            self.cmd,
            self.id,
            self.addr,
            self.base_addr,
            self.src,
            if self.noncacheable { " NC" } else { "" },
            if self.prefetch { " PF" } else { "" },
        )
    }
}
