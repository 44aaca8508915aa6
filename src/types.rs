use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;

/// Set on the numeric flags of an event that concerns a directory.
pub const IN_ISDIR: u32 = 0x4000_0000;

/// Kind of a single filesystem change, named after the inotify event it
/// corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Access,
    Modify,
    Attrib,
    CloseWrite,
    CloseNoWrite,
    Open,
    MovedFrom,
    MovedTo,
    Create,
    Delete,
    DeleteSelf,
    MoveSelf,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::Access,
        EventKind::Modify,
        EventKind::Attrib,
        EventKind::CloseWrite,
        EventKind::CloseNoWrite,
        EventKind::Open,
        EventKind::MovedFrom,
        EventKind::MovedTo,
        EventKind::Create,
        EventKind::Delete,
        EventKind::DeleteSelf,
        EventKind::MoveSelf,
    ];

    /// inotify bit for this kind.
    pub const fn bits(self) -> u32 {
        match self {
            EventKind::Access => 0x001,
            EventKind::Modify => 0x002,
            EventKind::Attrib => 0x004,
            EventKind::CloseWrite => 0x008,
            EventKind::CloseNoWrite => 0x010,
            EventKind::Open => 0x020,
            EventKind::MovedFrom => 0x040,
            EventKind::MovedTo => 0x080,
            EventKind::Create => 0x100,
            EventKind::Delete => 0x200,
            EventKind::DeleteSelf => 0x400,
            EventKind::MoveSelf => 0x800,
        }
    }

    /// inotify constant name, e.g. `IN_CLOSE_WRITE`.
    pub const fn flag_name(self) -> &'static str {
        match self {
            EventKind::Access => "IN_ACCESS",
            EventKind::Modify => "IN_MODIFY",
            EventKind::Attrib => "IN_ATTRIB",
            EventKind::CloseWrite => "IN_CLOSE_WRITE",
            EventKind::CloseNoWrite => "IN_CLOSE_NOWRITE",
            EventKind::Open => "IN_OPEN",
            EventKind::MovedFrom => "IN_MOVED_FROM",
            EventKind::MovedTo => "IN_MOVED_TO",
            EventKind::Create => "IN_CREATE",
            EventKind::Delete => "IN_DELETE",
            EventKind::DeleteSelf => "IN_DELETE_SELF",
            EventKind::MoveSelf => "IN_MOVE_SELF",
        }
    }

    /// Human readable label used when logging a received event.
    pub const fn label(self) -> &'static str {
        match self {
            EventKind::Access => "Access",
            EventKind::Modify => "Modify",
            EventKind::Attrib => "Attrib",
            EventKind::CloseWrite => "Close write",
            EventKind::CloseNoWrite => "Close nowrite",
            EventKind::Open => "Opened",
            EventKind::MovedFrom => "Moved from",
            EventKind::MovedTo => "Moved to",
            EventKind::Create => "Creating",
            EventKind::Delete => "Deleting",
            EventKind::DeleteSelf => "Delete self",
            EventKind::MoveSelf => "Move self",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag_name())
    }
}

/// Set of event kinds a job reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct EventMask(u32);

impl EventMask {
    pub const EMPTY: EventMask = EventMask(0);

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn all() -> Self {
        EventKind::ALL.into_iter().map(EventMask::from).fold(Self::EMPTY, |a, b| a | b)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, kind: EventKind) -> bool {
        self.0 & kind.bits() != 0
    }

    pub fn kinds(self) -> impl Iterator<Item = EventKind> {
        EventKind::ALL.into_iter().filter(move |k| self.contains(*k))
    }

    /// Parse a list of config names (`create`, `write_close`, `all`, ...).
    ///
    /// Entries may themselves contain comma separated names. Unknown names
    /// are rejected.
    pub fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Self, String> {
        let mut mask = Self::EMPTY;
        for entry in names {
            for name in entry.as_ref().split(',') {
                let name = name.trim();
                if name.is_empty() {
                    continue;
                }
                mask |= name.parse::<EventMask>()?;
            }
        }
        Ok(mask)
    }
}

impl From<EventKind> for EventMask {
    fn from(kind: EventKind) -> Self {
        EventMask(kind.bits())
    }
}

impl BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: Self) -> Self::Output {
        EventMask(self.0 | rhs.0)
    }
}

impl BitOr<EventKind> for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventKind) -> Self::Output {
        EventMask(self.0 | rhs.bits())
    }
}

impl BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromStr for EventMask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.trim().to_lowercase().as_str() {
            "access" => EventKind::Access,
            "attribute_change" => EventKind::Attrib,
            "write_close" => EventKind::CloseWrite,
            "nowrite_close" => EventKind::CloseNoWrite,
            "create" => EventKind::Create,
            "delete" => EventKind::Delete,
            "self_delete" => EventKind::DeleteSelf,
            "modify" => EventKind::Modify,
            "self_move" => EventKind::MoveSelf,
            "move_from" => EventKind::MovedFrom,
            "move_to" => EventKind::MovedTo,
            "open" => EventKind::Open,
            "all" => return Ok(EventMask::all()),
            "move" => return Ok(EventMask::from(EventKind::MovedFrom) | EventKind::MovedTo),
            "close" => {
                return Ok(EventMask::from(EventKind::CloseWrite) | EventKind::CloseNoWrite);
            }
            other => return Err(format!("unknown event name: {other}")),
        };
        Ok(kind.into())
    }
}
