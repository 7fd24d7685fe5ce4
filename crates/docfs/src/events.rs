use crate::doc::InodeId;
use crate::entity::Entity;
use crate::fs::ProbeState;

/// Severity attached to [`FsEvent::Log`] notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Info => write!(f, "info"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Notifications published by a filesystem instance.
///
/// Observability only: mutations succeed or fail independent of whether
/// anything subscribes, and the `Log` stream never substitutes for an
/// operation's error path.
#[derive(Debug, Clone)]
pub enum FsEvent {
    /// The filesystem is online.
    Ready,
    /// A format was initiated.
    Format,
    /// The store probe classified the filesystem as not usable as-is.
    InitFailed(ProbeState),
    /// The store probe failed outright (transport-level error).
    InitError(String),
    Log {
        level: LogLevel,
        message: String,
    },
    /// Emitted alongside both `Mkdir` and `Mkfile`.
    Create {
        dir: InodeId,
        name: String,
        entity: Entity,
    },
    Mkdir {
        dir: InodeId,
        name: String,
        entity: Entity,
    },
    Mkfile {
        dir: InodeId,
        name: String,
        entity: Entity,
    },
    Remove {
        dir: InodeId,
        name: String,
    },
    Move {
        src_dir: InodeId,
        old_name: String,
        dst_dir: InodeId,
        new_name: String,
        new_path: String,
    },
}
