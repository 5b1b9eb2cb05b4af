pub mod commands;
pub mod config;
pub mod input;
pub mod session;
pub mod shortcuts;
pub mod tools;

pub use commands::{Command, CommandCategory, CommandKind, CommandStack, HistoryEntry, Mutation, compute_inverse};
pub use config::{ConfigError, EditorConfig};
pub use input::{InputEvent, Modifiers};
pub use session::EditorSession;
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use tools::{CursorHint, SelectTool, ToolAction, ToolContext, is_selectable, snap_rotation};
