pub mod detection;
pub mod dispatch;
pub mod editing;
pub mod io;

// Re-export key types for easier usage
pub use detection::{AutoDetector, DetectionSettings, Phase};
pub use dispatch::{Dispatcher, LanguageRegistry};
pub use editing::{Block, BlockId, BlockIndex, BlockRef, Cmd, CommandError, Document, Origin, Patch, Placement};
pub use io::*;
