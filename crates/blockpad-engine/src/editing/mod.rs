/*!
 * # Editing Core
 *
 * ## Architecture Overview
 *
 * ### 1. Single Source of Truth: xi-rope Buffer
 * - The entire document is stored in a single **`xi_rope::Rope`** buffer
 * - **Lossless round-trip**: saving writes the buffer verbatim, delimiters included
 * - Block structure, ids and nested trees are all derived from it
 *
 * ### 2. Command-Based Editing
 * - All edits are **Commands** (`Cmd` enum) that compile to one **Delta**
 * - Structural commands (insert/delete/move/retype block) are plain text
 *   edits plus a promise about the resulting block sequence, checked before
 *   anything is committed
 * - Each command is one transaction producing one **Patch**
 *
 * ### 3. Incremental Block Parsing
 * - The delta's summary becomes a single `TextEdit` for the block reparser
 * - Only blocks around the edit are rescanned; the rest of the tree is shared
 *
 * ### 4. Stable Block IDs
 * - The **block index** splices in the reparsed blocks and keeps the id of
 *   every block whose delimiter survived the edit
 * - Ids, not ordinals, key nested trees and detection state
 *
 * ## Module Structure
 *
 * - **`document`**: `Document` with the commit pipeline and undo/redo
 * - **`commands`**: `Cmd` enum and delta compilation
 * - **`index`**: `BlockIndex` query API and id-preserving splice
 * - **`history`**: revision stacks and minimal restore edits
 * - **`patch`**: edit result metadata including changed ranges and new selection
 *
 * ## Usage Pattern
 *
 * ```rust
 * use blockpad_engine::editing::*;
 * use blockpad_syntax::Language;
 *
 * let mut doc = Document::from_bytes("∞∞∞text-a\nhello".as_bytes()).unwrap();
 *
 * let patch = doc.apply(Cmd::RetypeBlock {
 *     target: BlockRef::Active,
 *     language: Language::Markdown,
 *     auto_detect: false,
 * });
 * assert!(patch.is_some());
 *
 * let block = doc.index().first_block();
 * assert_eq!(block.language.language, Some(Language::Markdown));
 * assert_eq!(doc.block_content(block), "hello");
 * ```
 */

pub mod commands;
pub mod document;
pub mod history;
pub mod index;
pub mod patch;

pub use commands::{BlockRef, Cmd, CommandError, Placement};
pub use document::Document;
pub use history::History;
pub use index::{Block, BlockId, BlockIndex, IndexChange};
pub use patch::{Origin, Patch};
