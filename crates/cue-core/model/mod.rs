//! Normalized caption model
//!
//! Output types shared by every adapter: cues with their inline entities,
//! regions and resolved styles. All of them are `Send + Sync`; regions and
//! styles are shared through `Arc`.

pub mod cue;
pub mod region;
pub mod style;

pub use cue::{sort_entities, CueNode, CueNodeBuilder, Entity, EntityKind};
pub use region::Region;
pub use style::{TtmlStyle, STYLE_PREFIX};
