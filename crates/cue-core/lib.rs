//! # cue-core
//!
//! Timed-text caption parser. Reads TTML documents in a single streaming
//! pass and produces renderer-ready cues: timed text with sorted inline
//! entities, resolved styles and shared regions. Cues can be indexed in an
//! interval tree to find everything active at an instant.
//!
//! ## Features
//!
//! - **Streaming**: pull tokenizer, no DOM; header blocks and paragraphs
//!   are the only buffered subtrees
//! - **Grammar checked**: misplaced elements are reported and skipped, the
//!   rest of the document still parses
//! - **Every time base**: `media`, `clock` and `smpte` including drop-frame
//!   time codes
//! - **Thread-safe output**: cues are `Send + Sync`, regions and styles are
//!   shared through `Arc`
//!
//! ## Quick Start
//!
//! ```rust
//! use cue_core::{ttml::{CaptionAdapter, TtmlAdapter}, track::CueTrack};
//!
//! let document = r#"<tt xmlns="http://www.w3.org/ns/ttml"
//!     xmlns:tts="http://www.w3.org/ns/ttml#styling">
//!   <head>
//!     <styling><style xml:id="s1" tts:color="white"/></styling>
//!     <layout><region xml:id="bottom" tts:origin="10% 80%"/></layout>
//!   </head>
//!   <body style="s1"><div region="bottom">
//!     <p begin="00:00:01.000" end="00:00:03.000">Hello<br/>world</p>
//!   </div></body>
//! </tt>"#;
//!
//! let result = TtmlAdapter::new().parse(document)?;
//! assert_eq!(result.data[0].content(), "Hello\nworld");
//! assert_eq!(result.data[0].region().map(|r| r.id()), Some("bottom"));
//!
//! let mut track = CueTrack::new();
//! track.add_result(result);
//! assert_eq!(track.active_cues(2000.0).len(), 1);
//! # Ok::<(), cue_core::CoreError>(())
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(clippy::all)]
#![deny(unsafe_code)]

pub mod grammar;
pub mod model;
pub mod scope;
pub mod timing;
pub mod tokenizer;
pub mod track;
pub mod tree;
pub mod ttml;
pub mod utils;

pub use model::{CueNode, Entity, EntityKind, Region, TtmlStyle};
pub use timing::{IntervalTree, TimeDetails};
pub use tokenizer::{MarkupTokenizer, Token};
pub use track::{group_by_region, CueTrack};
pub use ttml::{AdapterOptions, CaptionAdapter, ParseError, ParseResult, TtmlAdapter};
pub use utils::{CoreError, Result};

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
