//! Defstack Markup - XML persistence for definition records
//!
//! One definition per file:
//!
//! ```xml
//! <Defs.ThingDef Name="Steel" Parent="BaseMetal">
//!   <label>steel</label>
//!   <tags>
//!     <lv>metal</lv>
//!   </tags>
//! </Defs.ThingDef>
//! ```
//!
//! The root tag is the type name (namespace prefix stripped on read). Each
//! child element is a field; `lv` children are list elements. Scene-local
//! definitions sit in a scene document's `Defs` container instead.

mod config;
mod error;
mod loader;
mod markup;
mod persist;
mod reader;
mod writer;

pub use config::MarkupConfig;
pub use error::{Error, Result};
pub use markup::{Markup, SceneDocument};
pub use persist::{DefWriter, FsWriter, MemoryWriter};
pub use reader::SCENE_DEFS;
pub use writer::SCENE_ROOT;
