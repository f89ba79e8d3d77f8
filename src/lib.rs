//! Enhanced Metafile recorder
//!
//! Turns drawing calls on a virtual surface into a byte-exact EMF record
//! stream. A [`Recorder`] tracks the handle table for the graphics objects
//! the stream refers to and the device-space bounds of everything drawn,
//! and patches both into the header when it is closed.
//!
//! ```no_run
//! use emf_recorder::{MetafileOptions, Rect, Recorder, Surface};
//!
//! fn draw<S: Surface>(surface: S) -> emf_recorder::RecorderResult<Vec<u8>> {
//!     let mut recorder = Recorder::open(surface, MetafileOptions::new())?;
//!     recorder.rectangle(Rect::new(0, 0, 100, 50))?;
//!     let metafile = recorder.close()?;
//!     Ok(metafile.as_bytes().to_vec())
//! }
//! ```

pub mod bounds;
pub mod buffer;
pub mod config;
pub mod emf_records;
pub mod error;
pub mod handles;
pub mod metafile;
pub mod record;
pub mod recorder;
pub mod surface;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use bounds::{BoundsTracker, CoordinateSpace, DeviceSpace};
pub use config::{Description, DeviceCaps, MetafileOptions};
pub use error::{RecorderError, RecorderResult};
pub use metafile::{is_emf_format, EnhMetafile, MetafileHeader, RawRecord};
pub use recorder::Recorder;
pub use surface::{DeviceContext, ObjectRegistry, Surface};
pub use types::{
    ColorRef, DibPattern, ExtLogPen, GraphicsMode, LogBrush, LogFont, LogPen, ObjectIndex,
    ObjectKind, ObjectRef, PaletteEntry, Point, Rect, RegionData, SizeL, StockObject, TriVertex,
    XForm,
};
