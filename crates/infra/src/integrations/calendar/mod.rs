//! Calendar source adapters.
//!
//! - [`native`]: desktop calendar application via the scripting bridge
//! - [`ics`]: user-supplied `.ics` files
//! - [`google`]: Google Calendar REST API

pub mod google;
pub mod ics;
pub mod native;

pub use google::CloudApiAdapter;
pub use ics::FileImportAdapter;
pub use native::NativeScriptAdapter;
