//! Screen capture domain — public API.
//!
//! `codec` is the pure image layer, `host` runs in the privileged background
//! context, and `coordinator` is what control surfaces call.

pub mod codec;
pub mod coordinator;
pub mod host;

pub use codec::{crop, CodecError, EncodedImage};
pub use coordinator::{CaptureCoordinator, CAPTURE_TIMEOUT, REQUEST_TIMEOUT};
pub use host::{is_restricted_url, BackgroundHost, Browser, HostChannel, Tab, TabId};
