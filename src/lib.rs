//! Keyboard control of media playback: speed, seeking, volume, marks and the
//! controller overlay, for media elements anywhere in a page including nested
//! shadow roots.
//!
//! [`router::InputRouter`] turns keydown events into actions and
//! [`dispatcher::ActionDispatcher`] applies them to the elements tracked by
//! [`registry::MediaRegistry`]. Both share one [`settings::Settings`] snapshot.

pub mod config;
pub mod dispatcher;
pub mod dom;
pub mod keys;
pub mod media;
pub mod registry;
pub mod router;
pub mod settings;
pub mod storage;
pub mod traversal;
pub mod utils;
