mod internal;
mod realtime_fft;

pub mod controller;
pub mod player;

pub use souvlaki::{MediaMetadata, MediaPlayback, MediaPosition};

pub use internal::{PlayerCommand, PlayerEvent};
