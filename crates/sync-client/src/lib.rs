//! Client side of a shared chess game.
//!
//! The `Controller` owns the session state and wires a `BoardView` (what the
//! player sees and drags) to a `SyncChannel` (the shared game document).

pub mod board;
pub mod channel;
pub mod commands;
pub mod controller;
pub mod error;
pub mod history_panel;
pub mod link;

pub use board::{BoardView, Gesture, RecordingBoard, TextBoard};
pub use channel::{MemoryChannel, RemoteChannel, SyncChannel, SyncEvent};
pub use controller::{Controller, DropOutcome, GestureOutcome, Session, UiEvent};
pub use error::ClientError;
pub use history_panel::{MoveHistoryPanel, Preview};
