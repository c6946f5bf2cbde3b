//! Main chat event loop and terminal lifecycle.
//!
//! The loop owns the [`App`](crate::core::app::App), polls terminal input,
//! drains reply streams, applies queued actions, and redraws at a bounded
//! frame rate.

mod event_loop;
mod keybindings;
mod lifecycle;

pub use event_loop::run_chat;
