//! Terminal UI layer for the chat screen.
//!
//! - [`chat_loop`]: the interaction loop that routes input to
//!   [`crate::commands`] and drives replies via [`crate::core::chat_stream`].
//! - [`renderer`]: frame layout and drawing.
//! - [`theme`]: colour and style policy.
//!
//! This layer presents and captures interaction state; [`crate::core`] owns
//! the conversation logic.

pub mod chat_loop;
pub mod renderer;
pub mod theme;
