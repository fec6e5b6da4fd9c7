//! # CourseBell Channels
//!
//! Outbound delivery implementations of the `Notifier` seam. The Discord
//! channel talks to the real Bot API; the console channel logs locally and
//! exists for development and dry runs.

pub mod console;
pub mod discord;

pub use console::ConsoleNotifier;
pub use discord::DiscordNotifier;
