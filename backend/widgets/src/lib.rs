//! Widget state for the review pane and the history sidebar.
//!
//! Rendering is left to the front end; these types hold what a widget shows
//! and turn user input into controller calls.

pub mod history;
pub mod review;

pub use history::{HistoryAction, HistoryRow, HistoryView, RowTarget, dispatch};
pub use review::{COPY_ACK, Clipboard, MemoryClipboard, TextReview, export_file_name};
