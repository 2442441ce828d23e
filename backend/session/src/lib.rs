//! The conversion lifecycle: one user session of upload, OCR, review, save
//! and history management against injected OCR and store clients.

pub mod controller;
pub mod event;
pub mod history;
pub mod phase;
pub mod report;

pub use controller::{ConversionController, DeleteOutcome, SaveOutcome, SessionSnapshot, SubmitOutcome};
pub use event::SessionEvent;
pub use history::History;
pub use phase::{Phase, RequestToken};
pub use report::{Notice, Severity};
