//! Type definitions for the score prediction pipeline

pub mod record;
pub mod reply;
pub mod table;

pub use record::{InputRecord, RawRecord};
pub use reply::{PredictionReply, ReplyStatus};
pub use table::{Cell, Column, FeatureTable, COLUMNS};
