pub mod records;
pub mod text;

pub use records::{Prediction, UserRecord, UserUpdate};
pub use text::{normalize_text, tokens};
