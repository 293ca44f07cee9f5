pub mod seller_updates;

pub use seller_updates::{run_seller_updates, RunOutcome};
