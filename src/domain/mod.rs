pub mod criteria;
pub mod logic;
pub mod property;
pub mod seller_update;

pub use criteria::{RangeBound, SearchCriteria};
pub use logic::{derive_status_bucket, StatusBucket};
pub use property::{PropertyRecord, StandardStatus};
pub use seller_update::{NewSellerUpdate, SellerUpdateCriteria, StoredSellerUpdate, UpdateFrequency};
