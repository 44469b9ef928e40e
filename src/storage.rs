mod record;
pub mod store;

pub use record::{AssignmentRecord, CoverRowRecord};
pub use store::{DeleteError, Store, StoreError};
