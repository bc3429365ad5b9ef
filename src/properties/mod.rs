//! Property records: the typed output of parsing one run
//!
//! ```rust
//! use runlab::properties::{PropertyRecord, Value};
//!
//! let record = PropertyRecord::new().with("symmetry_group_order", 48_i64);
//! assert_eq!(record.get("symmetry_group_order"), Some(&Value::Int(48)));
//! assert!(record.get("time_symmetries").is_none());
//! ```

mod record;
mod value;

pub use record::PropertyRecord;
pub use value::{Value, ValueType};
