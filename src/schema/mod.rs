pub mod arrow;
pub mod write;

pub use self::arrow::{build_arrow_schema, to_record_batch};
pub use write::{write_dataset, write_table};
