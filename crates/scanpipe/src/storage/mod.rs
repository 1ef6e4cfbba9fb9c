pub mod naming;
pub mod staging;

pub use naming::available_name;
pub use staging::{ensure_directory, ordered_files, parse_index, remove_directory, sort_by_index};
