pub mod fs;

pub use crate::fs::{read_json, read_json_opt, write_json_sorted};
