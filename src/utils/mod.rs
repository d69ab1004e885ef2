pub mod paths;

pub use paths::usage_data_paths;
