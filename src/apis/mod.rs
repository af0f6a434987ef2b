pub mod paris_opendata;
pub mod raw_file;

pub use paris_opendata::ParisOpenDataApi;
pub use raw_file::RawFileSource;
