pub mod catalog;
pub mod directory;

pub use catalog::{DoctorCatalog, StaticDoctorCatalog};
pub use directory::DirectoryService;
