pub mod error;
pub mod local_storage;
pub mod supabase;

pub use error::DatabaseError;
