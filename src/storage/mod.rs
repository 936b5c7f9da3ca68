mod core;
mod object;

pub use self::core::StorageClient;
pub use object::{StorageObject, UploadFile};
