mod core;
mod subject;

pub use self::core::AuthClient;
pub use subject::Subject;
