pub mod directory;

pub use directory::{PgUserDirectory, UserDirectory};
