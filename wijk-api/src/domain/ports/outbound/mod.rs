mod clock;
mod time_entry_store;
mod user_directory;

pub use clock::*;
pub use time_entry_store::*;
pub use user_directory::*;
