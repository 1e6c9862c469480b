mod ids;
mod report;
mod requests;
mod session;
mod time_entry;
mod worker;

pub use ids::*;
pub use report::*;
pub use requests::*;
pub use session::*;
pub use time_entry::*;
pub use worker::*;
