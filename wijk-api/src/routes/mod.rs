pub(crate) mod error;
pub(crate) mod time_tracking;

pub(crate) use error::ApiError;
