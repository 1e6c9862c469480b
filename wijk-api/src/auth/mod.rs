mod extractor;

pub use extractor::{AuthWorker, WORKER_ID_HEADER};
