pub mod journal;
pub mod writer;

pub use journal::ResultJournal;
pub use writer::ResultWriter;
