mod ephemeral;
mod sweeper;

pub use ephemeral::EphemeralDocumentStore;
pub use sweeper::Sweeper;
