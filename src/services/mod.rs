//! Application services composed from the auth core and the store traits

pub mod workstation;

pub use workstation::{DocumentUpload, MessageDraft, RequestDraft, Workstation, WorkstationBuilder};
