pub mod config;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod tasks;
pub mod utils;


pub use errors::MorphRankError;
pub use models::{
    CardKind,
    CardRecord,
    Morph,
    MorphKey,
    NoteRecord,
    NoteType,
    QueueState,
};
