pub mod known_morphs;
pub mod priority;
pub mod token_dictionary;

pub use priority::{
    PriorityTable,
    PRIORITY_RANK_CEILING,
};
