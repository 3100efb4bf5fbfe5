use super::progress::RecalcProgress;
use crate::core::{
    pipeline::RecalcSummary,
    MorphRankError,
};

#[derive(Debug)]
pub enum TaskResult {
    Progress(RecalcProgress),
    Recalc(Result<RecalcSummary, MorphRankError>),
}
