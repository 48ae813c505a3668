pub mod engine;
pub mod feedback;
pub mod patch;
pub mod pipeline;
pub mod resolve;

pub use crate::domain::model::{
    AnalysisResult, ChangedFile, DraftComment, ExistingComment, PullFile, PullRequestRef,
    ReviewFinding, ReviewOutcome,
};
pub use crate::domain::ports::{Analyzer, CodeHost, ConfigProvider, Pipeline};
pub use crate::utils::error::Result;
