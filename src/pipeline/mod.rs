pub mod answer;
pub mod query;
pub mod refine;
pub mod sufficiency;
pub mod summarize;
pub mod template;

pub use refine::QuestionPipeline;
pub use sufficiency::SufficiencyVerdict;
