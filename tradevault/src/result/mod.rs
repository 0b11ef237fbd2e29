//! Result classification, interpretation and retrieval.

pub mod classifier;
pub mod extractor;
pub mod retrieval;

pub use classifier::{
    classify, has_zip_signature, select_entry, ClassifiedContent, ContentKind, ResultBundle,
};
pub use extractor::{
    compose_advice, format_percent, interpret_text, ExecutableAction, ExtractedOutcome,
    Interpretation,
};
pub use retrieval::{interpret_result, ResultRetriever, ResultSource, RetrievedResult};
