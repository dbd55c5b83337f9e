// Retrieval-augmented answering
//
// Components:
// - Retriever: nearest fact for a query
// - Prompts: expand and out-of-scope templates
// - Composer: runs the generator over the chosen prompt
// - Pipeline: one full turn against a session

pub mod composer;
pub mod pipeline;
pub mod prompts;
pub mod retrieval;

pub use composer::{AnswerComposer, ComposeMode, ComposedAnswer};
pub use pipeline::{ChatPipeline, TurnReport};
pub use retrieval::{RetrievalHit, Retriever};
