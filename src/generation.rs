//! Generation coordination: submit one background job per document, poll
//! until its result is observed, and report settlement or failure.

pub mod comparator;
pub mod coordinator;
pub mod task;

pub use comparator::{Baseline, ComparatorKind, CompletionComparator};
pub use coordinator::{CoordinatorState, GenerationCoordinator, GenerationObserver, PollSettings};
pub use task::{GenerationTask, TaskHandle, TaskStatus};
