//! Review request pipeline pieces
//!
//! Request and diff types, context gathering, prompt composition, the
//! response envelope and the listener contract.

pub mod compose;
pub mod context;
pub mod listener;
pub mod request;
pub mod response;
pub mod state;

pub use compose::{compose, PATCH_PLACEHOLDER};
pub use context::{ContextGatherer, ContextLimits, DiffSource};
pub use listener::{ChatResponseListener, ListenerEvent, RecordingListener, ResponseEmitter};
pub use request::{ChangeInfo, ChangedFile, DiffHunk, FileDiff, FileStatus, ReviewRequest};
pub use response::ChatResponse;
pub use state::RequestPhase;
