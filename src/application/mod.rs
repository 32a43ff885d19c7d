//! Application layer - request orchestration over the domain and ports.
//!
//! The `Dispatcher` is the single entry point the surrounding request layer
//! calls; `Router` and `AnswerComposer` are its collaborators.

mod answer;
mod dispatcher;
mod router;

pub use answer::AnswerComposer;
pub use dispatcher::{DispatchReply, Dispatcher};
pub use router::{RouteDecision, Router};
