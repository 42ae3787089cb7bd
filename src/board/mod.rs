//! The task board core: column partitioning, drop resolution, the
//! reorder/transition engine, the task store and the drag session.

pub mod engine;
pub mod partition;
pub mod resolver;
pub mod session;
pub mod store;

pub use engine::apply;
pub use partition::partition;
pub use resolver::{resolve, CardBounds, DropTarget, Gesture, Resolution};
pub use session::{DragSession, DragState, DropOutcome, Hover};
pub use store::TaskStore;
