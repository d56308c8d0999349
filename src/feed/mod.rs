pub mod accumulator;
pub mod coordinator;
pub mod dispatcher;
pub mod pull;
pub mod push;
pub mod reducer;
pub mod selector;
pub mod status_sync;

pub use accumulator::BatchAccumulator;
pub use coordinator::{LogsCoordinator, Transports};
pub use dispatcher::{PendingAppend, ThrottledDispatcher};
pub use pull::PullAdapter;
pub use push::PushAdapter;
pub use reducer::{Generation, LogAction, LogNode, LogReducer, LogState, LogsView, SharedReducer};
pub use selector::{select_mode, Availability, AvailabilitySignal, TransportMode};
pub use status_sync::StatusSynchronizer;
