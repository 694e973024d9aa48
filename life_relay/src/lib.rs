//! Background compute relay for Conway's Game of Life.
//!
//! The host hands generation steps to a [`Relay`] running on another thread
//! (or task) and gets the next live-cell set back as a message:
//!
//! ```text
//! host                         relay                       compute module
//!  | -- init { modulePath } --> | -- load(locator) -------> |
//!  | <------------- ready ----- |                           |
//!  | -- calculate { .. } -----> | -- compute_step(json) --> |
//!  | <--- result { .. } ------- | <-------------- json ---- |
//! ```
//!
//! Any failure comes back as `error { error }` and the relay keeps serving.

pub mod codec;
pub mod compute;
pub mod config;
pub mod error;
pub mod grid;
pub mod history;
pub mod host;
pub mod logging;
pub mod patterns;
pub mod protocol;
pub mod relay;

pub use codec::{StepRequest, StepResponse};
pub use compute::{BuiltinLoader, ComputeModule, FnModule, LifeModule, ModuleLoader, Rule, Topology};
pub use config::{LifeConfig, RelayConfig};
pub use error::{CodecError, ComputeError, HostError, LoadError, RelayError};
pub use grid::{AliveSet, Coordinate, GridSize};
pub use host::{RelayClient, RelayHandle};
pub use protocol::{HostMessage, RelayMessage};
pub use relay::{Relay, RelayState};

/// Starts a relay with the built-in modules on its own thread.
pub fn spawn_builtin(config: RelayConfig) -> std::io::Result<RelayHandle> {
    Relay::builtin(config).spawn_thread()
}
