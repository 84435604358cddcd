pub mod bridge;
pub mod channel;
pub mod error;
pub mod registry;
pub mod session;
pub mod store;

pub use bridge::{BroadcastBridge, RemoteSignal};
pub use channel::{BroadcastChannel, ChannelEvent, DirChannel, MemoryBus, MemoryEndpoint};
pub use error::{Result, SyncError};
pub use registry::{RegistryEvent, StaticRegistry, WindowRegistry};
pub use session::SessionRegistry;
pub use store::{SharedConfigStore, StoreUpdate};
