//! Real-time Activity Broadcast
//!
//! Live push of enriched activities and connection statistics to every
//! connected client over WebSockets.
//!
//! # Architecture
//!
//! - **`registry`** - `ConnectionRegistry`, the only owner of connection state
//! - **`stats`** - `ConnectionStats` recomputed from registry snapshots
//! - **`protocol`** - JSON envelopes for inbound requests and outbound events
//! - **`dispatcher`** - non-blocking fan-out and unicast over bounded outboxes
//! - **`lifecycle`** - periodic idle-connection sweep
//! - **`hub`** - `ActivityHub` tying the above together, plus collaborator ingest
//! - **`socket`** - the per-connection WebSocket actor behind `GET /ws`
//!
//! # Data Flow
//!
//! ```text
//! collaborator ──HubEvents──▶ ingest task ──▶ Dispatcher ──try_send──▶ outbox ──▶ writer ──▶ socket
//!                                                 ▲
//! socket reader ──▶ ActivityHub::handle_frame ────┘ (unicast replies)
//! ```

pub mod dispatcher;
pub mod hub;
pub mod lifecycle;
pub mod protocol;
pub mod registry;
pub mod socket;
pub mod stats;

pub use dispatcher::{Delivery, DeliveryReport, Dispatcher, SharedFormatter};
pub use hub::{ingest_channel, ActivityHub, HubEvent, HubEvents};
pub use lifecycle::{LifecycleManager, SweepReport};
pub use protocol::{ClientRequest, ServerEvent};
pub use registry::{ClientConnection, ConnectionId, ConnectionRegistry, RegistryError};
pub use socket::{ws_handler, SocketSettings};
pub use stats::ConnectionStats;
