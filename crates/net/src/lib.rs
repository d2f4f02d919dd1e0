pub mod auth;
pub mod discovery;
pub mod health;
pub mod maintenance;
pub mod orchestrator;
pub mod protocol;
pub mod server;
pub mod transport;

pub use auth::Authenticator;
pub use discovery::{ActivePeer, BeaconPayload, Discovery, PeerOrigin, PersistentPeerRegistry, UdpBeacon};
pub use health::HealthSnapshot;
pub use maintenance::MaintenanceTask;
pub use orchestrator::{SyncClient, SyncOrchestrator};
pub use protocol::{Request, Response};
pub use server::SyncServer;
