//! Ground-station link.
//!
//! Ground stations hold a WebSocket open to the server; the
//! [`GroundStationGateway`] tracks those sockets and delivers control frames
//! over them.

mod handler;
pub mod manager;

pub use handler::gs_ws_handler;
pub use manager::GroundStationGateway;
