//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod bridge;
pub mod clients;
pub mod connectivity;
pub mod display;
pub mod heartbeat;
pub mod operator;
pub mod peer;
pub mod radio;
pub mod status;

pub use bridge::bridge_task;
pub use clients::clients_task;
pub use connectivity::connectivity_task;
pub use display::display_task;
pub use heartbeat::heartbeat_task;
pub use operator::operator_task;
pub use peer::peer_task;
pub use radio::radio_task;
pub use status::status_task;
