mod broker_kafka;
mod channel_transport;
mod endpoint;
mod envelope;
mod port;
mod rpc_client;
mod server;

pub use broker_kafka::*;
pub use channel_transport::*;
pub use endpoint::*;
pub use envelope::*;
pub use port::*;
pub use rpc_client::*;
pub use server::*;
