// Copyright (c) 2022-2023 The MobileCoin Foundation

//! Ledger Mavryk Baking App API Library (and CLI)
//!

pub use ledger_transport::Exchange;

/// Re-export transports for consumer use
#[cfg(feature = "transport_tcp")]
pub mod transport;
#[cfg(feature = "transport_tcp")]
pub use transport::{TcpOptions, TransportTcp};

/// Re-export `mavryk-apdu` for consumers
pub use mavryk_apdu::{self as apdu};

mod handle;
pub use handle::{DeviceKey, MavrykClient};

mod error;
pub use error::Error;

pub mod keys;

/// Baking app client over the Speculos TCP transport
#[cfg(feature = "transport_tcp")]
pub type TcpClient = MavrykClient<TransportTcp>;

#[cfg(feature = "transport_tcp")]
impl TcpClient {
    /// Connect to a Speculos APDU socket
    pub async fn connect(opts: TcpOptions) -> Result<Self, Error> {
        let t = TransportTcp::new(opts).await?;
        Ok(Self::from(t))
    }
}
