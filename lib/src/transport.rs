// Copyright (c) 2022-2023 The MobileCoin Foundation

//! TCP transport for the Speculos APDU socket
//!
//! Requests are framed as `len (u32 BE) || apdu`, responses as
//! `len (u32 BE) || data (len bytes) || status word (2 bytes)`.

use std::{
    io,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    ops::Deref,
    time::Duration,
};

use async_trait::async_trait;
use ledger_apdu::{APDUAnswer, APDUCommand};
use ledger_transport::Exchange;
use log::{debug, trace};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpStream,
    sync::Mutex,
};

use crate::Error;

/// Upper bound on response frame length
const MAX_FRAME_LEN: usize = 1024;

/// TCP transport options
#[derive(Clone, Debug, PartialEq, clap::Parser)]
pub struct TcpOptions {
    /// Speculos APDU socket address
    #[clap(long = "apdu-addr", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST), env = "SPECULOS_APDU_ADDR")]
    pub addr: IpAddr,

    /// Speculos APDU socket port
    #[clap(long = "apdu-port", default_value_t = 9999, env = "SPECULOS_APDU_PORT")]
    pub port: u16,
}

impl Default for TcpOptions {
    fn default() -> Self {
        Self {
            addr: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 9999,
        }
    }
}

impl TcpOptions {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            ..Default::default()
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.addr, self.port)
    }
}

/// Speculos TCP APDU transport
///
/// Exchanges may time out or be dropped part way through. Unsent request
/// bytes and partially received responses are kept with the connection, and
/// replies to abandoned requests are discarded before the next request is
/// written, so every answer is matched to its own request.
pub struct TransportTcp {
    c: Mutex<Conn>,
    timeout: Duration,
}

/// Connection state shared between exchanges
struct Conn {
    s: TcpStream,
    /// Framed request bytes not yet written
    tx: Vec<u8>,
    /// Received bytes not yet consumed as a frame
    rx: Vec<u8>,
    /// Requests written without a consumed response
    pending: usize,
}

impl TransportTcp {
    /// Connect to a Speculos APDU socket
    pub async fn new(opts: TcpOptions) -> Result<Self, Error> {
        debug!("Connecting to {}", opts.socket_addr());

        let s = TcpStream::connect(opts.socket_addr()).await?;

        Ok(Self {
            c: Mutex::new(Conn::new(s)),
            timeout: Duration::from_secs(60),
        })
    }

    /// Connect, retrying until the socket is available or the timeout elapses
    pub async fn connect_timeout(opts: TcpOptions, timeout: Duration) -> Result<Self, Error> {
        let t = tokio::time::timeout(timeout, async {
            loop {
                match Self::new(opts.clone()).await {
                    Ok(t) => return t,
                    Err(e) => trace!("Connect failed: {e}"),
                }
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
        })
        .await?;

        Ok(t)
    }

    /// Set the response timeout for exchanges
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Number of abandoned requests whose responses are still outstanding
    pub async fn pending(&self) -> usize {
        self.c.lock().await.pending
    }
}

/// Frame an encoded APDU for the socket
pub fn frame(apdu: &[u8]) -> Vec<u8> {
    let mut b = Vec::with_capacity(4 + apdu.len());
    b.extend_from_slice(&(apdu.len() as u32).to_be_bytes());
    b.extend_from_slice(apdu);
    b
}

impl Conn {
    fn new(s: TcpStream) -> Self {
        Self {
            s,
            tx: Vec::new(),
            rx: Vec::new(),
            pending: 0,
        }
    }

    /// Write buffered request bytes
    ///
    /// Cancel safe, bytes are only removed from `tx` once written.
    async fn flush(&mut self) -> Result<(), Error> {
        while !self.tx.is_empty() {
            let n = self.s.write(&self.tx).await?;
            if n == 0 {
                return Err(io::Error::from(io::ErrorKind::WriteZero).into());
            }
            self.tx.drain(..n);
        }

        Ok(())
    }

    /// Split a complete response frame (data and status word) from `rx`
    fn take_frame(&mut self) -> Result<Option<Vec<u8>>, Error> {
        let h = match self.rx.get(..4) {
            Some(h) => [h[0], h[1], h[2], h[3]],
            None => return Ok(None),
        };

        let n = u32::from_be_bytes(h) as usize;
        if n > MAX_FRAME_LEN {
            return Err(Error::InvalidLength(n));
        }

        if self.rx.len() < 4 + n + 2 {
            return Ok(None);
        }

        let f = self.rx[4..][..n + 2].to_vec();
        self.rx.drain(..4 + n + 2);

        Ok(Some(f))
    }

    /// Read the response to the oldest pending request
    ///
    /// Cancel safe, received bytes are buffered in `rx` until a full frame
    /// is available.
    async fn read_frame(&mut self) -> Result<Vec<u8>, Error> {
        loop {
            if let Some(f) = self.take_frame()? {
                self.pending = self.pending.saturating_sub(1);
                return Ok(f);
            }

            if self.s.read_buf(&mut self.rx).await? == 0 {
                return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
            }
        }
    }

    /// Discard responses to requests abandoned by earlier exchanges
    async fn resync(&mut self) -> Result<(), Error> {
        self.flush().await?;

        while self.pending > 0 {
            let f = self.read_frame().await?;
            debug!("Discarding stale response: {:02x?}", f);
        }

        Ok(())
    }
}

#[async_trait]
impl Exchange for TransportTcp {
    type Error = Error;
    type AnswerType = Vec<u8>;

    async fn exchange<I>(
        &self,
        command: &APDUCommand<I>,
    ) -> Result<APDUAnswer<Self::AnswerType>, Self::Error>
    where
        I: Deref<Target = [u8]> + Send + Sync,
    {
        let req = command.serialize();
        trace!("TX: {:02x?}", req);

        let mut c = self.c.lock().await;

        // Stale responses are drained under a separate timeout
        if c.pending > 0 {
            let pending = c.pending;
            tokio::time::timeout(self.timeout, c.resync())
                .await
                .map_err(|_| Error::Desynchronised(pending))??;
        }

        c.tx.extend_from_slice(&frame(&req));
        c.pending += 1;

        let resp = tokio::time::timeout(self.timeout, async {
            c.flush().await?;
            c.read_frame().await
        })
        .await??;

        trace!("RX: {:02x?}", resp);

        Ok(APDUAnswer::from_answer(resp)?)
    }
}
