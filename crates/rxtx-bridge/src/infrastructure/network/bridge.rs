//! TCP-to-serial forwarding on the host.
//!
//! # How forwarding works (for beginners)
//!
//! The bridge listens on the configured TCP port and serves one client at a
//! time; further clients wait in the listen backlog until the current one
//! disconnects.
//!
//! - **client → serial**: the client socket is non-blocking, so each
//!   [`pump`](Bridge::pump) reads whatever has arrived and writes it to the
//!   serial device.
//! - **serial → client**: reading a serial device blocks, so a reader thread
//!   owns a clone of the device handle and pushes bytes into a bounded
//!   `tokio::sync::mpsc` channel.  When the channel is full the thread waits,
//!   much like a UART whose receive buffer is full.  `pump` drains the
//!   channel into the client only while a client is connected.
//!
//! Line settings (baud rate, software-UART pins) belong to the device's UART
//! driver; on a host they are logged and the device file is used as
//! configured by the OS.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Write};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, info, trace, warn};

use crate::application::ports::{Bridge, SerialParams};

/// Bytes buffered from the serial side while no client drains them.
const SERIAL_BUFFER: usize = 4096;
/// Most bytes held for a client that is not keeping up.  Past this the
/// serial side backs up into the channel and then the reader thread.
const OUTBOUND_LIMIT: usize = 4096;
const READ_CHUNK: usize = 512;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to bind bridge listener on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open serial device {path}: {source}")]
    Serial {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to spawn serial reader thread: {0}")]
    Thread(#[source] std::io::Error),
}

/// [`Bridge`] between a TCP listener and a serial device file.
pub struct TcpSerialBridge {
    bind_address: IpAddr,
    serial_path: Option<PathBuf>,
    session: Option<Session>,
}

struct Session {
    listener: TcpListener,
    local_addr: SocketAddr,
    client: Option<TcpStream>,
    serial_out: Option<File>,
    serial_in: Option<mpsc::Receiver<u8>>,
    outbound: Vec<u8>,
}

impl TcpSerialBridge {
    /// Without a serial path, bytes from clients are logged and dropped.
    pub fn new(bind_address: IpAddr, serial_path: Option<PathBuf>) -> Self {
        Self {
            bind_address,
            serial_path,
            session: None,
        }
    }

    /// Address actually bound, while open.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.session.as_ref().map(|s| s.local_addr)
    }

    pub fn has_client(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.client.is_some())
    }

    fn start(&self, serial: &SerialParams, port: u16) -> Result<Session, BridgeError> {
        let addr = SocketAddr::new(self.bind_address, port);
        let bind_err = |source: std::io::Error| BridgeError::Bind { addr, source };
        let listener = TcpListener::bind(addr).map_err(bind_err)?;
        listener.set_nonblocking(true).map_err(bind_err)?;
        let local_addr = listener.local_addr().map_err(bind_err)?;

        let (serial_out, serial_in) = match &self.serial_path {
            Some(path) => {
                let (out, rx) = open_serial(path)?;
                (Some(out), Some(rx))
            }
            None => (None, None),
        };

        info!(
            addr = %local_addr,
            baud = serial.baud_rate,
            link = %serial.link,
            serial = ?self.serial_path,
            "bridge listening"
        );
        Ok(Session {
            listener,
            local_addr,
            client: None,
            serial_out,
            serial_in,
            outbound: Vec::new(),
        })
    }
}

impl Default for TcpSerialBridge {
    fn default() -> Self {
        Self::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), None)
    }
}

fn open_serial(path: &Path) -> Result<(File, mpsc::Receiver<u8>), BridgeError> {
    let serial_err = |source: std::io::Error| BridgeError::Serial {
        path: path.to_path_buf(),
        source,
    };
    let out = OpenOptions::new().read(true).write(true).open(path).map_err(serial_err)?;
    let reader = out.try_clone().map_err(serial_err)?;

    let (tx, rx) = mpsc::channel(SERIAL_BUFFER);
    std::thread::Builder::new()
        .name("rxtx-serial".to_string())
        .spawn(move || read_serial(reader, tx))
        .map_err(BridgeError::Thread)?;
    Ok((out, rx))
}

fn read_serial(mut reader: File, tx: mpsc::Sender<u8>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => {
                debug!("serial device reached end of file");
                return;
            }
            Ok(n) => {
                for &byte in &buf[..n] {
                    if tx.blocking_send(byte).is_err() {
                        return;
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                warn!(error = %e, "serial read failed; reader stopped");
                return;
            }
        }
    }
}

impl Session {
    fn accept(&mut self) {
        if self.client.is_some() {
            return;
        }
        match self.listener.accept() {
            Ok((stream, peer)) => {
                if let Err(e) = stream.set_nonblocking(true) {
                    warn!(%peer, error = %e, "could not make client non-blocking; dropping it");
                    return;
                }
                info!(%peer, "client connected");
                self.client = Some(stream);
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock => {}
            Err(e) => debug!(error = %e, "accept failed"),
        }
    }

    fn disconnect(&mut self, why: &str) {
        if let Some(client) = self.client.take() {
            info!(peer = ?client.peer_addr().ok(), why, "client disconnected");
        }
        self.outbound.clear();
    }

    fn client_to_serial(&mut self) {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let Some(client) = self.client.as_mut() else { return };
            match client.read(&mut buf) {
                Ok(0) => return self.disconnect("closed by peer"),
                Ok(n) => self.write_serial(&buf[..n]),
                Err(e) if e.kind() == ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, "client read failed");
                    return self.disconnect("read error");
                }
            }
        }
    }

    fn write_serial(&mut self, bytes: &[u8]) {
        let Some(out) = self.serial_out.as_mut() else {
            trace!(len = bytes.len(), "no serial device; dropping client bytes");
            return;
        };
        if let Err(e) = out.write_all(bytes).and_then(|()| out.flush()) {
            warn!(error = %e, "serial write failed");
        }
    }

    fn serial_to_client(&mut self) {
        if self.client.is_none() {
            return;
        }
        if let Some(rx) = self.serial_in.as_mut() {
            if !fill_outbound(rx, &mut self.outbound, OUTBOUND_LIMIT) {
                debug!("serial reader finished");
                self.serial_in = None;
            }
        }

        while !self.outbound.is_empty() {
            let Some(client) = self.client.as_mut() else { return };
            match client.write(&self.outbound) {
                Ok(0) => return self.disconnect("write returned zero"),
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    debug!(error = %e, "client write failed");
                    return self.disconnect("write error");
                }
            }
        }
    }
}

/// Moves queued serial bytes into `outbound` until it holds `limit` bytes.
/// Returns `false` once the reader has finished and the channel is empty.
fn fill_outbound(rx: &mut mpsc::Receiver<u8>, outbound: &mut Vec<u8>, limit: usize) -> bool {
    while outbound.len() < limit {
        match rx.try_recv() {
            Ok(byte) => outbound.push(byte),
            Err(TryRecvError::Empty) => break,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
    true
}

impl Bridge for TcpSerialBridge {
    fn open(&mut self, serial: &SerialParams, port: u16) -> bool {
        self.close();
        match self.start(serial, port) {
            Ok(session) => {
                self.session = Some(session);
                true
            }
            Err(e) => {
                warn!(error = %e, "bridge not opened");
                false
            }
        }
    }

    fn pump(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.accept();
        session.client_to_serial();
        session.serial_to_client();
    }

    fn close(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.disconnect("bridge closed");
            info!(addr = %session.local_addr, "bridge closed");
        }
    }
}
