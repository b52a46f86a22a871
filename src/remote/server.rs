use std::io::ErrorKind;
use std::net::{SocketAddr, UdpSocket};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel::{Receiver, Sender, TryRecvError};

// How often the receive loop looks at its stop channel
const READ_TIMEOUT: Duration = Duration::from_millis(100);

const RECV_BUFFER_SIZE: usize = 1024;

/// Turns one command line into the reply datagram.
pub trait CommandHandler: Send + Sync {
    fn handle(&self, line: &str) -> String;
}

/// UDP command endpoint. One datagram in, one reply back to the sender.
pub struct RemoteServer {
    local_addr: SocketAddr,
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl RemoteServer {
    pub fn bind(addr: &str, handler: Arc<dyn CommandHandler>) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind(addr).with_context(|| format!("binding command socket {addr}"))?;
        socket.set_read_timeout(Some(READ_TIMEOUT))?;
        let local_addr = socket.local_addr()?;

        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let handle = std::thread::Builder::new()
            .name("remote-commands".into())
            .spawn(move || serve(socket, handler, stop_rx))?;
        log::info!("listening for commands on udp {local_addr}");

        Ok(Self {
            local_addr,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stop(&mut self) {
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("command server thread panicked");
            }
        }
    }
}

impl Drop for RemoteServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn serve(socket: UdpSocket, handler: Arc<dyn CommandHandler>, stop_rx: Receiver<()>) {
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];
    while let Err(TryRecvError::Empty) = stop_rx.try_recv() {
        let (len, peer) = match socket.recv_from(&mut buf) {
            Ok(received) => received,
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => continue,
            Err(e) => {
                log::warn!("command socket receive failed: {e}");
                continue;
            }
        };
        let line = String::from_utf8_lossy(&buf[..len]);
        let reply = handler.handle(&line);
        if let Err(e) = socket.send_to(reply.as_bytes(), peer) {
            log::warn!("could not reply to {peer}: {e}");
        }
    }
    log::info!("command server stopped");
}
