// TCP client for talking to the game server.
//
// Provides a non-blocking interface for the calling thread to communicate
// with the server. Architecture:
// - `connect()` performs the TCP connect on the calling thread, then spawns
//   a background reader thread.
// - The reader thread calls `read_message()` in a loop, deserializes
//   `ServerMessage`, and pushes into an `mpsc` channel.
// - The calling thread holds a `BufWriter<TcpStream>` for sending.
// - `poll()` drains the inbox non-blocking; `wait_for()` polls with a
//   deadline, which is what the integration tests use.
//
// This separation ensures the caller never blocks on network I/O. There is
// no handshake: the connection is live immediately and `join()` is an
// ordinary message like any other.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use rps_protocol::framing::{read_message, write_message};
use rps_protocol::message::{ClientMessage, ServerMessage};

/// Blocking-connect, polled-receive client for the duel server.
pub struct NetClient {
    writer: BufWriter<TcpStream>,
    inbox: Receiver<ServerMessage>,
    _reader_thread: Option<JoinHandle<()>>,
}

impl NetClient {
    /// Connect to a server and spawn the reader thread.
    pub fn connect(addr: impl std::net::ToSocketAddrs) -> std::io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        let reader_stream = stream.try_clone()?;
        let writer = BufWriter::new(stream);

        let (tx, rx) = mpsc::channel();
        let reader_thread = thread::spawn(move || {
            reader_loop(BufReader::new(reader_stream), tx);
        });

        Ok(Self {
            writer,
            inbox: rx,
            _reader_thread: Some(reader_thread),
        })
    }

    /// Join a room under a display name.
    pub fn join(&mut self, room: &str, name: &str) -> Result<(), String> {
        self.send(&ClientMessage::JoinRoom {
            room: room.into(),
            name: name.into(),
        })
    }

    /// Submit this round's choice.
    pub fn send_choice(&mut self, choice: &str) -> Result<(), String> {
        self.send(&ClientMessage::Choice {
            choice: choice.into(),
        })
    }

    pub fn request_replay(&mut self) -> Result<(), String> {
        self.send(&ClientMessage::RequestReplay)
    }

    pub fn accept_replay(&mut self) -> Result<(), String> {
        self.send(&ClientMessage::AcceptReplay)
    }

    pub fn reject_replay(&mut self) -> Result<(), String> {
        self.send(&ClientMessage::RejectReplay)
    }

    /// Send Goodbye; the server treats it as a disconnect.
    pub fn disconnect(&mut self) {
        let _ = self.send(&ClientMessage::Goodbye);
    }

    /// Drain all queued server messages (non-blocking).
    pub fn poll(&self) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.inbox.try_recv() {
            messages.push(msg);
        }
        messages
    }

    /// Poll until a message satisfies `pred` or the timeout elapses.
    /// Returns the matching message; earlier non-matching messages are
    /// discarded.
    pub fn wait_for(
        &self,
        timeout: Duration,
        mut pred: impl FnMut(&ServerMessage) -> bool,
    ) -> Option<ServerMessage> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.checked_duration_since(Instant::now())?;
            match self.inbox.recv_timeout(remaining) {
                Ok(msg) if pred(&msg) => return Some(msg),
                Ok(_) => continue,
                Err(_) => return None,
            }
        }
    }

    fn send(&mut self, msg: &ClientMessage) -> Result<(), String> {
        let json = serde_json::to_vec(msg).map_err(|e| e.to_string())?;
        write_message(&mut self.writer, &json).map_err(|e| e.to_string())
    }
}

/// Reader thread: read framed messages in a loop, push to channel.
fn reader_loop(mut reader: BufReader<TcpStream>, tx: mpsc::Sender<ServerMessage>) {
    while let Ok(bytes) = read_message(&mut reader) {
        match serde_json::from_slice::<ServerMessage>(&bytes) {
            Ok(msg) => {
                if tx.send(msg).is_err() {
                    break; // Owner dropped the receiver
                }
            }
            Err(_) => break, // Malformed message
        }
    }
}
