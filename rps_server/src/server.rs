// TCP server and main event loop.
//
// Architecture: thread-per-reader with a central `mpsc` channel.
//
// - **Listener thread** (`TcpListener::accept()` loop): accepts new TCP
//   connections and sends `InternalEvent::NewConnection` to the main thread.
// - **Reader threads** (one per client): call `framing::read_message()` in a
//   loop, deserialize `ClientMessage`, and send `InternalEvent::MessageFrom`
//   to the main thread. On error/EOF/Goodbye, send `InternalEvent::Disconnected`.
// - **Main thread**: owns the `GameServer`, receives events from the channel,
//   and dispatches them one at a time. Because every room mutation happens
//   here, each inbound message is one exclusive state transition per room —
//   two choices racing in from the same room can never double-resolve a
//   round, and rooms never contend with each other.
//
// The main thread is the only writer to client TCP streams (via
// `GameServer`'s send/broadcast helpers). Reader threads only read from
// streams. This avoids concurrent read/write on the same `TcpStream`, which
// is safe on most platforms but fragile.
//
// There is no timer: rounds advance when choices arrive, so the loop's
// `recv_timeout` exists purely to poll the shutdown flag.
//
// Unlike a handshake-first protocol, a connection here is live before it
// joins a room: the writer half is registered at accept time so that even a
// pre-join rejection (blank room name, full room) can be answered.

use std::io::BufReader;
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use log::{info, warn};
use rps_protocol::framing::read_message;
use rps_protocol::message::ClientMessage;
use rps_protocol::types::PlayerId;

use crate::game::GameServer;

/// Events sent from listener/reader threads to the main thread.
enum InternalEvent {
    NewConnection {
        stream: TcpStream,
    },
    MessageFrom {
        player_id: PlayerId,
        message: ClientMessage,
    },
    Disconnected {
        player_id: PlayerId,
    },
}

/// Handle returned by `start_server` to control the running server.
pub struct ServerHandle {
    keep_running: Arc<AtomicBool>,
    thread: Option<thread::JoinHandle<()>>,
}

impl ServerHandle {
    /// Signal the server to stop and wait for it to shut down.
    pub fn stop(self) {
        self.keep_running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread {
            let _ = handle.join();
        }
    }
}

/// Configuration for starting a game server.
pub struct ServerConfig {
    pub port: u16,
    pub max_rounds: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            max_rounds: 5,
        }
    }
}

/// Start the game server on a background thread. Returns a handle for
/// stopping it and the actual bound address (useful when port 0 is used
/// to let the OS pick a free port).
pub fn start_server(config: ServerConfig) -> std::io::Result<(ServerHandle, std::net::SocketAddr)> {
    let listener = TcpListener::bind(format!("127.0.0.1:{}", config.port))?;
    let addr = listener.local_addr()?;
    let keep_running = Arc::new(AtomicBool::new(true));
    let keep_running_clone = keep_running.clone();

    let thread = thread::spawn(move || {
        run_server(listener, config, keep_running_clone);
    });

    Ok((
        ServerHandle {
            keep_running,
            thread: Some(thread),
        },
        addr,
    ))
}

/// Main server loop. Runs until `keep_running` is set to false.
fn run_server(listener: TcpListener, config: ServerConfig, keep_running: Arc<AtomicBool>) {
    let mut game = GameServer::new(config.max_rounds);

    let (tx, rx): (Sender<InternalEvent>, Receiver<InternalEvent>) = mpsc::channel();

    // Set the listener to non-blocking so the accept thread can check
    // keep_running periodically.
    listener.set_nonblocking(true).ok();

    // Listener thread: accepts new connections.
    let keep_running_listener = keep_running.clone();
    let tx_listener = tx.clone();
    thread::spawn(move || {
        while keep_running_listener.load(Ordering::SeqCst) {
            match listener.accept() {
                Ok((stream, _addr)) => {
                    stream.set_nonblocking(false).ok();
                    let _ = tx_listener.send(InternalEvent::NewConnection { stream });
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    thread::sleep(Duration::from_millis(50));
                }
                Err(_) => break,
            }
        }
    });

    // Main event loop. The timeout only exists to poll the shutdown flag.
    while keep_running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                handle_event(&mut game, event, &tx, &keep_running);
                // Drain any additional events that arrived during handling.
                while let Ok(event) = rx.try_recv() {
                    handle_event(&mut game, event, &tx, &keep_running);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    info!("server event loop stopped");
}

/// Dispatch a single event to the game state.
fn handle_event(
    game: &mut GameServer,
    event: InternalEvent,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    match event {
        InternalEvent::NewConnection { stream } => {
            handle_new_connection(game, stream, tx, keep_running);
        }
        InternalEvent::MessageFrom { player_id, message } => {
            handle_message(game, player_id, message);
        }
        InternalEvent::Disconnected { player_id } => {
            game.disconnect(player_id);
        }
    }
}

/// Handle a new TCP connection: register the write half with the game state
/// and spawn a reader thread for the read half.
fn handle_new_connection(
    game: &mut GameServer,
    stream: TcpStream,
    tx: &Sender<InternalEvent>,
    keep_running: &Arc<AtomicBool>,
) {
    let read_stream = match stream.try_clone() {
        Ok(s) => s,
        Err(e) => {
            warn!("dropping connection, stream clone failed: {e}");
            return;
        }
    };

    let player_id = game.register_connection(stream);

    let tx_reader = tx.clone();
    let keep_running_reader = keep_running.clone();
    thread::spawn(move || {
        reader_loop(BufReader::new(read_stream), player_id, tx_reader, keep_running_reader);
    });
}

/// Reader loop for a single client. Runs in its own thread.
fn reader_loop(
    mut reader: BufReader<TcpStream>,
    player_id: PlayerId,
    tx: Sender<InternalEvent>,
    keep_running: Arc<AtomicBool>,
) {
    while keep_running.load(Ordering::SeqCst) {
        match read_message(&mut reader) {
            Ok(bytes) => match serde_json::from_slice::<ClientMessage>(&bytes) {
                Ok(ClientMessage::Goodbye) => {
                    let _ = tx.send(InternalEvent::Disconnected { player_id });
                    break;
                }
                Ok(message) => {
                    let _ = tx.send(InternalEvent::MessageFrom { player_id, message });
                }
                Err(_) => {
                    // Malformed message — disconnect.
                    let _ = tx.send(InternalEvent::Disconnected { player_id });
                    break;
                }
            },
            Err(_) => {
                // Read error or EOF — disconnect.
                let _ = tx.send(InternalEvent::Disconnected { player_id });
                break;
            }
        }
    }
}

/// Route a client message to the matching game operation. `Goodbye` never
/// reaches here — the reader loop turns it into a disconnect.
fn handle_message(game: &mut GameServer, player_id: PlayerId, message: ClientMessage) {
    match message {
        ClientMessage::JoinRoom { room, name } => {
            game.join(player_id, &room, &name);
        }
        ClientMessage::Choice { choice } => {
            game.choice(player_id, &choice);
        }
        ClientMessage::RequestReplay => {
            game.request_replay(player_id);
        }
        ClientMessage::AcceptReplay => {
            game.accept_replay(player_id);
        }
        ClientMessage::RejectReplay => {
            game.reject_replay(player_id);
        }
        ClientMessage::Goodbye => {
            // Handled in the reader loop.
        }
    }
}
