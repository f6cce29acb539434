//! Interactive chat view.
//!
//! One task drives everything through a `tokio::select!` loop: inbound
//! socket events, the racing history fetch, terminal input, the typing
//! debounce deadline, and the client heartbeat. All room state lives in
//! the [`RoomSession`]; this module only routes between it, the terminal
//! and the socket.

pub mod compose;
mod ui;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use ratatui::DefaultTerminal;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time;

use crate::api::{self, ApiClient};
use crate::models::{Message, WireMessage};
use crate::room::compose::{TypingDebounce, TypingSignal};
use crate::room::{OutboundComposer, RoomSession};
use crate::socket::ChatSocket;
use compose::ComposeState;

/// Client heartbeat cadence on the live channel.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// State the renderer reads each frame.
pub struct ChatApp {
    pub session: RoomSession,
    pub compose: ComposeState,
    pub is_online: bool,
    /// True while the history fetch is outstanding.
    pub history_pending: bool,
    pub status_message: Option<String>,
    pub status_is_error: bool,
    should_exit: bool,
}

impl ChatApp {
    fn new(session: RoomSession) -> Self {
        Self {
            session,
            compose: ComposeState::default(),
            is_online: true,
            history_pending: true,
            status_message: None,
            status_is_error: false,
            should_exit: false,
        }
    }

    fn report_error(&mut self, msg: String) {
        self.status_message = Some(msg);
        self.status_is_error = true;
    }
}

/// Join a room and run the interactive view until the user leaves.
pub async fn run(
    client: &ApiClient,
    room_id: &str,
    user_id: &str,
    username: &str,
    password: Option<&str>,
) -> Result<()> {
    // Connect and join before taking over the terminal, so connection
    // errors print normally.
    let mut socket = ChatSocket::connect(client.http(), client.base_url()).await?;
    socket.join(room_id, user_id).await?;

    // History races the live channel; the session buffers until it lands.
    let history = spawn_history_fetch(client, room_id, user_id, password);

    let session = RoomSession::new(room_id, user_id, username);

    let mut terminal = ratatui::init();
    let result = run_app(&mut terminal, socket, session, history).await;
    ratatui::restore();
    result
}

fn spawn_history_fetch(
    client: &ApiClient,
    room_id: &str,
    user_id: &str,
    password: Option<&str>,
) -> JoinHandle<Result<Vec<WireMessage>>> {
    let client = client.clone();
    let room_id = room_id.to_string();
    let user_id = user_id.to_string();
    let password = password.map(String::from);
    tokio::spawn(async move {
        api::fetch_history(&client, &room_id, &user_id, password.as_deref()).await
    })
}

async fn run_app(
    terminal: &mut DefaultTerminal,
    mut socket: ChatSocket,
    session: RoomSession,
    mut history: JoinHandle<Result<Vec<WireMessage>>>,
) -> Result<()> {
    let composer = OutboundComposer::new(&session.room_id, &session.local_user_id);
    let mut typing = TypingDebounce::new();
    let mut app = ChatApp::new(session);
    let mut input = EventStream::new();

    let mut heartbeat = time::interval(HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // skip first immediate tick

    while !app.should_exit {
        terminal.draw(|frame| ui::render(frame, &app))?;

        let typing_deadline = typing.deadline();

        tokio::select! {
            inbound = socket.recv_event(), if app.is_online => {
                match inbound {
                    Ok(Some(event)) => app.session.handle_event(event),
                    Ok(None) => {
                        app.is_online = false;
                        app.session.transport_lost();
                        app.report_error("Connection lost. Press Esc to exit.".to_string());
                    }
                    Err(e) => {
                        app.is_online = false;
                        app.session.transport_lost();
                        app.report_error(format!("Connection error: {e:#}"));
                    }
                }
            }
            joined = &mut history, if app.history_pending => {
                app.history_pending = false;
                match joined {
                    Ok(Ok(wire)) => {
                        let messages = wire
                            .into_iter()
                            .map(|w| Message::from_wire(w, &app.session.local_user_id))
                            .collect();
                        app.session.complete_history(messages);
                    }
                    Ok(Err(e)) => {
                        // Live events still flow; render from an empty history.
                        app.session.complete_history(Vec::new());
                        app.report_error(format!("History unavailable: {e:#}"));
                    }
                    Err(e) => {
                        app.session.complete_history(Vec::new());
                        app.report_error(format!("History task failed: {e}"));
                    }
                }
            }
            maybe_event = input.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        handle_key(key, &mut app, &mut socket, &composer, &mut typing).await?;
                    }
                    Some(Ok(Event::Resize(_, _))) => {
                        // Redrawn on the next loop pass.
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e).context("Terminal event error"),
                    None => app.should_exit = true,
                }
            }
            _ = sleep_until_opt(typing_deadline) => {
                if typing.poll(Instant::now()) == Some(false) && app.is_online {
                    let signal = typing_signal(&app, false);
                    socket.send_typing(&signal).await?;
                }
            }
            _ = heartbeat.tick(), if app.is_online => {
                socket.send_heartbeat().await?;
            }
        }
    }

    if app.is_online {
        // Withdraw cleanly so the room's presence updates right away.
        let _ = socket
            .leave(&app.session.room_id, &app.session.local_user_id)
            .await;
    }
    history.abort();

    Ok(())
}

/// Sleep until the deadline, or forever when there is none.
async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

fn typing_signal(app: &ChatApp, is_typing: bool) -> TypingSignal {
    TypingSignal {
        room: app.session.room_id.clone(),
        user_id: app.session.local_user_id.clone(),
        is_typing,
    }
}

async fn handle_key(
    key: KeyEvent,
    app: &mut ChatApp,
    socket: &mut ChatSocket,
    composer: &OutboundComposer,
    typing: &mut TypingDebounce,
) -> Result<()> {
    match key.code {
        KeyCode::Esc => app.should_exit = true,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_exit = true;
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.compose.clear();
        }
        KeyCode::Enter => {
            let Some(text) = app.compose.take() else {
                return Ok(());
            };
            match composer.compose(&text, None) {
                Ok(Some(envelope)) => {
                    if app.is_online {
                        socket.send_message(&envelope).await?;
                        // Sending supersedes any pending typing:false.
                        if typing.cancel() == Some(false) {
                            let signal = typing_signal(app, false);
                            socket.send_typing(&signal).await?;
                        }
                    } else {
                        app.report_error("Offline, message not sent".to_string());
                    }
                }
                Ok(None) => {}
                Err(e) => app.report_error(e.to_string()),
            }
        }
        KeyCode::Backspace => app.compose.backspace(),
        KeyCode::Left => app.compose.move_left(),
        KeyCode::Right => app.compose.move_right(),
        KeyCode::Home => app.compose.move_home(),
        KeyCode::End => app.compose.move_end(),
        KeyCode::Char(c) => {
            if !app.status_is_error {
                app.status_message = None;
            }
            app.compose.insert_char(c);
            if app.is_online && typing.keystroke(Instant::now()) == Some(true) {
                let signal = typing_signal(app, true);
                socket.send_typing(&signal).await?;
            }
        }
        _ => {}
    }
    Ok(())
}
