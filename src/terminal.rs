use std::io::{self, Stderr};
use std::sync::Arc;

use anyhow::Result;
use crossterm::{
    cursor,
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::task::JoinHandle;

use crate::chat_client::{ChatClient, HttpChatClient, RelayOutcome, TransportError};
use crate::chat_view::{ChatView, HistoryFraming, KeyAction};
use crate::ui;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

type PendingReply = JoinHandle<Result<RelayOutcome, TransportError>>;

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen)?;
    let terminal = Terminal::new(CrosstermBackend::new(io::stderr()))?;
    Ok(terminal)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), LeaveAlternateScreen, cursor::Show)?;
    disable_raw_mode()?;
    Ok(())
}

/// Install panic hook to restore terminal on panic
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        original_hook(panic_info);
    }));
}

fn draw(terminal: &mut Tui, view: &ChatView) -> Result<()> {
    terminal.draw(|frame| ui::render(view, frame))?;
    Ok(())
}

async fn wait_reply(pending: &mut Option<PendingReply>) -> Result<RelayOutcome, TransportError> {
    match pending.as_mut() {
        Some(handle) => handle
            .await
            .unwrap_or_else(|e| Err(TransportError::Unavailable(e.to_string()))),
        None => std::future::pending().await,
    }
}

pub async fn run(server_url: &str, framing: HistoryFraming) -> Result<()> {
    let client = Arc::new(HttpChatClient::new(server_url)?);
    let mut view = ChatView::with_framing(framing);
    let mut events = EventStream::new();
    let mut pending: Option<PendingReply> = None;

    install_panic_hook();
    let mut terminal = init()?;
    let result = async {
        draw(&mut terminal, &view)?;
        loop {
            tokio::select! {
                outcome = wait_reply(&mut pending) => {
                    pending = None;
                    view.finish_submit(outcome);
                }
                event = events.next() => {
                    let Some(event) = event else { break };
                    let key = match event? {
                        Event::Key(key) if key.kind == KeyEventKind::Press => key,
                        Event::Resize(_, _) => {
                            draw(&mut terminal, &view)?;
                            continue;
                        }
                        _ => continue,
                    };
                    match view.handle_key(key) {
                        KeyAction::Quit => break,
                        KeyAction::Submit => {
                            if let Some(request) = view.begin_submit() {
                                let client = client.clone();
                                pending = Some(tokio::spawn(async move {
                                    client.send(&request).await
                                }));
                            }
                        }
                        KeyAction::Edited | KeyAction::Ignored => {}
                    }
                }
            }
            draw(&mut terminal, &view)?;
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;
    restore()?;
    result
}
