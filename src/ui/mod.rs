//! Terminal dashboard: renderer, keyboard input, and terminal lifecycle.

pub mod terminal;
pub mod view;

use anyhow::{Context, Result};
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::future::ready;
use futures::{Stream, StreamExt};
use ratatui::backend::Backend;
use ratatui::Terminal;
use tracing::debug;

use crate::engine::{InputEvent, Renderer, Snapshot};

/// Draws snapshots onto a ratatui terminal.
pub struct TerminalRenderer<B: Backend> {
    terminal: Terminal<B>,
}

impl<B: Backend> TerminalRenderer<B> {
    pub fn new(terminal: Terminal<B>) -> Self {
        Self { terminal }
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }
}

impl<B: Backend> Renderer for TerminalRenderer<B> {
    fn render(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.terminal
            .draw(|frame| view::draw(frame, snapshot))
            .context("failed to draw dashboard")?;
        Ok(())
    }
}

/// Map a key press to an engine input. `q` and ctrl+c quit.
pub fn map_key(key: KeyEvent) -> Option<InputEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    match key.code {
        KeyCode::Char('q') => Some(InputEvent::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(InputEvent::Quit)
        }
        _ => None,
    }
}

fn map_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) => map_key(key),
        Event::Resize(..) => Some(InputEvent::Resize),
        _ => None,
    }
}

/// Terminal input as engine events. Ends on the first read error.
pub fn input_events() -> impl Stream<Item = InputEvent> + Unpin {
    EventStream::new()
        .take_while(|event| {
            if let Err(e) = event {
                debug!("Terminal input closed: {}", e);
            }
            ready(event.is_ok())
        })
        .filter_map(|event| ready(event.ok().and_then(map_event)))
}
