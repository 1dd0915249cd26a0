//! Dashboard layout.
//!
//! ```text
//! ┌──────────────── Gitter ────────────────┐
//! │Config                                  │
//! │Repo     : https://...                  │
//! │...                                     │
//! │Stats                                   │
//! │...                                     │
//! │Recent Errors                           │
//! │3s ago: repository not found            │
//! │────────────────────────────────────────│
//! │⣾ Succeeded: 12                         │
//! │⣾ Failed: 1                             │
//! └────────────────────────────────────────┘
//! ```

use std::borrow::Cow;
use std::time::Duration;

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::engine::Snapshot;

/// Longest error reason shown before truncation.
pub const MAX_REASON_CHARS: usize = 50;

const TITLE: Color = Color::Rgb(0x33, 0xB5, 0xE5);
const SECTION: Color = Color::Rgb(0xBB, 0xBB, 0x00);
const ERROR_TITLE: Color = Color::Rgb(0xFF, 0x00, 0x00);
const ERROR_TEXT: Color = Color::Rgb(0xFF, 0x66, 0x66);
const MUTED: Color = Color::DarkGray;

/// Cut reasons longer than [`MAX_REASON_CHARS`] to 47 chars plus `...`.
pub fn truncate_reason(reason: &str) -> Cow<'_, str> {
    if reason.chars().count() <= MAX_REASON_CHARS {
        return Cow::Borrowed(reason);
    }
    let mut cut: String = reason.chars().take(MAX_REASON_CHARS - 3).collect();
    cut.push_str("...");
    Cow::Owned(cut)
}

fn fmt_duration(d: Duration) -> String {
    humantime::format_duration(d).to_string()
}

fn section(title: &'static str, color: Color) -> Line<'static> {
    Line::from(Span::styled(
        title,
        Style::default()
            .fg(color)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    ))
}

/// Error rows beyond `max_error_rows` would be clipped anyway and are skipped.
fn body_lines(snapshot: &Snapshot, max_error_rows: usize) -> Vec<Line<'static>> {
    let mut interval = vec![Span::raw(format!(
        "Interval : {}",
        fmt_duration(snapshot.interval)
    ))];
    if snapshot.interval < snapshot.timeout {
        interval.push(Span::styled(
            "  (attempts may overlap)",
            Style::default().fg(MUTED),
        ));
    }

    let mut lines = vec![
        section("Config", SECTION),
        Line::from(format!("Repo     : {}", snapshot.target)),
        Line::from(interval),
        Line::from(format!("Timeout  : {}", fmt_duration(snapshot.timeout))),
        Line::from(format!(
            "History  : last {} errors",
            snapshot.history_capacity
        )),
        Line::default(),
        section("Stats", SECTION),
        Line::from(format!("Duration : {}", fmt_duration(snapshot.elapsed))),
        Line::from(format!(
            "Tasks    : {} (max: {})",
            snapshot.tasks, snapshot.max_tasks
        )),
        Line::from(format!(
            "Memory   : {} KB (max: {} KB)",
            snapshot.memory_kb, snapshot.max_memory_kb
        )),
    ];

    if !snapshot.recent_errors.is_empty() {
        lines.push(Line::default());
        lines.push(section("Recent Errors", ERROR_TITLE));
        for error in snapshot.recent_errors.iter().take(max_error_rows) {
            lines.push(Line::from(vec![
                Span::raw(format!("{} ago: ", fmt_duration(error.age))),
                Span::styled(
                    truncate_reason(&error.reason).into_owned(),
                    Style::default().fg(ERROR_TEXT),
                ),
            ]));
        }
        lines.push(Line::from(Span::styled(
            format!("Total errors: {}", snapshot.total_errors),
            Style::default().fg(MUTED),
        )));
    }

    lines
}

fn result_lines(snapshot: &Snapshot) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled(snapshot.spinner, Style::default().fg(Color::Green)),
            Span::raw(format!("Succeeded: {}", snapshot.succeeded)),
        ]),
        Line::from(vec![
            Span::styled(snapshot.spinner, Style::default().fg(Color::Red)),
            Span::raw(format!("Failed: {}", snapshot.failed)),
        ]),
    ]
}

/// Draw the dashboard into the top-left of the frame, no wider than
/// `snapshot.width`.
pub fn draw(frame: &mut Frame, snapshot: &Snapshot) {
    let area = frame.area();
    let body = body_lines(snapshot, usize::from(area.height));
    let results = result_lines(snapshot);

    // Body, a separator, two result lines, and the outer border.
    let wanted_height = u16::try_from(body.len() + results.len() + 3).unwrap_or(u16::MAX);
    let outer = Rect {
        x: area.x,
        y: area.y,
        width: snapshot.width.min(area.width),
        height: wanted_height.min(area.height),
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            "Gitter",
            Style::default().fg(TITLE).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Center);
    let inner = block.inner(outer);
    frame.render_widget(block, outer);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(inner);

    frame.render_widget(Paragraph::new(Text::from(body)), chunks[0]);
    frame.render_widget(
        Paragraph::new(Text::from(results)).block(Block::default().borders(Borders::TOP)),
        chunks[1],
    );
}
