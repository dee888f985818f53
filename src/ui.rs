use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::engine::Snapshot;
use crate::input::SLOT_COUNT;

const SIDE_PANEL_WIDTH: u16 = 26;
const SLOT_ROWS: u16 = 2;

impl Widget for &Snapshot {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.time_up || self.finished {
            render_game_over(self, area, buf);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),
                Constraint::Length(SLOT_ROWS + 2),
                Constraint::Length(1),
            ])
            .split(area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(30), Constraint::Length(SIDE_PANEL_WIDTH)])
            .split(chunks[0]);

        render_playfield(self, columns[0], buf);
        render_side_panel(self, columns[1], buf);
        render_slots(self, chunks[1], buf);
        render_status_line(self, chunks[2], buf);
    }
}

fn render_playfield(snap: &Snapshot, area: Rect, buf: &mut Buffer) {
    let title = if snap.celebrating {
        " Sentence complete! ".to_string()
    } else {
        format!(" level {} ", snap.level.number())
    };
    let field = Block::default().borders(Borders::ALL).title(title);
    let inner = field.inner(area);
    field.render(area, buf);

    let block_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    // Painted top to bottom so lower (closer to landing) blocks win overlaps.
    for view in snap.blocks.iter().sorted_by_key(|b| b.y) {
        draw_clipped(&view.text, view.x, view.y, inner, block_style, buf);
    }

    if let Some(item) = &snap.item {
        let text = format!("[{}] {}", item.token, item.label);
        let style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        draw_clipped(&text, item.x, item.y, inner, style, buf);
    }
}

/// Places `text` at play-field coordinates, dropped entirely when it does
/// not fit inside the inner rect.
fn draw_clipped(text: &str, x: u16, y: u16, inner: Rect, style: Style, buf: &mut Buffer) {
    if y >= inner.height {
        return;
    }
    let width = text.width() as u16;
    if x >= inner.width {
        return;
    }
    let x = x.min(inner.width.saturating_sub(width));
    buf.set_string(inner.x + x, inner.y + y, text, style);
}

fn render_side_panel(snap: &Snapshot, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);

    let score = &snap.score;
    let multiplier_note = if score.multiplier > 1 {
        format!(" (x{})", score.multiplier)
    } else {
        String::new()
    };

    let mut lines = vec![
        Line::from(Span::styled(format!("time  {}", snap.clock), bold)),
        Line::from(Span::styled(format!("score {}", score.total), bold)),
        Line::from(Span::styled(
            format!("  target {}{}", score.target, multiplier_note),
            dim,
        )),
        Line::from(Span::styled(format!("  words  {}", score.words), dim)),
        Line::from(Span::styled(format!("  level  {}", score.level_bonus), dim)),
        Line::from(""),
        Line::from(format!("matched  {}/{}", snap.matches, SLOT_COUNT)),
        Line::from(format!("released {}/{}", snap.words_released, SLOT_COUNT)),
        Line::from(format!("rounds   {}", snap.rounds_completed)),
    ];

    if snap.item.is_some() || !snap.item_buffer.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("item key [{}]", snap.item_buffer),
            Style::default().fg(Color::Yellow),
        )));
    }

    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" game "))
        .wrap(Wrap { trim: true });
    panel.render(area, buf);
}

fn render_slots(snap: &Snapshot, area: Rect, buf: &mut Buffer) {
    let per_row = SLOT_COUNT / SLOT_ROWS as usize;
    let focused_style = Style::default()
        .fg(Color::Green)
        .add_modifier(Modifier::BOLD);

    let mut rows = Vec::with_capacity(SLOT_ROWS as usize);
    for (row, slots) in snap.slots.chunks(per_row).enumerate() {
        let mut spans = Vec::new();
        for (col, slot) in slots.iter().enumerate() {
            let index = row * per_row + col;
            let marker = if index == snap.focus { '›' } else { ' ' };
            let cell = format!("{}{}[{:<12}]", marker, index + 1, slot);
            let style = if index == snap.focus {
                focused_style
            } else {
                Style::default()
            };
            spans.push(Span::styled(cell, style));
            spans.push(Span::raw(" "));
        }
        rows.push(Line::from(spans));
    }

    let widget = Paragraph::new(rows)
        .block(Block::default().borders(Borders::ALL).title(" type each word into its slot "));
    widget.render(area, buf);
}

fn render_status_line(snap: &Snapshot, area: Rect, buf: &mut Buffer) {
    let line = match &snap.notice {
        Some(notice) => Span::styled(
            notice.clone(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled(
            "(tab) next slot  (enter) submit  (esc) quit",
            Style::default().add_modifier(Modifier::ITALIC),
        ),
    };
    Paragraph::new(line)
        .alignment(Alignment::Center)
        .render(area, buf);
}

fn render_game_over(snap: &Snapshot, area: Rect, buf: &mut Buffer) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let banner = if snap.time_up { "TIME UP!" } else { "FINISHED" };

    let lines = vec![
        Line::from(Span::styled(
            banner,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("final score {}", snap.score.total),
            bold,
        )),
        Line::from(Span::styled(
            format!(
                "rounds {}   target {}   words {}   time bonus {}   level bonus {}",
                snap.rounds_completed,
                snap.score.target,
                snap.score.words,
                snap.score.time_bonus,
                snap.score.level_bonus
            ),
            Style::default().add_modifier(Modifier::DIM),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "(r)estart / (q)uit",
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Length(lines.len() as u16),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}
