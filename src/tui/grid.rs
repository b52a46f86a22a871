use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::sequencer::pattern;
use crate::shared::{BeatMode, STEPS_PER_MEASURE};

// Label for one half-beat cell, e.g. "H K"
pub fn step_label(mode: BeatMode, step: usize) -> String {
    pattern::hits(mode, step as u64)
        .iter()
        .map(|d| d.short())
        .collect::<Vec<_>>()
        .join(" ")
}

// One measure, current half-beat lit
pub fn draw_step_row(frame: &mut Frame, area: Rect, mode: BeatMode, current: Option<u8>) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, STEPS_PER_MEASURE as u32); STEPS_PER_MEASURE])
        .split(area);

    for (idx, cell) in cols.iter().enumerate() {
        let lit = current == Some(idx as u8);
        let style = if lit {
            Style::default().fg(Color::Black).bg(Color::LightMagenta)
        } else if idx % 2 == 0 {
            Style::default().fg(Color::Gray)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let label = Paragraph::new(step_label(mode, idx))
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::bordered().border_style(style));
        frame.render_widget(label, *cell);
    }
}
