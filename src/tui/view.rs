use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use ratatui::Frame;

use crate::shared::{Drum, StatusView};
use crate::stats::format_summary;
use super::grid::draw_step_row;
use super::mode::TuiState;

const HELP: &str =
    "up/down volume  m mode  1 kick  2 hat  3 snare  x/y/z shake  [ ] tempo  q quit";

pub fn render(frame: &mut Frame, area: Rect, status: &StatusView, ts: &TuiState) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(7), // lcd screen
            Constraint::Length(3), // step row
            Constraint::Length(3), // pads
            Constraint::Min(1),    // help
        ])
        .split(area);

    draw_screen(frame, sections[0], status, ts);
    draw_step_row(frame, sections[1], status.mode, status.step);
    draw_pads(frame, sections[2], ts.flashing());
    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(Color::DarkGray)),
        sections[3],
    );
}

fn draw_screen(frame: &mut Frame, area: Rect, status: &StatusView, ts: &TuiState) {
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let mut flags = Vec::new();
    if status.silent {
        flags.push(Span::styled(" NO AUDIO ", Style::default().fg(Color::Black).bg(Color::Red)));
    }
    if status.locked_out {
        flags.push(Span::styled(" REMOTE LOCK ", Style::default().fg(Color::Black).bg(Color::Yellow)));
    }

    let lines = vec![
        Line::from(vec![
            Span::styled(format!("{:<7}", status.mode.label()), bold),
            Span::raw(format!("{:>4} bpm   ", status.tempo)),
            Span::raw(format!("vol {:>3}", status.volume)),
        ]),
        Line::from(format!(
            "voices {}/{}",
            status.active_voices, status.voice_capacity
        )),
        Line::from(flags),
        Line::from(format_summary("Audio", ts.audio_stats)),
        Line::from(format_summary("Controls", ts.control_stats)),
    ];
    let screen = Paragraph::new(lines).block(Block::bordered().title(" beatbox "));
    frame.render_widget(screen, area);
}

fn draw_pads(frame: &mut Frame, area: Rect, flashing: Option<Drum>) {
    let pads = [(Drum::Kick, "1 kick"), (Drum::HiHat, "2 hat"), (Drum::Snare, "3 snare")];
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3); 3])
        .split(area);
    for ((drum, label), cell) in pads.into_iter().zip(cols.iter()) {
        let style = if flashing == Some(drum) {
            Style::default().fg(Color::LightMagenta).bg(Color::Magenta)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let pad = Paragraph::new(label).style(style).block(Block::bordered().border_style(style));
        frame.render_widget(pad, *cell);
    }
}
