pub mod history_chart;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, NoticeLevel};
use crate::session::SessionState;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim_bold() -> Style {
    bold().add_modifier(Modifier::DIM)
}

/// Target text with the typed prefix coloured against it
pub fn prompt_spans(target: &str, input: &str) -> Vec<Span<'static>> {
    let green_bold_style = bold().fg(Color::Green);
    let red_bold_style = bold().fg(Color::Red);
    let underlined_dim_bold_style = dim_bold().add_modifier(Modifier::UNDERLINED);

    let expected: Vec<char> = target.chars().collect();
    let typed: Vec<char> = input.chars().collect();

    let mut spans = typed
        .iter()
        .enumerate()
        .map(|(idx, &c)| match expected.get(idx) {
            Some(&e) if e == c => Span::styled(e.to_string(), green_bold_style),
            _ => Span::styled(
                match c {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
        })
        .collect::<Vec<Span>>();

    if typed.len() < expected.len() {
        spans.push(Span::styled(
            expected[typed.len()].to_string(),
            underlined_dim_bold_style,
        ));
        let rest: String = expected[typed.len() + 1..].iter().collect();
        spans.push(Span::styled(rest, dim_bold()));
    }

    spans
}

fn legend(state: SessionState) -> &'static str {
    match state {
        SessionState::Idle => "type your name / (enter) start / (esc)ape",
        SessionState::InProgress => "(enter) submit / (backspace) delete / (esc)ape",
        SessionState::Completed | SessionState::Failed => "(n)ext / (esc)ape",
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let session = self.session();
        let state = session.state();

        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let prompt_lines = if state == SessionState::Idle {
            1
        } else {
            ((session.target_text.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1)
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1),                // title
                Constraint::Length(3),                // name field
                Constraint::Length(1),                // notice
                Constraint::Length(1),                // padding
                Constraint::Length(1),                // "type this"
                Constraint::Length(prompt_lines + 1), // prompt
                Constraint::Length(1),                // live metric
                Constraint::Min(3),                   // history
                Constraint::Length(1),                // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "Typing Speed Test",
            bold().fg(Color::Cyan),
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        let name_style = if state == SessionState::Idle {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().add_modifier(Modifier::DIM)
        };
        let name_text = if self.username().is_empty() {
            Span::styled("enter your name", Style::default().add_modifier(Modifier::DIM))
        } else {
            Span::styled(self.username().to_string(), bold())
        };
        Paragraph::new(Line::from(name_text))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Name")
                    .border_style(name_style),
            )
            .render(chunks[1], buf);

        if let Some(notice) = self.notice() {
            let style = match notice.level {
                NoticeLevel::Info => Style::default().add_modifier(Modifier::ITALIC),
                NoticeLevel::Success => bold().fg(Color::Green),
                NoticeLevel::Warning => bold().fg(Color::Yellow),
                NoticeLevel::Error => bold().fg(Color::Red),
            };
            Paragraph::new(Span::styled(notice.message.clone(), style))
                .alignment(Alignment::Center)
                .render(chunks[2], buf);
        }

        if state == SessionState::Idle {
            Paragraph::new(Span::styled(
                "press enter to start the test",
                dim_bold(),
            ))
            .alignment(Alignment::Center)
            .render(chunks[5], buf);
        } else {
            Paragraph::new(Span::styled(
                "Type this:",
                Style::default().add_modifier(Modifier::ITALIC),
            ))
            .render(chunks[4], buf);

            let widget = Paragraph::new(Line::from(prompt_spans(
                &session.target_text,
                &session.input_text,
            )))
            .alignment(if prompt_lines == 1 {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: true });
            widget.render(chunks[5], buf);
        }

        if let Some(metrics) = self.metrics() {
            let label = match state {
                SessionState::Completed => "final",
                SessionState::Failed => "not saved",
                _ => "live",
            };
            Paragraph::new(Span::styled(
                format!(
                    "{} wpm   {:.1}s   ({label})",
                    metrics.wpm, metrics.elapsed_secs
                ),
                bold().fg(Color::Magenta),
            ))
            .alignment(Alignment::Center)
            .render(chunks[6], buf);
        }

        history_chart::HistoryChart::new(self.history()).render(chunks[7], buf);

        Paragraph::new(Span::styled(
            legend(state),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .render(chunks[8], buf);
    }
}
