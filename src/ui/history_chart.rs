use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget},
};

use crate::history::{format_label, UserHistory};

const DATE_FORMAT: &str = "%m-%d %H:%M";

/// WPM over time for the user in the name field
pub struct HistoryChart<'a> {
    history: &'a UserHistory,
}

impl<'a> HistoryChart<'a> {
    pub fn new(history: &'a UserHistory) -> Self {
        Self { history }
    }
}

impl Widget for HistoryChart<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if self.history.username().is_empty() {
            return;
        }

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let block = Block::default()
            .borders(Borders::TOP)
            .title("Your Typing Speed Progress")
            .title_style(bold_style);
        let inner = block.inner(area);
        block.render(area, buf);

        let Some(summary) = self.history.summary() else {
            Paragraph::new(Span::styled(
                "No completed tests yet",
                Style::default().add_modifier(Modifier::ITALIC | Modifier::DIM),
            ))
            .alignment(Alignment::Center)
            .render(inner, buf);
            return;
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        Paragraph::new(Span::styled(
            format!(
                "{} tests   best {}   latest {}   avg {:.1}   {:.2} sd",
                summary.tests,
                summary.best_wpm,
                summary.latest_wpm,
                summary.mean_wpm,
                summary.std_dev
            ),
            bold_style,
        ))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

        let bounds = self.history.chart_bounds();
        let tuples: Vec<(f64, f64)> = self.history.points().into_iter().map(Into::into).collect();

        let datasets = vec![
            Dataset::default()
                .marker(Marker::Braille)
                .style(Style::default().fg(Color::Magenta))
                .graph_type(GraphType::Line)
                .data(&tuples),
            Dataset::default()
                .marker(Marker::Dot)
                .style(Style::default().fg(Color::Cyan))
                .graph_type(GraphType::Scatter)
                .data(&tuples),
        ];

        let first = self
            .history
            .first_date()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();
        let last = self
            .history
            .last_date()
            .map(|d| d.format(DATE_FORMAT).to_string())
            .unwrap_or_default();

        Chart::new(datasets)
            .x_axis(
                Axis::default()
                    .title("date")
                    .bounds([0.0, bounds.x_max])
                    .labels(vec![
                        Span::styled(first, bold_style),
                        Span::styled(last, bold_style),
                    ]),
            )
            .y_axis(
                Axis::default()
                    .title("wpm")
                    .bounds([0.0, bounds.y_max])
                    .labels(vec![
                        Span::styled("0", bold_style),
                        Span::styled(format_label(bounds.y_max), bold_style),
                    ]),
            )
            .render(chunks[1], buf);
    }
}
