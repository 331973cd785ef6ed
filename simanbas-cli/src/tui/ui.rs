use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{
        Axis, Bar, BarChart, BarGroup, Block, Borders, Cell, Chart, Dataset, GraphType, Paragraph,
        Row, Table, TableState,
    },
};
use simanbas_core::{
    format_metric, needs_review, truncate_text, DifficultyBand, DiscriminationBand, Histogram, Metric,
};
use crate::tui::app::{App, Focus, View};
use crate::tui::theme::Theme;

pub fn render(frame: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = frame.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Percentage(50), Constraint::Min(5), Constraint::Length(1)])
        .split(area);
    render_topbar(frame, app, chunks[0], theme);
    let charts = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(34), Constraint::Percentage(33), Constraint::Percentage(33)])
        .split(chunks[1]);
    let focused = app.focus == Focus::Charts;
    render_histogram(frame, app.distributions.get(Metric::DifficultyIndex), Metric::DifficultyIndex, charts[0], theme.difficulty, focused, theme);
    render_histogram(frame, app.distributions.get(Metric::DiscriminationIndex), Metric::DiscriminationIndex, charts[1], theme.discrimination, focused, theme);
    render_quality_map(frame, &app.points, charts[2], focused, theme);
    render_table(frame, app, chunks[2], theme);
    render_bottombar(frame, app, chunks[3], theme);
    if app.view == View::Help { render_help(frame, area); }
}

fn render_topbar(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let q = &app.quality;
    let line = Line::from(vec![
        Span::styled(" SiManBaS ", Style::default().fg(theme.highlight).add_modifier(Modifier::BOLD)),
        Span::raw(format!("| {} | {} records | {} bins | ", app.filter_desc, q.total, app.bins)),
        Span::styled(format!("review: {}", q.needs_review), Style::default().fg(if q.needs_review > 0 { theme.warning } else { theme.success })),
    ]);
    frame.render_widget(Paragraph::new(line).style(Style::default().bg(theme.bg).fg(theme.fg)), area);
}

fn render_histogram(frame: &mut Frame, hist: &Histogram, metric: Metric, area: Rect, color: Color, focused: bool, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(metric.title())
        .border_style(if focused { Style::default().fg(theme.highlight) } else { Style::default() });
    if hist.is_empty() {
        frame.render_widget(Paragraph::new("No data for the current filter.").block(block), area);
        return;
    }
    let inner_w = area.width.saturating_sub(2) as usize;
    let n = hist.len().max(1);
    let bar_width = (inner_w / n).saturating_sub(1).clamp(1, 12) as u16;
    let bars: Vec<Bar> = hist
        .bins
        .iter()
        .map(|b| {
            // short labels keep narrow bars readable
            let label = if bar_width as usize >= b.label.len() { b.label.clone() } else { format!("{:.2}", b.range_start) };
            Bar::default()
                .value(b.count)
                .label(Line::from(label))
                .style(Style::default().fg(color))
        })
        .collect();
    let chart = BarChart::default()
        .block(block)
        .data(BarGroup::default().bars(&bars))
        .bar_width(bar_width)
        .bar_gap(1)
        .value_style(Style::default().fg(theme.bg).bg(color));
    frame.render_widget(chart, area);
}

/// P-Value on x over [0, 1], D-Index on y over [-1, 1].
fn render_quality_map(frame: &mut Frame, points: &[(f64, f64)], area: Rect, focused: bool, theme: &Theme) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Quality map (P-Value vs D-Index)")
        .border_style(if focused { Style::default().fg(theme.highlight) } else { Style::default() });
    if points.is_empty() {
        frame.render_widget(Paragraph::new("No question has both indices yet.").block(block), area);
        return;
    }
    let dataset = Dataset::default()
        .name("questions")
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Scatter)
        .style(Style::default().fg(theme.scatter))
        .data(points);
    let axis_style = Style::default().fg(theme.fg);
    let chart = Chart::new(vec![dataset])
        .block(block)
        .x_axis(
            Axis::default()
                .title("P-Value")
                .style(axis_style)
                .bounds([0.0, 1.0])
                .labels(vec![Span::raw("0"), Span::raw("0.5"), Span::raw("1")]),
        )
        .y_axis(
            Axis::default()
                .title("D-Index")
                .style(axis_style)
                .bounds([-1.0, 1.0])
                .labels(vec![Span::raw("-1"), Span::raw("0"), Span::raw("1")]),
        );
    frame.render_widget(chart, area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let focused = app.focus == Focus::Table;
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Item analysis")
        .border_style(if focused { Style::default().fg(theme.highlight) } else { Style::default() });
    if app.records.is_empty() {
        frame.render_widget(Paragraph::new("No analysed questions match this filter.").block(block), area);
        return;
    }
    let header = Row::new(["", "Question", "P-Value", "D-Index", "Responses"].map(|h| Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))));
    let max_len = app.config.display.content_truncate;
    let rows: Vec<Row> = app.records.iter().map(|r| {
        let content = r.question.as_ref().map(|q| truncate_text(&q.content, max_len)).unwrap_or_else(|| r.question_id.to_string());
        let p_color = match r.difficulty_index_p_value.map(DifficultyBand::classify) {
            Some(DifficultyBand::Hard) => theme.error,
            Some(DifficultyBand::Easy) => theme.warning,
            Some(DifficultyBand::Moderate) => theme.success,
            None => theme.fg,
        };
        let d_color = match r.discrimination_index.map(DiscriminationBand::classify) {
            Some(DiscriminationBand::Poor) => theme.error,
            Some(DiscriminationBand::Good) => theme.highlight,
            Some(DiscriminationBand::Excellent) => theme.success,
            None => theme.fg,
        };
        Row::new([
            Cell::from(if needs_review(r) { "!" } else { " " }).style(Style::default().fg(theme.warning)),
            Cell::from(content),
            Cell::from(format_metric(r.difficulty_index_p_value)).style(Style::default().fg(p_color)),
            Cell::from(format_metric(r.discrimination_index)).style(Style::default().fg(d_color)),
            Cell::from(r.responses_analyzed_count.map_or("-".into(), |c| c.to_string())),
        ])
    }).collect();
    let table = Table::new(rows, [Constraint::Length(1), Constraint::Min(30), Constraint::Length(8), Constraint::Length(8), Constraint::Length(10)])
        .header(header)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    let mut state = TableState::default();
    state.select(Some(app.table_selected.min(app.records.len() - 1)));
    frame.render_stateful_widget(table, area, &mut state);
}

fn render_bottombar(frame: &mut Frame, app: &App, area: Rect, theme: &Theme) {
    let focus = match app.focus { Focus::Charts => "charts", Focus::Table => "table" };
    let text = format!(" [{focus}] {}", app.status_msg);
    frame.render_widget(Paragraph::new(text).style(Style::default().bg(theme.bg).fg(theme.fg)), area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(Span::styled("Keybindings", Style::default().add_modifier(Modifier::BOLD))),
        Line::from("  q        Quit"),
        Line::from("  ?        Toggle help"),
        Line::from("  Tab      Switch focus (charts/table)"),
        Line::from("  + / -    More / fewer bins"),
        Line::from("  j/k      Move in table"),
        Line::from("  Enter    Show question id"),
        Line::from(""),
        Line::from("  P-Value: ideal 0.3-0.7, easy >0.7, hard <0.3"),
        Line::from("  D-Index: excellent >=0.4, good 0.2-0.39, poor <0.2"),
    ];
    let popup = centered_rect(50, 60, area);
    frame.render_widget(ratatui::widgets::Clear, popup);
    frame.render_widget(Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help (?)")), popup);
}

fn centered_rect(px: u16, py: u16, r: Rect) -> Rect {
    let v = Layout::default().direction(Direction::Vertical).constraints([Constraint::Percentage((100-py)/2), Constraint::Percentage(py), Constraint::Percentage((100-py)/2)]).split(r);
    Layout::default().direction(Direction::Horizontal).constraints([Constraint::Percentage((100-px)/2), Constraint::Percentage(px), Constraint::Percentage((100-px)/2)]).split(v[1])[1]
}
