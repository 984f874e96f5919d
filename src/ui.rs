use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::chat_view::{ChatRole, ChatView};

pub const TITLE: &str = "AI for Terraform Code Generation";
pub const PLACEHOLDER: &str = "Type your message... (Enter to send, Shift+Enter for new line)";
pub const HINT: &str = "Press Enter to send, Shift+Enter for new line";

/// Draft rows shown before the input box starts scrolling.
const MAX_INPUT_ROWS: usize = 5;

pub fn render(view: &ChatView, frame: &mut Frame) {
    let area = frame.area();

    let input = Paragraph::new(input_text(view)).wrap(Wrap { trim: false });
    let input_rows = input
        .line_count(area.width.saturating_sub(2))
        .clamp(1, MAX_INPUT_ROWS);

    // Header, transcript, input box, footer
    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(to_rows(input_rows) + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_transcript(view, frame, chat_area);
    render_input(view, input, frame, input_area);
    render_footer(frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(Span::styled(
        format!(" {TITLE} "),
        Style::default().fg(Color::Cyan).bold(),
    ));
    frame.render_widget(Paragraph::new(title), area);
}

/// Transcript as styled lines: a bold role label, the content, then a blank line.
pub fn transcript_lines(view: &ChatView) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for turn in view.transcript() {
        let (label, color) = match turn.role {
            ChatRole::User => ("You:", Color::Cyan),
            ChatRole::Assistant => ("AI:", Color::Yellow),
        };
        lines.push(Line::from(Span::styled(
            label,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )));
        for line in turn.content.split('\n') {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::default());
    }
    lines
}

fn render_transcript(view: &ChatView, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");
    let inner = block.inner(area);

    // trim would eat the indentation of generated code
    let chat = Paragraph::new(Text::from(transcript_lines(view))).wrap(Wrap { trim: false });
    let scroll = bottom_scroll(chat.line_count(inner.width), inner.height);
    frame.render_widget(chat.block(block).scroll((scroll, 0)), area);
}

fn input_text(view: &ChatView) -> Text<'static> {
    if view.draft().is_empty() {
        Text::from(Span::styled(
            PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(view.draft().to_string())
    }
}

fn render_input(view: &ChatView, input: Paragraph<'static>, frame: &mut Frame, area: Rect) {
    let (title, border_color) = if view.is_sending() {
        (" Sending... ", Color::DarkGray)
    } else {
        (" Send ", Color::Yellow)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(title);
    let inner = block.inner(area);

    let scroll = bottom_scroll(input.line_count(inner.width), inner.height);
    frame.render_widget(input.block(block).scroll((scroll, 0)), area);
}

fn render_footer(frame: &mut Frame, area: Rect) {
    let hint = Line::from(vec![
        Span::styled(format!(" {HINT}"), Style::default().fg(Color::DarkGray)),
        Span::styled(", Esc to quit", Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(hint), area);
}

/// Scroll offset that keeps the last of `total_rows` wrapped rows in a
/// viewport `height` rows tall.
pub fn bottom_scroll(total_rows: usize, height: u16) -> u16 {
    to_rows(total_rows.saturating_sub(usize::from(height)))
}

fn to_rows(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX)
}
