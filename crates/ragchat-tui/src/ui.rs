use ragchat_core::ChatRole;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::app::{App, Field};
use crate::input::TextInput;

/// Number of terminal rows `paragraph` takes up when wrapped to `width`.
/// Counted with the same word wrapper the paragraph renders with.
fn wrapped_height(paragraph: &Paragraph<'_>, width: u16) -> u16 {
    paragraph
        .line_count(width.max(1))
        .min(u16::MAX as usize) as u16
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, body, footer
    let [header_area, body_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);

    let [chat_area, admin_area] = Layout::horizontal([
        Constraint::Percentage(68),
        Constraint::Percentage(32),
    ])
    .areas(body_area);

    let [history_area, input_area] = Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(chat_area);

    render_history(app, frame, history_area);
    render_user_input(app, frame, input_area);
    render_admin_panel(app, frame, admin_area);
    render_footer(app, frame, footer_area);

    if let Some(notice) = &app.view.notice {
        render_notice(notice, frame, area);
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let activity = if app.requests_in_flight > 0 {
        format!(" [{} pending]", app.requests_in_flight)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" ragchat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(app.backend_url.clone(), Style::default().fg(Color::White)),
        Span::styled(activity, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_history(app: &mut App, frame: &mut Frame, area: Rect) {
    let view = &mut app.view;

    // Store dimensions for scroll calculations (inner size minus borders)
    view.history_height = area.height.saturating_sub(2);
    view.history_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" chat-history ");

    let mut lines: Vec<Line<'static>> = Vec::new();
    for entry in &view.history {
        match entry.role {
            ChatRole::User => lines.push(Line::from(Span::styled(
                "You:",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ))),
            ChatRole::Ai => lines.push(Line::from(Span::styled(
                "AI:",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ))),
        }
        lines.extend(entry.lines.iter().cloned());
        lines.push(Line::default());
    }

    if app.chats_in_flight > 0 {
        lines.push(Line::from(Span::styled(
            "AI:",
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let text = if lines.is_empty() {
        Text::from(Span::styled(
            "Ask a question about your documents...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(lines)
    };

    // Measured before the block is attached so borders are not counted
    let paragraph = Paragraph::new(text).wrap(Wrap { trim: false });
    let total = wrapped_height(&paragraph, view.history_width);
    let max_scroll = total.saturating_sub(view.history_height);
    if view.follow_history || view.history_scroll >= max_scroll {
        view.history_scroll = max_scroll;
        view.follow_history = true;
    }

    let paragraph = paragraph.block(block).scroll((view.history_scroll, 0));
    frame.render_widget(paragraph, area);
}

fn input_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused { Color::Cyan } else { Color::DarkGray };
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border))
        .title(title)
}

fn render_text_input(
    input: &TextInput,
    title: String,
    focused: bool,
    frame: &mut Frame,
    area: Rect,
) {
    let inner_width = area.width.saturating_sub(2);
    let (visible, cursor_col) = input.viewport(inner_width);

    let paragraph = Paragraph::new(visible.to_string()).block(input_block(title, focused));
    frame.render_widget(paragraph, area);

    if focused {
        frame.set_cursor_position((area.x + 1 + cursor_col, area.y + 1));
    }
}

fn render_user_input(app: &App, frame: &mut Frame, area: Rect) {
    let view = &app.view;
    let rag = if view.use_rag { "on" } else { "off" };
    let mut title = format!(" {} [use-rag: {}", Field::UserInput.id(), rag);
    if view.use_rerank {
        title.push_str(", rerank");
    }
    title.push_str("] ");

    render_text_input(
        &view.user_input,
        title,
        view.focus == Field::UserInput,
        frame,
        area,
    );
}

fn render_admin_panel(app: &App, frame: &mut Frame, area: Rect) {
    let view = &app.view;

    let [type_area, name_area, file_area, embed_area, upload_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Min(3),
    ])
    .areas(area);

    for (field, input, field_area) in [
        (Field::ModelType, &view.model_type, type_area),
        (Field::ModelName, &view.model_name, name_area),
        (Field::DocumentFile, &view.document_file, file_area),
    ] {
        render_text_input(
            input,
            format!(" {} ", field.id()),
            view.focus == field,
            frame,
            field_area,
        );
    }

    let status = |title: &'static str, text: &str| {
        Paragraph::new(text.to_string())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::DarkGray))
                    .title(title),
            )
            .wrap(Wrap { trim: true })
    };

    frame.render_widget(status(" embedding-status ", &view.embedding_status), embed_area);
    frame.render_widget(status(" upload-status ", &view.upload_status), upload_area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let enter_label = match app.view.focus {
        Field::UserInput => " send ",
        Field::ModelType | Field::ModelName => " update config ",
        Field::DocumentFile => " upload ",
    };

    let hints = [
        (" Enter ", enter_label),
        (" Tab ", " next field "),
        (" ^R ", " rag "),
        (" ^K ", " rerank "),
        (" ^T ", " model type "),
        (" ^E ", " embeddings "),
        (" ^X ", " rebuild index "),
        (" PgUp/PgDn ", " scroll "),
        (" ^C ", " quit "),
    ];

    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(key, key_style));
        spans.push(Span::styled(label, label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_notice(notice: &str, frame: &mut Frame, area: Rect) {
    let width = (notice.chars().count() as u16 + 4)
        .max(30)
        .min(area.width.saturating_sub(4).max(1));
    let height = 5;
    let popup = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    };

    let text = Text::from(vec![
        Line::from(notice.to_string()),
        Line::default(),
        Line::from(Span::styled("Enter/Esc to close", Style::default().fg(Color::DarkGray))),
    ]);

    let paragraph = Paragraph::new(text)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Notice "),
        )
        .wrap(Wrap { trim: true });

    frame.render_widget(Clear, popup);
    frame.render_widget(paragraph, popup);
}
