use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, Screen};
use crate::session::WrongAnswer;
use crate::sets::Choice;
use crate::store::KvStore;

const HORIZONTAL_MARGIN: u16 = 2;

pub fn draw<S, W>(app: &App<S, W>, f: &mut Frame)
where
    S: KvStore<Choice>,
    W: KvStore<WrongAnswer>,
{
    match app.screen {
        Screen::Quiz => render_quiz(app, f),
        Screen::Review => render_review(app, f),
    }
}

fn render_quiz<S, W>(app: &App<S, W>, f: &mut Frame)
where
    S: KvStore<Choice>,
    W: KvStore<WrongAnswer>,
{
    let bold = Style::default().add_modifier(Modifier::BOLD);
    let dim = Style::default().add_modifier(Modifier::DIM);
    let green_bold = bold.fg(Color::Green);
    let red_bold = bold.fg(Color::Red);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Min(4),    // question
            Constraint::Length(3), // option markers
            Constraint::Length(6), // result
            Constraint::Length(3), // help
        ])
        .split(f.area());

    render_header(app, f, chunks[0]);

    let Some(question) = app.session.current_question() else {
        let placeholder = if app.pending_set.is_some() {
            "Loading question set..."
        } else {
            "No question set loaded. Press (tab) to pick one."
        };
        let widget = Paragraph::new(Span::styled(placeholder, dim))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(widget, chunks[1]);
        render_help(f, chunks[4]);
        return;
    };

    let body = Paragraph::new(question.question.as_str())
        .block(Block::default().borders(Borders::ALL).title(format!(
            "Question {}",
            question.seq
        )))
        .wrap(Wrap { trim: true });
    f.render_widget(body, chunks[1]);

    // One marker per option; coloring mirrors the check outcome once a
    // result is visible.
    let result = app.session.result();
    let selected = app.session.selected();
    let spans: Vec<Span> = Choice::ALL
        .iter()
        .flat_map(|choice| {
            let style = match result {
                Some(_) if *choice == question.answer => green_bold,
                Some(_) if selected == Some(*choice) => red_bold,
                None if selected == Some(*choice) => bold.fg(Color::Cyan),
                _ => dim,
            };
            let marker = if selected == Some(*choice) {
                format!("[{choice}]")
            } else {
                format!(" {choice} ")
            };
            [Span::styled(marker, style), Span::raw("   ")]
        })
        .collect();
    let options = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Your answer"))
        .alignment(Alignment::Center);
    f.render_widget(options, chunks[2]);

    match result {
        Some(check) => {
            let (status, style) = if check.correct {
                ("Correct!", green_bold)
            } else {
                ("Incorrect!", red_bold)
            };
            let lines = vec![
                Line::from(Span::styled(status, style)),
                Line::from(Span::styled(
                    check.explanation.as_str(),
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ];
            let widget = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Result"))
                .wrap(Wrap { trim: true });
            f.render_widget(widget, chunks[3]);
        }
        None => {
            let hint = Paragraph::new(Span::styled("(enter) to check", dim))
                .block(Block::default().borders(Borders::ALL).title("Result"))
                .alignment(Alignment::Center);
            f.render_widget(hint, chunks[3]);
        }
    }

    render_help(f, chunks[4]);
}

fn render_header<S, W>(app: &App<S, W>, f: &mut Frame, area: Rect)
where
    S: KvStore<Choice>,
    W: KvStore<WrongAnswer>,
{
    // A failed load blocks everything else until acknowledged.
    if let Some(notice) = &app.notice {
        let widget = Paragraph::new(Span::styled(
            format!("{notice} - press any key"),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ))
        .block(Block::default().borders(Borders::ALL).title("Load failed"))
        .alignment(Alignment::Center);
        f.render_widget(widget, area);
        return;
    }

    let title = match (app.session.active_set_name(), &app.pending_set) {
        (_, Some(pending)) => format!("loading {pending}..."),
        (Some(name), None) => match app.session.progress() {
            Some((seq, total)) => format!("{name}  {seq}/{total}"),
            None => name.to_string(),
        },
        (None, None) => "quizr".to_string(),
    };

    let widget = Paragraph::new(Span::styled(
        title,
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(widget, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "(a/b/c) answer | (enter) check | (←/→) question | (tab) set | (r) reset | (w) review | (esc) quit",
    )
    .block(Block::default().borders(Borders::ALL))
    .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
    .alignment(Alignment::Center);
    f.render_widget(help, area);
}

fn render_review<S, W>(app: &App<S, W>, f: &mut Frame)
where
    S: KvStore<Choice>,
    W: KvStore<WrongAnswer>,
{
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(3), // title
            Constraint::Min(3),    // entry list
            Constraint::Length(8), // highlighted detail
            Constraint::Length(3), // help
        ])
        .split(f.area());

    let set_name = app.session.active_set_name().unwrap_or("no set");
    let title = Paragraph::new(Span::styled(
        format!("Wrong answers - {set_name}"),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Center);
    f.render_widget(title, chunks[0]);

    let entries = app.session.wrong_answers_for_current_set();

    if entries.is_empty() {
        let empty = Paragraph::new("No wrong answers recorded yet for this question set.")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(empty, chunks[1]);
    } else {
        // Keep the highlighted row on screen for ledgers longer than the list
        // area.
        let visible = (chunks[1].height.saturating_sub(2) as usize).max(1);
        let max_skip = entries.len().saturating_sub(visible);
        let skip = app.review_index.saturating_sub(visible - 1).min(max_skip);

        let lines: Vec<Line> = entries
            .iter()
            .enumerate()
            .skip(skip)
            .take(visible)
            .map(|(i, (_, entry))| {
                let text = format!(
                    "Question {}: answered {}, correct {}",
                    entry.seq, entry.user_answer, entry.correct_answer
                );
                let style = if i == app.review_index {
                    Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(text, style))
            })
            .collect();

        let list = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(format!(
                "{} recorded",
                entries.len()
            )));
        f.render_widget(list, chunks[1]);

        if let Some((_, entry)) = entries.get(app.review_index) {
            let lines = vec![
                Line::from(entry.question.as_str()),
                Line::from(Span::styled(
                    entry.explanation.as_str(),
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ];
            let detail = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title(format!(
                    "Question {}",
                    entry.seq
                )))
                .wrap(Wrap { trim: true });
            f.render_widget(detail, chunks[2]);
        }
    }

    let help = Paragraph::new("(↑/↓) select | (d) delete entry | (b) back | (esc) back")
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::ITALIC))
        .alignment(Alignment::Center);
    f.render_widget(help, chunks[3]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::sets::BundledSource;
    use crate::store::MemoryStore;
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    fn rendered_app() -> App<MemoryStore<Choice>, MemoryStore<WrongAnswer>> {
        let (tx, _rx) = std::sync::mpsc::channel();
        let mut session = Session::new(MemoryStore::new(), MemoryStore::new());
        session.load(&BundledSource, "SampleTest").unwrap();
        App::new(session, Arc::new(BundledSource), tx)
    }

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn test_quiz_screen_renders_question_and_progress() {
        let app = rendered_app();
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();

        let content = buffer_text(&terminal);
        assert!(content.contains("SampleTest"));
        assert!(content.contains("1/3"));
        assert!(content.contains("Question 1"));
    }

    #[test]
    fn test_quiz_screen_renders_result_and_explanation() {
        let mut app = rendered_app();
        app.session.select_option(Choice::C);
        app.session.check_answer().unwrap();

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();

        let content = buffer_text(&terminal);
        assert!(content.contains("Incorrect!"));
    }

    #[test]
    fn test_quiz_screen_renders_notice() {
        let mut app = rendered_app();
        app.notice = Some("question set 'Broken' was not found".to_string());

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();

        let content = buffer_text(&terminal);
        assert!(content.contains("Load failed"));
        assert!(content.contains("press any key"));
    }

    #[test]
    fn test_review_screen_renders_entries_and_empty_state() {
        let mut app = rendered_app();
        app.screen = Screen::Review;

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();
        assert!(buffer_text(&terminal).contains("No wrong answers recorded"));

        app.session.select_option(Choice::C);
        app.session.check_answer().unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();

        let content = buffer_text(&terminal);
        assert!(content.contains("1 recorded"));
        assert!(content.contains("answered C, correct A"));
    }

    #[test]
    fn test_quiz_screen_without_a_set() {
        let (tx, _rx) = std::sync::mpsc::channel();
        let session = Session::new(MemoryStore::new(), MemoryStore::new());
        let app: App<MemoryStore<Choice>, MemoryStore<WrongAnswer>> =
            App::new(session, Arc::new(BundledSource), tx);

        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| draw(&app, f)).unwrap();
        assert!(buffer_text(&terminal).contains("No question set loaded"));
    }
}
