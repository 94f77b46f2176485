//! Terminal front-end: the entry form and the card review screen.

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Gauge, Paragraph, Wrap};
use ratatui::{DefaultTerminal, Frame};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

use crate::api::CompletionService;
use crate::app::{GenerationTicket, ReviewAction, ReviewKey, StudyApp, View};
use crate::error::GenerationError;
use crate::generator::DeckGenerator;
use crate::models::{Difficulty, FlashcardRecord, TOPIC_PRESETS};
use crate::tts::{Pronouncer, SpeechLanguage};

const POLL_INTERVAL: Duration = Duration::from_millis(100);
const ACCENT: Color = Color::Green;

type GenerationResult = (u64, Result<Vec<FlashcardRecord>, GenerationError>);

enum EntryAction {
    None,
    Submit(GenerationTicket),
    Quit,
}

pub fn run<S>(app: &mut StudyApp, generator: Arc<DeckGenerator<S>>, pronouncer: Pronouncer) -> Result<()>
where
    S: CompletionService + 'static,
{
    let mut terminal = ratatui::try_init()?;
    let result = event_loop(&mut terminal, app, generator, pronouncer);
    ratatui::restore();
    result
}

fn event_loop<S>(
    terminal: &mut DefaultTerminal,
    app: &mut StudyApp,
    generator: Arc<DeckGenerator<S>>,
    pronouncer: Pronouncer,
) -> Result<()>
where
    S: CompletionService + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<GenerationResult>();
    let (notice_tx, mut notice_rx) = mpsc::unbounded_channel::<String>();
    let pronouncer = pronouncer.with_notices(notice_tx);
    let speech_enabled = pronouncer.is_enabled();

    loop {
        while let Ok((token, result)) = rx.try_recv() {
            app.complete(token, result);
        }
        while let Ok(notice) = notice_rx.try_recv() {
            if app.view() == View::Review {
                app.set_notice(notice);
            }
        }

        terminal.draw(|frame| render(frame, app, speech_enabled))?;

        if !event::poll(POLL_INTERVAL)? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            break;
        }

        match app.view() {
            View::Entry => match handle_entry_key(app, key) {
                EntryAction::Submit(ticket) => spawn_generation(&generator, ticket, tx.clone()),
                EntryAction::Quit => break,
                EntryAction::None => {}
            },
            View::Review => {
                let Some(review_key) = review_key(key.code) else {
                    continue;
                };
                match app.handle_review_key(review_key) {
                    ReviewAction::Quit => break,
                    ReviewAction::Speak { text, language } => {
                        speak(app, &pronouncer, &text, language);
                    }
                    _ => {}
                }
            }
        }
    }

    info!("leaving flashdeck");
    Ok(())
}

fn spawn_generation<S>(
    generator: &Arc<DeckGenerator<S>>,
    ticket: GenerationTicket,
    tx: mpsc::UnboundedSender<GenerationResult>,
) where
    S: CompletionService + 'static,
{
    let generator = Arc::clone(generator);
    tokio::spawn(async move {
        let result = generator.generate(&ticket.request).await;
        // 接收端已关闭说明程序正在退出
        let _ = tx.send((ticket.token, result));
    });
}

// 合成在后台进行，先给出即时提示
fn speak(app: &mut StudyApp, pronouncer: &Pronouncer, text: &str, language: SpeechLanguage) {
    let outcome = pronouncer.speak(text, language);
    app.set_notice(outcome.notice(language));
}

fn handle_entry_key(app: &mut StudyApp, key: KeyEvent) -> EntryAction {
    match key.code {
        // 加载中按 Esc 取消本次生成
        KeyCode::Esc if app.is_loading() => {
            app.return_to_entry();
            EntryAction::None
        }
        KeyCode::Esc => EntryAction::Quit,
        KeyCode::Enter if !app.is_loading() => match app.submit() {
            Ok(ticket) => EntryAction::Submit(ticket),
            Err(_) => EntryAction::None,
        },
        KeyCode::Up => {
            app.select_previous_preset();
            EntryAction::None
        }
        KeyCode::Down => {
            app.select_next_preset();
            EntryAction::None
        }
        KeyCode::Tab => {
            app.cycle_difficulty();
            EntryAction::None
        }
        KeyCode::Backspace => {
            app.pop_char();
            EntryAction::None
        }
        KeyCode::Char(c) => {
            app.push_char(c);
            EntryAction::None
        }
        _ => EntryAction::None,
    }
}

pub fn review_key(code: KeyCode) -> Option<ReviewKey> {
    match code {
        KeyCode::Char(' ') => Some(ReviewKey::Space),
        KeyCode::Enter => Some(ReviewKey::Enter),
        KeyCode::Left => Some(ReviewKey::Left),
        KeyCode::Right => Some(ReviewKey::Right),
        KeyCode::Esc => Some(ReviewKey::Esc),
        KeyCode::Char(c) => Some(ReviewKey::Char(c)),
        _ => None,
    }
}

fn render(frame: &mut Frame, app: &StudyApp, speech_enabled: bool) {
    let [header, body] = Layout::vertical([Constraint::Length(3), Constraint::Min(0)]).areas(frame.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled("flashdeck", Style::new().fg(ACCENT).add_modifier(Modifier::BOLD)),
        Span::raw("  Burmese · Chinese vocabulary"),
    ]))
    .block(Block::bordered());
    frame.render_widget(title, header);

    match app.view() {
        View::Entry => render_entry(frame, body, app),
        View::Review => render_review(frame, body, app, speech_enabled),
    }
}

fn render_entry(frame: &mut Frame, area: Rect, app: &StudyApp) {
    let [error_area, form_area, status_area] = Layout::vertical([
        Constraint::Length(if app.error().is_some() { 3 } else { 0 }),
        Constraint::Min(0),
        Constraint::Length(3),
    ])
    .areas(area);

    if let Some(message) = app.error() {
        let notice = Paragraph::new(message.to_string())
            .style(Style::new().fg(Color::Red))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::bordered().border_style(Style::new().fg(Color::Red)));
        frame.render_widget(notice, error_area);
    }

    let mut lines = vec![Line::from(Span::styled(
        "Suggested Topics (Up/Down)",
        Style::new().add_modifier(Modifier::BOLD),
    ))];
    for (i, topic) in TOPIC_PRESETS.iter().enumerate() {
        let selected = app.form.preset == Some(i) && app.form.free_text.is_empty();
        let (marker, style) = if selected {
            ("> ", Style::new().fg(ACCENT).add_modifier(Modifier::BOLD))
        } else {
            ("  ", Style::new())
        };
        lines.push(Line::from(Span::styled(format!("{}{}", marker, topic), style)));
    }
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled("Or type your own: ", Style::new().add_modifier(Modifier::BOLD)),
        Span::raw(app.form.free_text.clone()),
        Span::styled("_", Style::new().fg(Color::DarkGray)),
    ]));
    lines.push(Line::default());
    lines.push(difficulty_line(app.form.difficulty));

    let form = Paragraph::new(lines).block(Block::bordered().title(" Create New Deck "));
    frame.render_widget(form, form_area);

    let status = if app.is_loading() {
        Span::styled("Generating... (Esc to cancel)", Style::new().fg(Color::Yellow))
    } else {
        Span::raw("Enter: generate flashcards   Esc: quit")
    };
    frame.render_widget(
        Paragraph::new(Line::from(status)).alignment(Alignment::Center).block(Block::bordered()),
        status_area,
    );
}

fn difficulty_line(current: Difficulty) -> Line<'static> {
    let mut spans = vec![Span::styled(
        "Difficulty Level (Tab): ",
        Style::new().add_modifier(Modifier::BOLD),
    )];
    for level in Difficulty::ALL {
        let style = if level == current {
            Style::new().fg(Color::Black).bg(ACCENT)
        } else {
            Style::new().fg(Color::DarkGray)
        };
        spans.push(Span::styled(format!(" {} ", level), style));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

fn render_review(frame: &mut Frame, area: Rect, app: &StudyApp, speech_enabled: bool) {
    let navigator = app.navigator();
    let [progress_area, gauge_area, card_area, controls_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Min(8),
        Constraint::Length(4),
    ])
    .areas(area);

    let position = navigator.position().map_or(0, |p| p + 1);
    frame.render_widget(
        Paragraph::new(format!("Card {} of {}    [m] Main Menu", position, navigator.len())),
        progress_area,
    );
    frame.render_widget(
        Gauge::default()
            .gauge_style(Style::new().fg(ACCENT))
            .ratio(navigator.progress().unwrap_or(0.0))
            .label(navigator.progress_label().unwrap_or_default()),
        gauge_area,
    );

    let revealed = navigator.is_revealed();
    let card = Paragraph::new(card_lines(navigator.current_card(), revealed))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(Block::bordered().border_style(if revealed {
            Style::new().fg(ACCENT)
        } else {
            Style::new()
        }));
    frame.render_widget(card, card_area);

    let dim = Style::new().fg(Color::DarkGray);
    let live = Style::new().add_modifier(Modifier::BOLD);
    let controls = Line::from(vec![
        Span::styled("< Prev", if navigator.is_first() { dim } else { live }),
        Span::raw("    "),
        Span::styled(if revealed { "[Space] Show Term" } else { "[Space] Reveal" }, live),
        Span::raw("    "),
        Span::styled("Next >", if navigator.is_last() { dim } else { live }),
    ]);
    let tip = Line::from(Span::styled(review_tip(speech_enabled), dim));
    let notice = Line::from(Span::styled(
        app.notice().unwrap_or_default().to_string(),
        Style::new().fg(Color::Yellow),
    ));
    frame.render_widget(
        Paragraph::new(vec![controls, tip, notice]).alignment(Alignment::Center),
        controls_area,
    );
}

pub fn review_tip(speech_enabled: bool) -> &'static str {
    if speech_enabled {
        "Space/Enter flip · Arrows navigate · c/b listen · q quit"
    } else {
        "Space/Enter flip · Arrows navigate · q quit"
    }
}

/// Text of a card face. A missing record renders a placeholder.
pub fn card_lines(card: Option<&FlashcardRecord>, revealed: bool) -> Vec<Line<'static>> {
    let Some(card) = card else {
        return vec![Line::from(Span::styled(
            "Card data unavailable",
            Style::new().fg(Color::DarkGray),
        ))];
    };

    let label = Style::new().fg(ACCENT).add_modifier(Modifier::BOLD);
    if !revealed {
        let category = if card.category.trim().is_empty() {
            "Vocabulary".to_string()
        } else {
            card.category.to_uppercase()
        };
        return vec![
            Line::from(Span::styled(format!("[{}]", category), Style::new().fg(Color::DarkGray))),
            Line::default(),
            Line::from(Span::styled(card.term.clone(), Style::new().add_modifier(Modifier::BOLD))),
            Line::default(),
            Line::from(Span::styled("Press Space to reveal translations", Style::new().fg(Color::DarkGray))),
        ];
    }

    vec![
        Line::from(Span::styled("BURMESE", label)),
        Line::from(card.translation_primary.clone()),
        Line::from(Span::styled(
            card.translation_primary_pronunciation.clone(),
            Style::new().add_modifier(Modifier::ITALIC),
        )),
        Line::default(),
        Line::from(Span::styled("CHINESE", label)),
        Line::from(card.translation_secondary.clone()),
        Line::from(card.translation_secondary_phonetic.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|line| line.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn card(category: &str) -> FlashcardRecord {
        FlashcardRecord {
            term: "Hello".to_string(),
            translation_primary: "မင်္ဂလာပါ".to_string(),
            translation_primary_pronunciation: "min-ga-la-ba".to_string(),
            translation_secondary: "你好".to_string(),
            translation_secondary_phonetic: "nǐ hǎo".to_string(),
            category: category.to_string(),
        }
    }

    #[test]
    fn missing_card_renders_placeholder() {
        assert_eq!(text(&card_lines(None, false)), ["Card data unavailable"]);
        assert_eq!(text(&card_lines(None, true)), ["Card data unavailable"]);
    }

    #[test]
    fn front_shows_term_and_category() {
        let front = text(&card_lines(Some(&card("Greeting")), false));
        assert_eq!(front[0], "[GREETING]");
        assert!(front.contains(&"Hello".to_string()));
        assert!(!front.iter().any(|l| l.contains("你好")));

        let front = text(&card_lines(Some(&card(" ")), false));
        assert_eq!(front[0], "[Vocabulary]");
    }

    #[test]
    fn back_shows_both_translations() {
        let back = text(&card_lines(Some(&card("Greeting")), true));
        for expected in ["မင်္ဂလာပါ", "min-ga-la-ba", "你好", "nǐ hǎo"] {
            assert!(back.iter().any(|l| l == expected), "missing {}", expected);
        }
        assert!(!back.iter().any(|l| l == "Hello"));
    }

    #[test]
    fn review_keys_map_to_bindings() {
        assert_eq!(review_key(KeyCode::Char(' ')), Some(ReviewKey::Space));
        assert_eq!(review_key(KeyCode::Enter), Some(ReviewKey::Enter));
        assert_eq!(review_key(KeyCode::Right), Some(ReviewKey::Right));
        assert_eq!(review_key(KeyCode::Left), Some(ReviewKey::Left));
        assert_eq!(review_key(KeyCode::Up), None);
    }

    #[test]
    fn listen_hint_follows_speech_config() {
        assert!(review_tip(true).contains("c/b listen"));
        assert!(!review_tip(false).contains("listen"));
    }

    #[test]
    fn speaking_without_tts_explains_why() {
        let mut app = StudyApp::new();
        speak(&mut app, &Pronouncer::new(None), "你好", SpeechLanguage::Chinese);
        assert!(app.notice().unwrap().contains("not configured"));
    }

    #[test]
    fn escape_while_loading_cancels() {
        let mut app = StudyApp::new();
        app.select_next_preset();
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        let EntryAction::Submit(ticket) = handle_entry_key(&mut app, enter) else {
            panic!("expected a submit");
        };
        assert!(app.is_loading());

        // 加载中重复回车不会再次提交
        assert!(matches!(handle_entry_key(&mut app, enter), EntryAction::None));

        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert!(matches!(handle_entry_key(&mut app, esc), EntryAction::None));
        assert!(!app.is_loading());
        assert_eq!(
            app.complete(ticket.token, Ok(vec![card("Greeting")])),
            crate::app::Completion::Stale
        );
        assert!(matches!(handle_entry_key(&mut app, esc), EntryAction::Quit));
    }
}
