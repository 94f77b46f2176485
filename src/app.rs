//! Study controller: owns the navigator and entry form, and is the only
//! place session state changes.

use tracing::{debug, warn};

use crate::error::GenerationError;
use crate::models::{Difficulty, FlashcardRecord, GenerationRequest, TOPIC_PRESETS, resolve_topic};
use crate::navigator::DeckNavigator;
use crate::tts::SpeechLanguage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Entry,
    Review,
}

/// A generation in flight. Its token is checked again when the result lands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTicket {
    pub token: u64,
    pub request: GenerationRequest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Applied,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewKey {
    Space,
    Enter,
    Left,
    Right,
    Esc,
    Char(char),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    None,
    Flipped,
    Moved,
    AtBoundary,
    ReturnedToEntry,
    Speak { text: String, language: SpeechLanguage },
    Quit,
}

#[derive(Debug, Default)]
pub struct EntryForm {
    pub preset: Option<usize>,
    pub free_text: String,
    pub difficulty: Difficulty,
}

impl EntryForm {
    pub fn preset_topic(&self) -> Option<&'static str> {
        self.preset.and_then(|i| TOPIC_PRESETS.get(i).copied())
    }
}

#[derive(Debug, Default)]
pub struct StudyApp {
    view: View,
    navigator: DeckNavigator,
    pub form: EntryForm,
    loading: bool,
    error: Option<String>,
    notice: Option<String>,
    generation: u64,
}

impl StudyApp {
    pub fn new() -> Self {
        StudyApp::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn navigator(&self) -> &DeckNavigator {
        &self.navigator
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Transient status line on the review screen, e.g. speech results.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    // ---- 入口表单 ----

    pub fn select_next_preset(&mut self) {
        let next = match self.form.preset {
            Some(i) if i + 1 < TOPIC_PRESETS.len() => i + 1,
            Some(i) => i,
            None => 0,
        };
        self.form.preset = Some(next);
        self.form.free_text.clear();
    }

    pub fn select_previous_preset(&mut self) {
        let previous = match self.form.preset {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.form.preset = Some(previous);
        self.form.free_text.clear();
    }

    pub fn cycle_difficulty(&mut self) {
        self.form.difficulty = self.form.difficulty.cycle();
    }

    pub fn push_char(&mut self, c: char) {
        self.form.free_text.push(c);
        self.form.preset = None;
    }

    pub fn pop_char(&mut self) {
        self.form.free_text.pop();
    }

    // ---- 生成 ----

    /// Starts a generation from the entry form. The current deck stays put
    /// until [`StudyApp::complete`] commits a newer one.
    pub fn submit(&mut self) -> Result<GenerationTicket, GenerationError> {
        let ticket = resolve_topic(self.form.preset_topic(), &self.form.free_text)
            .ok_or_else(|| GenerationError::Validation("Please choose or enter a topic.".to_string()))
            .and_then(|topic| GenerationRequest::new(&topic, self.form.difficulty));

        match ticket {
            Ok(request) => {
                self.generation += 1;
                self.error = None;
                self.loading = true;
                Ok(GenerationTicket {
                    token: self.generation,
                    request,
                })
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Commits a finished generation unless a newer submit or a reset
    /// superseded it.
    pub fn complete(&mut self, token: u64, result: Result<Vec<FlashcardRecord>, GenerationError>) -> Completion {
        if token != self.generation {
            debug!(token, current = self.generation, "discarding stale generation result");
            return Completion::Stale;
        }

        self.loading = false;
        match result.and_then(|cards| self.navigator.start_session(cards)) {
            Ok(()) => {
                self.error = None;
                self.view = View::Review;
            }
            Err(e) => {
                warn!("generation failed: {}", e);
                self.error = Some(e.to_string());
                self.view = View::Entry;
            }
        }
        Completion::Applied
    }

    pub fn return_to_entry(&mut self) {
        self.generation += 1;
        self.navigator.reset();
        self.loading = false;
        self.error = None;
        self.notice = None;
        self.view = View::Entry;
    }

    // ---- 复习 ----

    pub fn handle_review_key(&mut self, key: ReviewKey) -> ReviewAction {
        if self.view != View::Review {
            return ReviewAction::None;
        }
        self.notice = None;

        match key {
            ReviewKey::Space | ReviewKey::Enter => {
                self.navigator.toggle_reveal();
                ReviewAction::Flipped
            }
            ReviewKey::Right => moved(self.navigator.next()),
            ReviewKey::Left => moved(self.navigator.previous()),
            ReviewKey::Esc | ReviewKey::Char('m') => {
                self.return_to_entry();
                ReviewAction::ReturnedToEntry
            }
            ReviewKey::Char('c') => self.speak(SpeechLanguage::Chinese),
            ReviewKey::Char('b') => self.speak(SpeechLanguage::Burmese),
            ReviewKey::Char('q') => ReviewAction::Quit,
            ReviewKey::Char(_) => ReviewAction::None,
        }
    }

    // 只有翻到背面时才朗读
    fn speak(&mut self, language: SpeechLanguage) -> ReviewAction {
        match self.navigator.current_card() {
            Some(card) if self.navigator.is_revealed() => ReviewAction::Speak {
                text: language.text_of(card).to_string(),
                language,
            },
            Some(_) => {
                self.notice = Some("Reveal the card to listen".to_string());
                ReviewAction::None
            }
            None => ReviewAction::None,
        }
    }
}

fn moved(changed: bool) -> ReviewAction {
    if changed {
        ReviewAction::Moved
    } else {
        ReviewAction::AtBoundary
    }
}
