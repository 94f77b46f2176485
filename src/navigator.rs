use crate::error::GenerationError;
use crate::models::FlashcardRecord;

/// Live review state over one deck. Only constructible from a non-empty deck.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeckSession {
    cards: Vec<FlashcardRecord>,
    position: usize,
    revealed: bool,
}

impl DeckSession {
    pub fn new(cards: Vec<FlashcardRecord>) -> Result<Self, GenerationError> {
        if cards.is_empty() {
            return Err(GenerationError::EmptyResponse);
        }
        Ok(DeckSession {
            cards,
            position: 0,
            revealed: false,
        })
    }

    pub fn cards(&self) -> &[FlashcardRecord] {
        &self.cards
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    fn move_to(&mut self, position: usize) {
        self.position = position;
        self.revealed = false;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum NavigatorState {
    #[default]
    Idle,
    Reviewing(DeckSession),
}

#[derive(Debug, Default)]
pub struct DeckNavigator {
    state: NavigatorState,
}

impl DeckNavigator {
    pub fn new() -> Self {
        DeckNavigator::default()
    }

    pub fn state(&self) -> &NavigatorState {
        &self.state
    }

    pub fn session(&self) -> Option<&DeckSession> {
        match &self.state {
            NavigatorState::Reviewing(session) => Some(session),
            NavigatorState::Idle => None,
        }
    }

    fn session_mut(&mut self) -> Option<&mut DeckSession> {
        match &mut self.state {
            NavigatorState::Reviewing(session) => Some(session),
            NavigatorState::Idle => None,
        }
    }

    pub fn is_reviewing(&self) -> bool {
        self.session().is_some()
    }

    /// Replaces whatever was loaded. An empty deck leaves the state untouched.
    pub fn start_session(&mut self, cards: Vec<FlashcardRecord>) -> Result<(), GenerationError> {
        let session = DeckSession::new(cards)?;
        self.state = NavigatorState::Reviewing(session);
        Ok(())
    }

    /// Returns whether the position moved; a no-op on the last card.
    pub fn next(&mut self) -> bool {
        match self.session_mut() {
            Some(session) if session.position + 1 < session.len() => {
                let target = session.position + 1;
                session.move_to(target);
                true
            }
            _ => false,
        }
    }

    /// Returns whether the position moved; a no-op on the first card.
    pub fn previous(&mut self) -> bool {
        match self.session_mut() {
            Some(session) if session.position > 0 => {
                let target = session.position - 1;
                session.move_to(target);
                true
            }
            _ => false,
        }
    }

    // 越界时取最近的合法位置
    pub fn jump_to(&mut self, index: usize) {
        if let Some(session) = self.session_mut() {
            let target = index.min(session.len() - 1);
            session.move_to(target);
        }
    }

    pub fn toggle_reveal(&mut self) {
        if let Some(session) = self.session_mut() {
            session.revealed = !session.revealed;
        }
    }

    pub fn reset(&mut self) {
        self.state = NavigatorState::Idle;
    }

    pub fn current_card(&self) -> Option<&FlashcardRecord> {
        self.session().and_then(|s| s.cards.get(s.position))
    }

    pub fn position(&self) -> Option<usize> {
        self.session().map(DeckSession::position)
    }

    pub fn len(&self) -> usize {
        self.session().map_or(0, DeckSession::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_revealed(&self) -> bool {
        self.session().is_some_and(DeckSession::is_revealed)
    }

    pub fn is_first(&self) -> bool {
        self.session().is_some_and(|s| s.position == 0)
    }

    pub fn is_last(&self) -> bool {
        self.session().is_some_and(|s| s.position + 1 == s.len())
    }

    /// Fraction of the deck seen so far, in (0, 1].
    pub fn progress(&self) -> Option<f64> {
        self.session()
            .map(|s| ((s.position + 1) as f64 / s.len() as f64).clamp(f64::MIN_POSITIVE, 1.0))
    }

    pub fn progress_label(&self) -> Option<String> {
        self.session().map(|s| format!("{}/{}", s.position + 1, s.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(count: usize) -> Vec<FlashcardRecord> {
        (0..count)
            .map(|i| FlashcardRecord {
                term: format!("Word {}", i + 1),
                translation_primary: "မင်္ဂလာပါ".to_string(),
                translation_primary_pronunciation: "min-ga-la-ba".to_string(),
                translation_secondary: "你好".to_string(),
                translation_secondary_phonetic: "nǐ hǎo".to_string(),
                category: "Greeting".to_string(),
            })
            .collect()
    }

    #[test]
    fn starts_at_front_of_first_card() {
        let mut navigator = DeckNavigator::new();
        assert!(!navigator.is_reviewing());
        assert_eq!(navigator.current_card(), None);

        navigator.start_session(deck(3)).unwrap();
        assert_eq!(navigator.position(), Some(0));
        assert!(!navigator.is_revealed());
        assert_eq!(navigator.current_card().unwrap().term, "Word 1");
    }

    #[test]
    fn empty_deck_is_rejected_without_touching_state() {
        let mut navigator = DeckNavigator::new();
        assert_eq!(navigator.start_session(Vec::new()), Err(GenerationError::EmptyResponse));
        assert_eq!(navigator.state(), &NavigatorState::Idle);

        navigator.start_session(deck(2)).unwrap();
        navigator.next();
        assert!(navigator.start_session(Vec::new()).is_err());
        assert_eq!(navigator.position(), Some(1));
    }

    #[test]
    fn single_card_deck_cannot_move() {
        let mut navigator = DeckNavigator::new();
        navigator.start_session(deck(1)).unwrap();

        assert!(!navigator.next());
        assert!(!navigator.previous());
        assert_eq!(navigator.position(), Some(0));
        assert_eq!(navigator.progress(), Some(1.0));
        assert!(navigator.is_first() && navigator.is_last());
    }

    #[test]
    fn position_stays_in_bounds_for_any_walk() {
        let mut navigator = DeckNavigator::new();
        navigator.start_session(deck(5)).unwrap();

        // 伪随机步进序列
        let mut seed: u32 = 7;
        for _ in 0..500 {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            if seed % 2 == 0 {
                navigator.next();
            } else {
                navigator.previous();
            }
            let position = navigator.position().unwrap();
            assert!(position < 5);
            let progress = navigator.progress().unwrap();
            assert!(progress > 0.0 && progress <= 1.0);
        }
    }

    #[test]
    fn reveal_toggles_and_clears_on_move() {
        let mut navigator = DeckNavigator::new();
        navigator.start_session(deck(3)).unwrap();

        navigator.toggle_reveal();
        assert!(navigator.is_revealed());
        navigator.toggle_reveal();
        assert!(!navigator.is_revealed());

        navigator.toggle_reveal();
        navigator.next();
        assert!(!navigator.is_revealed());

        navigator.toggle_reveal();
        navigator.previous();
        assert!(!navigator.is_revealed());

        navigator.toggle_reveal();
        navigator.jump_to(2);
        assert!(!navigator.is_revealed());
    }

    #[test]
    fn boundary_moves_keep_reveal() {
        let mut navigator = DeckNavigator::new();
        navigator.start_session(deck(2)).unwrap();
        navigator.toggle_reveal();
        assert!(!navigator.previous());
        assert!(navigator.is_revealed());
    }

    #[test]
    fn jump_clamps_into_range() {
        let mut navigator = DeckNavigator::new();
        navigator.start_session(deck(4)).unwrap();
        navigator.jump_to(99);
        assert_eq!(navigator.position(), Some(3));
        assert!(navigator.is_last());
    }

    #[test]
    fn idle_operations_are_no_ops() {
        let mut navigator = DeckNavigator::new();
        assert!(!navigator.next());
        assert!(!navigator.previous());
        navigator.toggle_reveal();
        navigator.jump_to(3);
        assert!(!navigator.is_revealed());
        assert_eq!(navigator.progress(), None);
        assert_eq!(navigator.state(), &NavigatorState::Idle);
    }

    #[test]
    fn reset_discards_session() {
        let mut navigator = DeckNavigator::new();
        navigator.start_session(deck(3)).unwrap();
        navigator.next();
        navigator.toggle_reveal();

        navigator.reset();
        assert_eq!(navigator.state(), &NavigatorState::Idle);
        assert!(navigator.session().is_none());
        assert_eq!(navigator.current_card(), None);
        assert_eq!(navigator.len(), 0);
        assert_eq!(navigator.progress_label(), None);

        navigator.reset();
        assert_eq!(navigator.state(), &NavigatorState::Idle);
    }

    #[test]
    fn twenty_card_walk() {
        let mut navigator = DeckNavigator::new();
        navigator.start_session(deck(20)).unwrap();
        assert_eq!(navigator.progress_label().as_deref(), Some("1/20"));

        for _ in 0..19 {
            assert!(navigator.next());
        }
        assert_eq!(navigator.position(), Some(19));
        assert!(!navigator.next());
        assert_eq!(navigator.position(), Some(19));
        assert_eq!(navigator.progress_label().as_deref(), Some("20/20"));
        assert_eq!(navigator.progress(), Some(1.0));
    }
}
