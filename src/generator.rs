use tracing::{error, info};

use crate::api::{CompletionPrompt, CompletionService};
use crate::error::GenerationError;
use crate::models::{FlashcardRecord, GenerationRequest};
use crate::schema;

pub const DECK_SIZE: usize = 20;

const SYSTEM_INSTRUCTION: &str = "You are an expert linguistics professor and language tutor specializing in Burmese and Chinese. Provide accurate, professional-grade educational content.";

pub struct DeckGenerator<S> {
    service: S,
}

impl<S: CompletionService> DeckGenerator<S> {
    pub fn new(service: S) -> Self {
        DeckGenerator { service }
    }

    pub fn build_prompt(request: &GenerationRequest) -> CompletionPrompt {
        let user = format!(
            r#"
Generate {} high-quality, professional vocabulary words or phrases for learning Burmese and Chinese simultaneously.
Topic: {}
Difficulty: {}

The content should be suitable for professional or serious learners.
For each item, provide:
1. The English meaning.
2. The Burmese script (ensure correct spelling).
3. The Burmese pronunciation (phonetic/romanized standard).
4. The Simplified Chinese characters.
5. The Chinese Pinyin (with tone marks).
6. A short sub-category label (e.g., Noun, Verb, Idiom).

Ensure the Burmese and Chinese translations are accurate, contextually appropriate, and natural.
Reply with a JSON array only.
"#,
            DECK_SIZE,
            request.topic(),
            request.difficulty()
        );

        CompletionPrompt {
            system: SYSTEM_INSTRUCTION.to_string(),
            user,
        }
    }

    /// Issues a single request and returns the validated deck. Each call is
    /// independent; nothing is retried or cached.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<Vec<FlashcardRecord>, GenerationError> {
        info!(topic = request.topic(), difficulty = %request.difficulty(), "generating deck");

        let prompt = Self::build_prompt(request);
        let content = self.service.complete(&prompt).await.map_err(|e| {
            error!("generation service failed: {}", e);
            GenerationError::from(e)
        })?;

        let content = content.ok_or(GenerationError::EmptyResponse)?;
        let cards = schema::parse_cards(&content)?;

        info!(cards = cards.len(), "deck generated");
        Ok(cards)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::models::Difficulty;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    /// Canned backend that records prompts it was given.
    pub(crate) struct FakeService {
        reply: Mutex<Option<Result<Option<String>, ServiceError>>>,
        pub prompts: Mutex<Vec<CompletionPrompt>>,
    }

    impl FakeService {
        pub(crate) fn replying(reply: Result<Option<String>, ServiceError>) -> Self {
            FakeService {
                reply: Mutex::new(Some(reply)),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl CompletionService for FakeService {
        async fn complete(&self, prompt: &CompletionPrompt) -> Result<Option<String>, ServiceError> {
            self.prompts.lock().unwrap().push(prompt.clone());
            self.reply
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(ServiceError::Other("no reply queued".to_string())))
        }
    }

    pub(crate) fn deck_json(count: usize) -> String {
        let items: Vec<_> = (0..count)
            .map(|i| {
                json!({
                    "english": format!("Word {}", i + 1),
                    "burmese": "မင်္ဂလာပါ",
                    "burmesePronunciation": "min-ga-la-ba",
                    "chinese": "你好",
                    "chinesePinyin": "nǐ hǎo",
                    "category": "Greeting"
                })
            })
            .collect();
        json!(items).to_string()
    }

    fn greetings() -> GenerationRequest {
        GenerationRequest::new("Basic Greetings", Difficulty::Beginner).unwrap()
    }

    #[tokio::test]
    async fn returns_full_deck_in_order() {
        let generator = DeckGenerator::new(FakeService::replying(Ok(Some(deck_json(20)))));
        let cards = generator.generate(&greetings()).await.unwrap();

        assert_eq!(cards.len(), 20);
        assert_eq!(cards[0].term, "Word 1");
        assert_eq!(cards[19].term, "Word 20");

        let prompts = generator.service.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.contains("Topic: Basic Greetings"));
        assert!(prompts[0].user.contains("Difficulty: Beginner"));
        assert!(prompts[0].user.contains("Generate 20"));
        assert_eq!(prompts[0].system, SYSTEM_INSTRUCTION);
    }

    #[tokio::test]
    async fn zero_cards_is_an_empty_response() {
        let generator = DeckGenerator::new(FakeService::replying(Ok(Some("[]".to_string()))));
        assert_eq!(generator.generate(&greetings()).await, Err(GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn absent_body_is_an_empty_response() {
        let generator = DeckGenerator::new(FakeService::replying(Ok(None)));
        assert_eq!(generator.generate(&greetings()).await, Err(GenerationError::EmptyResponse));

        let generator = DeckGenerator::new(FakeService::replying(Ok(Some(String::new()))));
        assert_eq!(generator.generate(&greetings()).await, Err(GenerationError::EmptyResponse));
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let generator = DeckGenerator::new(FakeService::replying(Ok(Some(
            r#"{"cards": []}"#.to_string(),
        ))));
        assert!(matches!(
            generator.generate(&greetings()).await,
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn transport_failure_keeps_message() {
        let generator = DeckGenerator::new(FakeService::replying(Err(ServiceError::HttpStatus {
            status: reqwest::StatusCode::TOO_MANY_REQUESTS,
            body: "quota exceeded".to_string(),
        })));
        let err = generator.generate(&greetings()).await.unwrap_err();
        match &err {
            GenerationError::ServiceFailure(message) => {
                assert!(message.contains("429"));
                assert!(message.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(generator.service.prompts.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn every_level_yields_cards_or_a_defined_error() {
        for difficulty in Difficulty::ALL {
            let request = GenerationRequest::new("Time & Dates", difficulty).unwrap();
            for reply in [Some(deck_json(3)), Some("[]".to_string()), Some("oops".to_string()), None] {
                let generator = DeckGenerator::new(FakeService::replying(Ok(reply)));
                match generator.generate(&request).await {
                    Ok(cards) => assert!(!cards.is_empty()),
                    Err(GenerationError::EmptyResponse)
                    | Err(GenerationError::MalformedResponse(_))
                    | Err(GenerationError::ServiceFailure(_)) => {}
                    Err(other) => panic!("unexpected error: {:?}", other),
                }
            }
        }
    }
}
