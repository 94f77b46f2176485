use anyhow::Result;
use azure_speech::{Auth, stream::StreamExt, synthesizer};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::TtsConfig;
use crate::models::FlashcardRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechLanguage {
    Chinese,
    Burmese,
}

impl SpeechLanguage {
    pub fn tag(&self) -> &'static str {
        match self {
            SpeechLanguage::Chinese => "zh-CN",
            SpeechLanguage::Burmese => "my-MM",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpeechLanguage::Chinese => "Chinese",
            SpeechLanguage::Burmese => "Burmese",
        }
    }

    /// The script-form text of a card in this language.
    pub fn text_of<'a>(&self, card: &'a FlashcardRecord) -> &'a str {
        match self {
            SpeechLanguage::Chinese => &card.translation_secondary,
            SpeechLanguage::Burmese => &card.translation_primary,
        }
    }

    fn synthesizer_config(&self) -> synthesizer::Config {
        match self {
            SpeechLanguage::Chinese => synthesizer::Config::new()
                .with_language(synthesizer::Language::ZhCn)
                .with_voice(synthesizer::Voice::ZhCnXiaoxiaoNeural),
            SpeechLanguage::Burmese => synthesizer::Config::new()
                .with_language(synthesizer::Language::MyMm)
                .with_voice(synthesizer::Voice::MyMmNilarNeural),
        }
    }
}

/// 发音输出文件路径：{audio_dir}/{tag}-{hash}.wav
pub fn audio_path(audio_dir: &Path, text: &str, language: SpeechLanguage) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    audio_dir.join(format!("{}-{:016x}.wav", language.tag(), hasher.finish()))
}

/// What a call to [`Pronouncer::speak`] did, for the review screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    Disabled,
    Cached(PathBuf),
    Started(PathBuf),
}

impl SpeechOutcome {
    pub fn notice(&self, language: SpeechLanguage) -> String {
        match self {
            SpeechOutcome::Disabled => {
                "Text-to-speech is not configured (add a [tts] section to config.toml)".to_string()
            }
            SpeechOutcome::Cached(path) => {
                format!("{} pronunciation already saved to {}", language.label(), path.display())
            }
            SpeechOutcome::Started(path) => {
                format!("Synthesising {} pronunciation to {}...", language.label(), path.display())
            }
        }
    }
}

/// Azure TTS 发音，失败只记录日志并通过 notices 通知界面
#[derive(Clone)]
pub struct Pronouncer {
    config: Option<TtsConfig>,
    notices: Option<mpsc::UnboundedSender<String>>,
}

impl Pronouncer {
    pub fn new(config: Option<TtsConfig>) -> Self {
        Self { config, notices: None }
    }

    /// 后台任务结束时把结果文字发到 `notices`
    pub fn with_notices(mut self, notices: mpsc::UnboundedSender<String>) -> Self {
        self.notices = Some(notices);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_some()
    }

    /// 后台合成，立即返回
    pub fn speak(&self, text: &str, language: SpeechLanguage) -> SpeechOutcome {
        let Some(config) = self.config.clone() else {
            debug!(lang = language.tag(), "text-to-speech not configured, skipping");
            return SpeechOutcome::Disabled;
        };

        let path = audio_path(Path::new(&config.audio_dir), text, language);
        if path.exists() {
            debug!(path = %path.display(), "audio already synthesised");
            return SpeechOutcome::Cached(path);
        }

        let text = text.to_string();
        let notices = self.notices.clone();
        let output = path.clone();
        tokio::spawn(async move {
            let notice = match synthesize_text_to_file(&config, &text, language, &output).await {
                Ok(()) => {
                    info!(path = %output.display(), lang = language.tag(), "pronunciation saved");
                    format!("{} pronunciation saved to {}", language.label(), output.display())
                }
                Err(e) => {
                    warn!(lang = language.tag(), "speech synthesis failed: {}", e);
                    format!("{} pronunciation failed: {}", language.label(), e)
                }
            };
            if let Some(notices) = notices {
                let _ = notices.send(notice);
            }
        });

        SpeechOutcome::Started(path)
    }
}

async fn synthesize_text_to_file(
    config: &TtsConfig,
    text: &str,
    language: SpeechLanguage,
    output_file: &Path,
) -> Result<()> {
    // 创建认证
    let auth = Auth::from_subscription(
        config.azure_speech_region.clone(),
        config.azure_speech_key.clone(),
    );

    let client = synthesizer::Client::connect(auth, language.synthesizer_config()).await?;
    let mut stream = client.synthesize(text).await?;

    // 收集音频数据
    let mut audio_data = Vec::new();

    while let Some(event_result) = stream.next().await {
        match event_result {
            Ok(synthesizer::Event::Synthesising(_, audio_chunk)) => {
                audio_data.extend_from_slice(&audio_chunk);
            }
            Ok(synthesizer::Event::Synthesised(_)) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(anyhow::anyhow!("error during speech synthesis: {}", e));
            }
        }
    }

    if audio_data.is_empty() {
        return Err(anyhow::anyhow!("no audio data received"));
    }

    // 确保目录存在
    if let Some(parent) = output_file.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| anyhow::anyhow!("cannot create directory {}: {}", parent.display(), e))?;
    }
    tokio::fs::write(output_file, &audio_data)
        .await
        .map_err(|e| anyhow::anyhow!("cannot write audio file {}: {}", output_file.display(), e))?;

    Ok(())
}
