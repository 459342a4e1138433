//! The spoken question-answering loop: transcribe, retrieve, answer,
//! synthesize, play. Each stage is one blocking call and runs only after the
//! previous one has finished.


pub mod openai;
pub mod playback;

pub use openai::{OpenAiChat, OpenAiSpeech, OpenAiTranscriber};
pub use playback::Player;

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{RagError, Result};
use crate::config::{AssistantConfig, Config};
use crate::embeddings::{EmbeddingProvider, OpenAiEmbedder};
use crate::openai::OpenAiClient;
use crate::retrieval::Retriever;

/// Speech-to-text stage.
pub trait Transcriber {
    fn transcribe(&self, audio: &Path) -> Result<String>;
}

/// Produces an answer to `question` grounded in `context`.
pub trait AnswerGenerator {
    fn answer(&self, question: &str, context: &str) -> Result<String>;
}

/// Text-to-speech stage returning encoded audio.
pub trait SpeechSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// A generated answer and the context it was generated from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub question: String,
    pub context: String,
    pub text: String,
}

/// What happened to synthesized speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechOutcome {
    /// Played and removed.
    Played,
    /// No player configured; the audio was left at this path.
    Saved(PathBuf),
}

/// Result of a full voice round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceReply {
    pub transcript: String,
    pub answer: Answer,
    pub speech: SpeechOutcome,
}

pub struct VoiceAssistant<E> {
    retriever: Retriever<E>,
    transcriber: Box<dyn Transcriber>,
    generator: Box<dyn AnswerGenerator>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    player: Option<Player>,
    speech_file: PathBuf,
}

impl VoiceAssistant<OpenAiEmbedder> {
    /// Wire every stage to the OpenAI API described by `config`.
    #[inline]
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = OpenAiClient::new(&config.openai)?;
        let embedder = OpenAiEmbedder::new(client.clone(), &config.openai);

        Ok(Self::new(
            Retriever::from_config(embedder, config),
            Box::new(OpenAiTranscriber::new(client.clone(), &config.openai)),
            Box::new(OpenAiChat::new(client.clone(), &config.openai)),
            Box::new(OpenAiSpeech::new(client, &config.openai)),
            &config.assistant,
        ))
    }
}

impl<E: EmbeddingProvider> VoiceAssistant<E> {
    #[inline]
    pub fn new(
        retriever: Retriever<E>,
        transcriber: Box<dyn Transcriber>,
        generator: Box<dyn AnswerGenerator>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        config: &AssistantConfig,
    ) -> Self {
        Self {
            retriever,
            transcriber,
            generator,
            synthesizer,
            player: config.player.as_deref().and_then(Player::parse),
            speech_file: config.speech_file.clone(),
        }
    }

    #[inline]
    pub fn retriever(&mut self) -> &mut Retriever<E> {
        &mut self.retriever
    }

    /// Retrieve context for `question` and generate an answer from it.
    #[inline]
    pub fn ask(&mut self, question: &str, k: Option<usize>) -> Result<Answer> {
        let context = self.retriever.get_context(question, k)?;
        let text = self.generator.answer(question, &context)?;
        Ok(Answer {
            question: question.to_string(),
            context,
            text,
        })
    }

    /// Synthesize `text` into the speech file and play it if a player is configured.
    ///
    /// A played file is removed afterwards; without a player it is kept.
    #[inline]
    pub fn speak(&self, text: &str) -> Result<SpeechOutcome> {
        let audio = self.synthesizer.synthesize(text)?;

        if let Some(parent) = self
            .speech_file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
        {
            fs::create_dir_all(parent).map_err(|e| RagError::file(parent, e))?;
        }
        fs::write(&self.speech_file, &audio)
            .map_err(|e| RagError::file(&self.speech_file, e))?;

        let Some(player) = &self.player else {
            info!("[TTS] speech saved to {}", self.speech_file.display());
            return Ok(SpeechOutcome::Saved(self.speech_file.clone()));
        };

        info!("[TTS] playing speech...");
        let played = player.play(&self.speech_file);
        if let Err(e) = fs::remove_file(&self.speech_file) {
            warn!(
                "Failed to remove speech file {}: {}",
                self.speech_file.display(),
                e
            );
        }
        played?;

        Ok(SpeechOutcome::Played)
    }

    /// Full pipeline for one recorded question.
    #[inline]
    pub fn process_voice_query(&mut self, audio: &Path, k: Option<usize>) -> Result<VoiceReply> {
        let transcript = self.transcriber.transcribe(audio)?;
        let answer = self.ask(&transcript, k)?;
        let speech = self.speak(&answer.text)?;

        Ok(VoiceReply {
            transcript,
            answer,
            speech,
        })
    }
}
