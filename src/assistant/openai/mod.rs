
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use ureq::unversioned::multipart::{Form, Part};

use super::{AnswerGenerator, SpeechSynthesizer, Transcriber};
use crate::config::OpenAiConfig;
use crate::openai::{OpenAiClient, ProviderError};
use crate::{RagError, Result};

const TRANSCRIPTIONS_PATH: &str = "v1/audio/transcriptions";
const CHAT_COMPLETIONS_PATH: &str = "v1/chat/completions";
const SPEECH_PATH: &str = "v1/audio/speech";

pub const SYSTEM_PROMPT: &str = "You are a friendly and capable financial assistant. \
Answer the user's question clearly and simply, using only the reference information provided. \
Do not guess at anything the information does not cover; say plainly that the information is insufficient.";

/// The user turn sent to the chat model: reference information, then the question.
#[inline]
pub fn build_user_prompt(context: &str, question: &str) -> String {
    format!(
        "### Reference information:\n{}\n\n### Question:\n{}\n\n### Answer:\n",
        context, question
    )
}

/// Best-effort MIME type for an audio upload, from its extension.
fn audio_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "mp3" | "mpga" | "mpeg" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" | "mp4" => "audio/mp4",
        "ogg" | "oga" => "audio/ogg",
        "webm" => "audio/webm",
        "flac" => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// File name sent in the upload's `Content-Disposition` header.
///
/// Quotes and line breaks are percent-encoded as browsers do for form
/// uploads, so a file name can never end the header early.
fn upload_file_name(path: &Path) -> String {
    let Some(name) = path.file_name() else {
        return "audio".to_string();
    };

    let mut escaped = String::new();
    for c in name.to_string_lossy().chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Speech-to-text through `/v1/audio/transcriptions`.
#[derive(Debug, Clone)]
pub struct OpenAiTranscriber {
    client: OpenAiClient,
    model: String,
    language: String,
}

impl OpenAiTranscriber {
    #[inline]
    pub fn new(client: OpenAiClient, config: &OpenAiConfig) -> Self {
        Self {
            client,
            model: config.transcription_model.clone(),
            language: config.language.clone(),
        }
    }
}

impl Transcriber for OpenAiTranscriber {
    #[inline]
    fn transcribe(&self, audio: &Path) -> Result<String> {
        info!("[STT] converting audio to text...");
        let data = fs::read(audio).map_err(|e| RagError::file(audio, e))?;
        let filename = upload_file_name(audio);
        let content_type = audio_content_type(audio);

        let transcript = self
            .client
            .post_multipart(TRANSCRIPTIONS_PATH, || {
                let file = Part::bytes(&data)
                    .file_name(&filename)
                    .mime_str(content_type)?;
                Ok(Form::new()
                    .text("model", &self.model)
                    .part("file", file)
                    .text("response_format", "text")
                    .text("language", &self.language))
            })?
            .trim()
            .to_string();
        info!("[STT] text converted: {}", transcript);
        Ok(transcript)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Answer generation through `/v1/chat/completions`.
#[derive(Debug, Clone)]
pub struct OpenAiChat {
    client: OpenAiClient,
    model: String,
    temperature: f32,
}

impl OpenAiChat {
    #[inline]
    pub fn new(client: OpenAiClient, config: &OpenAiConfig) -> Self {
        Self {
            client,
            model: config.chat_model.clone(),
            temperature: config.temperature,
        }
    }
}

impl AnswerGenerator for OpenAiChat {
    #[inline]
    fn answer(&self, question: &str, context: &str) -> Result<String> {
        info!("[LLM] generating response...");
        let user_prompt = build_user_prompt(context, question);
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &user_prompt,
                },
            ],
            temperature: self.temperature,
        };

        let response: ChatResponse = self.client.post_json(CHAT_COMPLETIONS_PATH, &request)?;
        let answer = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                ProviderError::InvalidResponse("Chat response has no message content".to_string())
            })?;

        info!("[LLM] answer generated: {}", answer);
        Ok(answer)
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
}

/// Text-to-speech through `/v1/audio/speech`.
#[derive(Debug, Clone)]
pub struct OpenAiSpeech {
    client: OpenAiClient,
    model: String,
    voice: String,
}

impl OpenAiSpeech {
    #[inline]
    pub fn new(client: OpenAiClient, config: &OpenAiConfig) -> Self {
        Self {
            client,
            model: config.speech_model.clone(),
            voice: config.voice.clone(),
        }
    }
}

impl SpeechSynthesizer for OpenAiSpeech {
    #[inline]
    fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        info!("[TTS] converting answer to speech...");
        let request = SpeechRequest {
            model: &self.model,
            voice: &self.voice,
            input: text,
        };

        let audio = self.client.post_json_for_bytes(SPEECH_PATH, &request)?;
        if audio.is_empty() {
            return Err(ProviderError::InvalidResponse("Speech response is empty".to_string()).into());
        }

        debug!("Received {} bytes of audio", audio.len());
        Ok(audio)
    }
}
