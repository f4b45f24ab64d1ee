//! Generation flow — prompt → copy blocks (+ optional image and palettes).
//!
//! Text failure aborts the flow. Image failure only drops the image block, and a
//! failed color extraction only drops back to the neutral palette.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::blocks::{Block, BlockKind};
use crate::generation::backend::GenerationBackend;
use crate::generation::content::{parse_generated_content, GeneratedContent};
use crate::layout::geometry::HERO_WEIGHT;
use crate::llm_client::prompts::image_prompt;
use crate::llm_client::UpstreamError;
use crate::palette::{palettes_from_image, Palette};

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("Failed to generate text content: {0}")]
    TextService(#[source] UpstreamError),

    #[error("Generated content appears to be empty or invalid")]
    EmptyContent,

    #[error("a generation is already in progress")]
    Busy,
}

impl GenerationError {
    /// Copy shown to the person who asked for the design.
    pub fn user_message(&self) -> &'static str {
        match self {
            GenerationError::EmptyPrompt => {
                "Please enter a description for what you want to create."
            }
            GenerationError::TextService(_) => {
                "The AI text service is currently unavailable. Please try again in a moment."
            }
            GenerationError::EmptyContent => {
                "The AI couldn't generate content for that prompt. Try a more specific description."
            }
            GenerationError::Busy => {
                "A design is already being generated. Please wait for it to finish."
            }
        }
    }

    /// Whether offering a retry of the same prompt makes sense.
    pub fn can_retry(&self) -> bool {
        matches!(
            self,
            GenerationError::TextService(_) | GenerationError::EmptyContent
        )
    }
}

/// Everything a successful generation produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedDesign {
    pub prompt: String,
    pub content: GeneratedContent,
    pub blocks: Vec<Block>,
    pub image_url: Option<String>,
    /// True when the image step failed and the design is text-only.
    pub image_failed: bool,
    /// Palettes derived from the image; empty when there is no image.
    pub palettes: Vec<Palette>,
    pub generated_at: DateTime<Utc>,
}

/// Copy blocks in display order: header (hero), subheader, body, caption, logo.
/// Captions become body blocks.
pub fn content_blocks(content: &GeneratedContent) -> Vec<Block> {
    let mut blocks = Vec::new();
    if !content.header.is_empty() {
        blocks.push(
            Block::text(BlockKind::Header, &content.header)
                .hero()
                .with_weight(HERO_WEIGHT),
        );
    }
    for (kind, text) in [
        (BlockKind::Subheader, &content.subheader),
        (BlockKind::Body, &content.body),
        (BlockKind::Body, &content.caption),
        (BlockKind::Logo, &content.logo),
    ] {
        if !text.is_empty() {
            blocks.push(Block::text(kind, text.as_str()));
        }
    }
    blocks
}

/// Runs the full flow against `backend`.
pub async fn generate_design(
    prompt: &str,
    style_id: Option<&str>,
    backend: &dyn GenerationBackend,
) -> Result<GeneratedDesign, GenerationError> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(GenerationError::EmptyPrompt);
    }

    let raw = backend.generate_text(prompt).await.map_err(|e| {
        warn!(error = %e, "Text generation failed");
        GenerationError::TextService(e)
    })?;

    let content = parse_generated_content(&raw);
    if !content.has_text() {
        return Err(GenerationError::EmptyContent);
    }
    if !content.has_header() {
        warn!("Generated content has no header");
    }

    let mut blocks = content_blocks(&content);

    let image_url = match backend.generate_image(&image_prompt(prompt), style_id).await {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(error = %e, "Image generation failed, continuing without image");
            None
        }
    };

    let mut palettes = Vec::new();
    if let Some(url) = &image_url {
        blocks.push(Block::image(url.as_str(), None).preserving_aspect(false));
        palettes = image_palettes(backend, url).await;
    }

    info!(
        blocks = blocks.len(),
        has_image = image_url.is_some(),
        palettes = palettes.len(),
        "Design generated"
    );

    Ok(GeneratedDesign {
        prompt: prompt.to_string(),
        content,
        blocks,
        image_failed: image_url.is_none(),
        image_url,
        palettes,
        generated_at: Utc::now(),
    })
}

async fn image_palettes(backend: &dyn GenerationBackend, url: &str) -> Vec<Palette> {
    let bytes = match backend.fetch_image(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(error = %e, "Could not download generated image, using fallback palette");
            return vec![Palette::default()];
        }
    };

    // decoding is CPU-bound
    tokio::task::spawn_blocking(move || palettes_from_image(&bytes))
        .await
        .unwrap_or_else(|e| {
            warn!(error = %e, "Color extraction task failed, using fallback palette");
            vec![Palette::default()]
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Session
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct LastRequest {
    prompt: String,
    style_id: Option<String>,
}

/// Serializes generations and remembers the last request for retry.
#[derive(Debug, Default)]
pub struct GenerationSession {
    in_flight: AtomicBool,
    last: Mutex<Option<LastRequest>>,
}

/// Clears the in-flight flag when the generation ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl GenerationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|r| r.prompt.clone())
    }

    /// Runs a generation unless one is already running.
    pub async fn generate(
        &self,
        prompt: &str,
        style_id: Option<&str>,
        backend: &dyn GenerationBackend,
    ) -> Result<GeneratedDesign, GenerationError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(GenerationError::Busy);
        }
        let _guard = InFlight(&self.in_flight);

        *self.last.lock().unwrap_or_else(|e| e.into_inner()) = Some(LastRequest {
            prompt: prompt.to_string(),
            style_id: style_id.map(str::to_string),
        });

        generate_design(prompt, style_id, backend).await
    }

    /// Re-runs the last request. Fails with `EmptyPrompt` when there is none.
    pub async fn retry(
        &self,
        backend: &dyn GenerationBackend,
    ) -> Result<GeneratedDesign, GenerationError> {
        let last = self
            .last
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(GenerationError::EmptyPrompt)?;
        self.generate(&last.prompt, last.style_id.as_deref(), backend)
            .await
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::backend::tests::MockBackend;
    use crate::palette::Color;
    use image::{ImageFormat, Rgb, RgbImage};
    use std::io::Cursor;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tokio::sync::Notify;

    fn png_bytes() -> Vec<u8> {
        let img = RgbImage::from_pixel(8, 8, Rgb([220, 20, 60]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected_without_calls() {
        let backend = MockBackend::new(Some("HEADER: x"), None);
        let err = generate_design("   ", None, &backend).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyPrompt));
        assert!(!err.can_retry());
        assert_eq!(backend.text_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_text_failure_aborts_before_image() {
        let backend = MockBackend::new(None, Some("https://img/1.png"));
        let err = generate_design("a sale", None, &backend).await.unwrap_err();
        assert!(matches!(err, GenerationError::TextService(_)));
        assert!(err.can_retry());
        assert_eq!(backend.image_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_content_has_distinct_message() {
        let backend = MockBackend::new(Some("Sorry, I can't help with that."), None);
        let err = generate_design("???", None, &backend).await.unwrap_err();
        assert!(matches!(err, GenerationError::EmptyContent));
        assert_ne!(
            err.user_message(),
            GenerationError::TextService(UpstreamError::EmptyContent("x")).user_message()
        );
    }

    #[tokio::test]
    async fn test_header_only_with_failed_image_is_text_only() {
        let backend = MockBackend::new(Some("HEADER: Sale Now"), None);
        let design = generate_design("big sale", None, &backend).await.unwrap();
        assert_eq!(design.blocks.len(), 1);
        let header = &design.blocks[0];
        assert_eq!(header.kind, BlockKind::Header);
        assert!(header.is_hero);
        assert_eq!(header.size_weight, HERO_WEIGHT);
        assert!(design.image_failed);
        assert!(design.image_url.is_none());
        assert!(design.palettes.is_empty());
        assert_eq!(backend.image_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_full_generation_builds_blocks_in_order() {
        let text = "HEADER: Fresh Bread\nSUBHEADER: Daily\nBODY: Loaves\nCAPTION: Call us\nLOGO: Crumb";
        let backend = MockBackend::new(Some(text), Some("https://img/1.png"))
            .with_image_bytes(png_bytes());
        let design = generate_design("bakery", Some("style-1"), &backend)
            .await
            .unwrap();

        let kinds: Vec<BlockKind> = design.blocks.iter().map(|b| b.kind).collect();
        assert_eq!(
            kinds,
            vec![
                BlockKind::Header,
                BlockKind::Subheader,
                BlockKind::Body,
                BlockKind::Body,
                BlockKind::Logo,
                BlockKind::Image,
            ]
        );
        let image = design.blocks.last().unwrap();
        assert!(!image.preserve_aspect);
        assert!(!design.image_failed);
        assert_eq!(design.palettes[0].accent, Color::rgb(220, 20, 60));
    }

    #[tokio::test]
    async fn test_unreadable_image_falls_back_to_neutral_palette() {
        let backend = MockBackend::new(Some("HEADER: Hi"), Some("https://img/1.png"))
            .with_image_bytes(b"not a png".to_vec());
        let design = generate_design("hi", None, &backend).await.unwrap();
        assert_eq!(design.palettes, vec![Palette::default()]);
        assert_eq!(design.blocks.len(), 2);
    }

    #[tokio::test]
    async fn test_session_remembers_prompt_for_retry() {
        let session = GenerationSession::new();
        let backend = MockBackend::new(None, None);
        assert!(session.generate("  launch party ", None, &backend).await.is_err());
        assert_eq!(session.last_prompt().as_deref(), Some("launch party"));

        let err = session.retry(&backend).await.unwrap_err();
        assert!(matches!(err, GenerationError::TextService(_)));
        assert_eq!(backend.text_calls.load(Ordering::SeqCst), 2);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_retry_without_history_is_empty_prompt() {
        let session = GenerationSession::new();
        let backend = MockBackend::new(Some("HEADER: x"), None);
        assert!(matches!(
            session.retry(&backend).await,
            Err(GenerationError::EmptyPrompt)
        ));
    }

    /// Blocks inside the text call until released.
    struct GatedBackend {
        entered: Notify,
        release: Notify,
    }

    #[async_trait::async_trait]
    impl GenerationBackend for GatedBackend {
        async fn generate_text(&self, _prompt: &str) -> Result<String, UpstreamError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok("HEADER: Done".to_string())
        }

        async fn generate_image(
            &self,
            _prompt: &str,
            _style_id: Option<&str>,
        ) -> Result<String, UpstreamError> {
            Err(UpstreamError::MissingKey("RECRAFT_API_KEY"))
        }

        async fn fetch_image(&self, _url: &str) -> Result<Vec<u8>, UpstreamError> {
            Err(UpstreamError::MissingKey("RECRAFT_API_KEY"))
        }
    }

    #[tokio::test]
    async fn test_second_concurrent_request_is_busy() {
        let session = Arc::new(GenerationSession::new());
        let backend = Arc::new(GatedBackend {
            entered: Notify::new(),
            release: Notify::new(),
        });

        let first = {
            let session = session.clone();
            let backend = backend.clone();
            tokio::spawn(async move { session.generate("first", None, backend.as_ref()).await })
        };
        backend.entered.notified().await;
        assert!(session.is_busy());

        let second = session.generate("second", None, backend.as_ref()).await;
        assert!(matches!(second, Err(GenerationError::Busy)));
        assert!(!GenerationError::Busy.can_retry());

        backend.release.notify_one();
        let design = first.await.unwrap().unwrap();
        assert_eq!(design.content.header, "Done");
        assert!(!session.is_busy());
        assert_eq!(session.last_prompt().as_deref(), Some("first"));
    }
}
