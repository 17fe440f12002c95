// SPDX-License-Identifier: PMPL-1.0-or-later
//
// Human-readable error messages for the presentation layer.
//
// Every pipeline error is mapped to plain English with a suggestion and a
// surface hint: batch-level problems belong in a dismissible banner, per-job
// problems inline on the affected result card.

use crate::error::LesewerkError;

/// Where the presentation layer should show a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Batch-level — engine failure, skipped document, unreadable file.
    Banner,
    /// Scoped to one result card.
    ResultCard,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub surface: Surface,
}

/// Fallback shown when a recognition failure carries no message of its own.
pub const GENERIC_RECOGNITION_FAILURE: &str = "Text recognition failed for this page.";

/// Convert a `LesewerkError` into something a user can act on.
pub fn humanize_error(err: &LesewerkError) -> HumanError {
    match err {
        LesewerkError::EngineInit(detail) => HumanError {
            message: "The text recognition engine could not start.".into(),
            suggestion: format!(
                "Check that the OCR model files are installed, then try again. ({detail})"
            ),
            surface: Surface::Banner,
        },

        LesewerkError::Recognition(detail) => HumanError {
            message: if detail.is_empty() {
                GENERIC_RECOGNITION_FAILURE.into()
            } else {
                format!("Text recognition failed: {detail}")
            },
            suggestion: "Try a sharper scan or a higher-resolution image.".into(),
            surface: Surface::ResultCard,
        },

        LesewerkError::RendererUnavailable(detail) => HumanError {
            message: "PDF files can't be processed right now — images still work.".into(),
            suggestion: format!(
                "Install the PDF rendering library or point the configuration at it. ({detail})"
            ),
            surface: Surface::Banner,
        },

        LesewerkError::PageRender { page, reason } => HumanError {
            message: format!("Page {page} could not be rendered."),
            suggestion: format!("The page may be damaged. ({reason})"),
            surface: Surface::ResultCard,
        },

        LesewerkError::InputRead { name, .. } => HumanError {
            message: format!("\"{name}\" could not be read."),
            suggestion: "The file may have been moved or deleted. Add it again.".into(),
            surface: Surface::Banner,
        },

        LesewerkError::ImageDecode(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. \
                         Try saving it as a PNG or JPEG first."
                .into(),
            surface: Surface::ResultCard,
        },

        LesewerkError::Io(detail) => HumanError {
            message: "A file operation failed.".into(),
            suggestion: format!("({detail})"),
            surface: Surface::Banner,
        },

        LesewerkError::Serialization(detail) => HumanError {
            message: "Results could not be exported.".into(),
            suggestion: format!("({detail})"),
            surface: Surface::Banner,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failures_go_to_the_banner() {
        let human = humanize_error(&LesewerkError::EngineInit("no models".into()));
        assert_eq!(human.surface, Surface::Banner);
        assert!(human.suggestion.contains("no models"));
    }

    #[test]
    fn recognition_failures_stay_on_the_card() {
        let human = humanize_error(&LesewerkError::Recognition("bad input".into()));
        assert_eq!(human.surface, Surface::ResultCard);
    }

    #[test]
    fn messageless_recognition_uses_the_generic_fallback() {
        let human = humanize_error(&LesewerkError::Recognition(String::new()));
        assert_eq!(human.message, GENERIC_RECOGNITION_FAILURE);
    }

    #[test]
    fn renderer_unavailable_mentions_images_still_work() {
        let human = humanize_error(&LesewerkError::RendererUnavailable("not found".into()));
        assert_eq!(human.surface, Surface::Banner);
        assert!(human.message.contains("images still work"));
    }
}
