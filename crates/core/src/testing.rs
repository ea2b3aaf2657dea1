//! Fixtures shared by the unit tests.

use crate::traits::{ChatModel, Embedder};
use crate::{CharacterNgramEmbedder, ModelError};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::cell::{Cell, RefCell};
use std::path::Path;

/// Writes a PDF with one text line per page.
pub fn write_pdf(path: &Path, pages: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

/// Chat model stand-in that records every prompt it receives.
#[derive(Default)]
pub struct RecordingChatModel {
    pub reply: String,
    pub calls: Cell<usize>,
    pub prompts: RefCell<Vec<String>>,
}

impl RecordingChatModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }
}

impl ChatModel for RecordingChatModel {
    fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.calls.set(self.calls.get() + 1);
        self.prompts.borrow_mut().push(prompt.to_string());
        Ok(self.reply.clone())
    }
}

pub struct FailingChatModel;

impl ChatModel for FailingChatModel {
    fn generate(&self, _prompt: &str) -> Result<String, ModelError> {
        Err(ModelError::BackendResponse {
            backend: "fake".to_string(),
            details: "503 Service Unavailable".to_string(),
        })
    }
}

/// Embedder whose calls fail, for exercising rebuild cleanup.
pub struct FailingEmbedder;

impl Embedder for FailingEmbedder {
    fn name(&self) -> String {
        "failing".to_string()
    }

    fn dimensions(&self) -> usize {
        4
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, ModelError> {
        Err(ModelError::EmptyResponse {
            backend: "fake".to_string(),
        })
    }
}

pub fn test_embedder() -> CharacterNgramEmbedder {
    CharacterNgramEmbedder::new(256)
}
