use crate::ModelError;

/// Text to fixed-dimension vector. Implementations must return vectors of
/// exactly `dimensions()` entries.
pub trait Embedder {
    fn name(&self) -> String;

    fn dimensions(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError>;
}

/// Prompt in, completion text out. One blocking call per invocation.
pub trait ChatModel {
    fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

impl<T: Embedder + ?Sized> Embedder for &T {
    fn name(&self) -> String {
        (**self).name()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        (**self).embed(text)
    }
}

impl<T: Embedder + ?Sized> Embedder for Box<T> {
    fn name(&self) -> String {
        (**self).name()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, ModelError> {
        (**self).embed(text)
    }
}

impl<T: ChatModel + ?Sized> ChatModel for &T {
    fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        (**self).generate(prompt)
    }
}

impl<T: ChatModel + ?Sized> ChatModel for Box<T> {
    fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        (**self).generate(prompt)
    }
}
