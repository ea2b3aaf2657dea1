use crate::extractor::LopdfExtractor;
use crate::index::{EmbeddingIndex, DEFAULT_TOP_K};
use crate::ingest::{discover_manuals, ingest_files, SkippedPdf};
use crate::synthesizer::synthesize;
use crate::traits::{ChatModel, Embedder};
use crate::{AssistantError, IndexError, IndexState, RetrievalResult};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub struct IndexSummary {
    pub pages: usize,
    pub manuals: Vec<String>,
    pub skipped_files: Vec<SkippedPdf>,
}

/// Steps reported while the index is rebuilt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexProgress {
    Loading(String),
    RemovingPrevious(PathBuf),
    Embedding { pages: usize },
}

pub struct Answer {
    pub text: String,
    pub sources: Vec<RetrievalResult>,
}

/// Ties the pipeline together: ingestion into the index, and retrieval into
/// answer synthesis.
pub struct ManualAssistant<E, C>
where
    E: Embedder,
    C: ChatModel,
{
    embedder: E,
    chat_model: C,
    index_path: PathBuf,
    source_directory: PathBuf,
    top_k: usize,
}

impl<E, C> ManualAssistant<E, C>
where
    E: Embedder,
    C: ChatModel,
{
    pub fn new(
        embedder: E,
        chat_model: C,
        index_path: impl Into<PathBuf>,
        source_directory: impl Into<PathBuf>,
    ) -> Self {
        Self {
            embedder,
            chat_model,
            index_path: index_path.into(),
            source_directory: source_directory.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn source_directory(&self) -> &Path {
        &self.source_directory
    }

    pub fn manual_files(&self) -> Vec<PathBuf> {
        discover_manuals(&self.source_directory)
    }

    pub fn status(&self) -> Result<IndexState, IndexError> {
        EmbeddingIndex::state(&self.index_path)
    }

    /// Rebuilds the index from every readable manual in the source folder.
    ///
    /// An empty folder is reported as `NoDocumentsFound`, a folder whose PDFs
    /// all fail to parse as `AllManualsUnreadable`. In both cases the existing
    /// index is left as it was.
    pub fn index_manuals(&self) -> Result<IndexSummary, AssistantError> {
        self.index_manuals_with(|_| {})
    }

    pub fn index_manuals_with<F>(&self, mut progress: F) -> Result<IndexSummary, AssistantError>
    where
        F: FnMut(IndexProgress),
    {
        let files = discover_manuals(&self.source_directory);
        if files.is_empty() {
            warn!(folder = %self.source_directory.display(), "nothing to index");
            return Err(AssistantError::NoDocumentsFound(self.source_directory.clone()));
        }

        let report = ingest_files(&LopdfExtractor, files, |path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            progress(IndexProgress::Loading(name));
        });
        if report.pages.is_empty() {
            warn!(
                folder = %self.source_directory.display(),
                skipped = report.skipped_files.len(),
                "no readable manuals"
            );
            return Err(AssistantError::AllManualsUnreadable(report.skipped_files));
        }

        if self.index_path.exists() {
            progress(IndexProgress::RemovingPrevious(self.index_path.clone()));
        }

        let pages = report.pages.len();
        info!(pages, manuals = report.manuals.len(), "processing pages");
        progress(IndexProgress::Embedding { pages });
        EmbeddingIndex::rebuild(report.pages, &self.embedder, &self.index_path)?;

        Ok(IndexSummary {
            pages,
            manuals: report.manuals,
            skipped_files: report.skipped_files,
        })
    }

    pub fn retrieve(&self, question: &str) -> Result<Vec<RetrievalResult>, IndexError> {
        EmbeddingIndex::open(&self.index_path)?.query(question, &self.embedder, self.top_k)
    }

    pub fn ask(&self, question: &str) -> Result<Answer, AssistantError> {
        let sources = self.retrieve(question)?;
        info!(hits = sources.len(), "retrieved passages");
        let text = synthesize(question, &sources, &self.chat_model)?;
        Ok(Answer { text, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_embedder, write_pdf, FailingChatModel, RecordingChatModel};
    use tempfile::tempdir;

    #[test]
    fn ask_before_indexing_is_not_indexed() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let model = RecordingChatModel::replying("unused");
        let assistant = ManualAssistant::new(
            test_embedder(),
            &model,
            dir.path().join("index"),
            dir.path().join("manuals"),
        );

        let error = assistant.ask("Where is the fire exit?").err();

        assert!(error.as_ref().is_some_and(AssistantError::is_not_indexed));
        assert_eq!(model.calls.get(), 0);
        Ok(())
    }

    #[test]
    fn empty_source_folder_is_no_documents_found() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let manuals = dir.path().join("manuals");
        std::fs::create_dir(&manuals)?;
        let assistant = ManualAssistant::new(
            test_embedder(),
            RecordingChatModel::default(),
            dir.path().join("index"),
            &manuals,
        );

        let result = assistant.index_manuals();

        assert!(matches!(result, Err(AssistantError::NoDocumentsFound(_))));
        assert!(!assistant.status()?.is_ready());
        Ok(())
    }

    #[test]
    fn index_then_ask_grounds_the_prompt() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let manuals = dir.path().join("manuals");
        std::fs::create_dir(&manuals)?;
        write_pdf(
            &manuals.join("policy.pdf"),
            &["Vacation requests go to your manager", "Expenses need receipts"],
        )?;
        write_pdf(&manuals.join("safety.pdf"), &["Safety procedures require goggles"])?;

        let model = RecordingChatModel::replying("Wear goggles.");
        let index_path = dir.path().join("index");
        let assistant =
            ManualAssistant::new(test_embedder(), &model, &index_path, &manuals).with_top_k(2);

        let summary = assistant.index_manuals()?;
        assert_eq!(summary.pages, 3);
        assert_eq!(summary.manuals, vec!["policy".to_string(), "safety".to_string()]);
        assert_eq!(assistant.manual_files().len(), 2);
        assert!(assistant.status()?.is_ready());

        let answer = assistant.ask("safety procedures")?;

        assert_eq!(answer.text, "Wear goggles.");
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(model.calls.get(), 1);
        assert!(model.prompts.borrow()[0].contains("Question: safety procedures"));
        Ok(())
    }

    #[test]
    fn model_failure_surfaces_as_model_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let manuals = dir.path().join("manuals");
        std::fs::create_dir(&manuals)?;
        write_pdf(&manuals.join("safety.pdf"), &["Safety procedures require goggles"])?;

        let index_path = dir.path().join("index");
        let assistant =
            ManualAssistant::new(test_embedder(), FailingChatModel, &index_path, &manuals);
        assistant.index_manuals()?;

        assert!(matches!(
            assistant.ask("goggles?"),
            Err(AssistantError::Model(_))
        ));
        Ok(())
    }

    #[test]
    fn unreadable_manuals_are_reported_with_reasons() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let manuals = dir.path().join("manuals");
        std::fs::create_dir(&manuals)?;
        std::fs::write(manuals.join("broken.pdf"), b"%PDF-1.4\n%broken")?;
        let assistant = ManualAssistant::new(
            test_embedder(),
            RecordingChatModel::default(),
            dir.path().join("index"),
            &manuals,
        );

        match assistant.index_manuals() {
            Err(AssistantError::AllManualsUnreadable(skipped)) => {
                assert_eq!(skipped.len(), 1);
                assert!(skipped[0].path.ends_with("broken.pdf"));
                assert!(!skipped[0].reason.is_empty());
            }
            Err(other) => panic!("expected unreadable manuals, got {other}"),
            Ok(_) => panic!("indexing a broken pdf should fail"),
        }
        assert!(!assistant.status()?.is_ready());
        Ok(())
    }

    #[test]
    fn progress_reports_each_step() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let manuals = dir.path().join("manuals");
        std::fs::create_dir(&manuals)?;
        write_pdf(&manuals.join("policy.pdf"), &["Vacation requests go to your manager"])?;
        write_pdf(&manuals.join("safety.pdf"), &["Safety procedures require goggles"])?;
        let index_path = dir.path().join("index");
        let assistant = ManualAssistant::new(
            test_embedder(),
            RecordingChatModel::default(),
            &index_path,
            &manuals,
        );

        let mut first_run = Vec::new();
        assistant.index_manuals_with(|step| first_run.push(step))?;
        assert_eq!(
            first_run,
            vec![
                IndexProgress::Loading("policy.pdf".to_string()),
                IndexProgress::Loading("safety.pdf".to_string()),
                IndexProgress::Embedding { pages: 2 },
            ]
        );

        let mut second_run = Vec::new();
        assistant.index_manuals_with(|step| second_run.push(step))?;
        assert!(second_run.contains(&IndexProgress::RemovingPrevious(index_path.clone())));
        Ok(())
    }
}
