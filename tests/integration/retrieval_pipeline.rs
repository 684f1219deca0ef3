//! Corpus loading and retrieval through the public API.

use super::test_utils::MemorySink;
use std::sync::Arc;
use tempfile::TempDir;
use widgetforge::retrieval::{
    Corpus, CorpusEntry, HashingEncoder, QueryEncoder, SimilarityRetriever,
};
use widgetforge::sink::FileArtifactSink;
use widgetforge::RetrievalService;

fn write_corpus(dir: &TempDir, encoder: &HashingEncoder) -> std::path::PathBuf {
    let rows = [
        ("login form with email and password", "forms"),
        ("profile card with avatar", "cards"),
        ("settings list with switches", "lists"),
    ];
    let entries = rows
        .iter()
        .map(|(prompt, category)| CorpusEntry {
            prompt: prompt.to_string(),
            code: format!(
                "class MyWidget extends StatelessWidget {{\n  // {}\n}}",
                prompt
            ),
            category: category.to_string(),
            embedding: encoder.embed(prompt),
        })
        .collect();
    let corpus = Corpus::from_entries(Some(encoder.model_name().to_string()), entries).unwrap();
    let path = dir.path().join("corpus.json");
    std::fs::write(&path, corpus.to_json_string().unwrap()).unwrap();
    path
}

#[tokio::test]
async fn test_retrieval_service_serves_closest_entry() {
    let dir = TempDir::new().unwrap();
    let encoder = HashingEncoder::new(256).unwrap();
    let path = write_corpus(&dir, &encoder);

    let retriever = Arc::new(SimilarityRetriever::new(Arc::new(encoder)));
    assert!(retriever.load(&path));
    assert_eq!(retriever.corpus().unwrap().len(), 3);

    let widgets_dir = dir.path().join("lib").join("widgets");
    let sink = Arc::new(FileArtifactSink::new(&widgets_dir));
    let service = RetrievalService::new(retriever, 3, 0.2, sink);
    let result = service.generate("profile card with avatar").await.unwrap();

    assert!(result.success);
    assert_eq!(result.identifier_name, "TrainingModelGeneratedWidget");
    assert!(result.code.contains("profile card"));
    assert!(result.code.contains("class TrainingModelGeneratedWidget"));
    assert_eq!(result.aux_structure.unwrap()["category"], "cards");
    assert!(result.similarity_score.unwrap() > 0.99);

    let written =
        std::fs::read_to_string(widgets_dir.join("training_model_generated_widget.dart")).unwrap();
    assert_eq!(written, result.code);
}

#[tokio::test]
async fn test_unrelated_prompt_below_threshold_falls_back() {
    let dir = TempDir::new().unwrap();
    let encoder = HashingEncoder::new(256).unwrap();
    let path = write_corpus(&dir, &encoder);

    let retriever = Arc::new(SimilarityRetriever::new(Arc::new(encoder)));
    assert!(retriever.load(&path));
    let service = RetrievalService::new(retriever, 1, 1.01, Arc::new(MemorySink::default()));
    let result = service.generate("login form with email and password").await.unwrap();

    assert!(!result.success);
    assert!(result.error.is_some());
    assert!(result.code.contains("class TrainingModelGeneratedWidget"));
}

#[test]
fn test_mismatched_rows_fail_to_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("corpus.json");
    std::fs::write(
        &path,
        r#"{"train_data": [{"prompt": "a", "flutter_code": "class A {}"}], "train_embeddings": []}"#,
    )
    .unwrap();

    let retriever = SimilarityRetriever::new(Arc::new(HashingEncoder::new(4).unwrap()));
    assert!(!retriever.load(&path));
    assert!(!retriever.is_loaded());
}
