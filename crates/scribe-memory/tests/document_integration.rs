use std::sync::Arc;

use scribe_llm::mock::MockEmbedder;
use scribe_memory::document::{IngestionPipeline, ProcessingMethod, UploadedFile};
use scribe_memory::knowledge::{Filters, KnowledgeBase, SearchOptions, VectorKnowledgeIndex};
use scribe_memory::{InMemoryVectorStore, VectorStore};

const COLLECTION: &str = "test_knowledge";

fn knowledge_base(store: Arc<InMemoryVectorStore>) -> KnowledgeBase {
    let index = VectorKnowledgeIndex::new(Arc::new(MockEmbedder::new(64)), store, COLLECTION);
    KnowledgeBase::new(Arc::new(index))
}

fn user_filter(user: &str) -> Filters {
    [("user_id".to_owned(), serde_json::json!(user))]
        .into_iter()
        .collect()
}

fn uploads() -> Vec<UploadedFile> {
    vec![
        UploadedFile::new(
            "handbook.txt",
            Some("text/plain"),
            b"Vacation policy: employees get twenty days.\n\nExpense policy: receipts required."
                .to_vec(),
        ),
        UploadedFile::new(
            "staff.csv",
            None,
            b"name,team\nAda,compilers\nGrace,databases\n".to_vec(),
        ),
        UploadedFile::new(
            "faq.json",
            Some("application/json"),
            br#"[{"q": "parking", "a": "level two"}, {"q": "badges", "a": "front desk"}]"#.to_vec(),
        ),
        UploadedFile::new("scan.pdf", Some("application/pdf"), b"not a pdf".to_vec()),
    ]
}

#[tokio::test]
async fn ingest_batch_then_search() {
    let store = Arc::new(InMemoryVectorStore::new());
    let kb = knowledge_base(store.clone());

    let outcome = IngestionPipeline::default()
        .ingest(&kb, uploads(), false)
        .await
        .unwrap();

    assert_eq!(outcome.reports.len(), 4);
    assert_eq!(outcome.failed_files(), 1);
    assert!(outcome.reports[3].is_error());
    // 1 text chunk + 2 csv rows + 2 json items
    assert_eq!(outcome.loaded, 5);
    assert_eq!(store.count(COLLECTION).await.unwrap(), 5);

    let results = kb
        .search("vacation policy days", SearchOptions::default().with_limit(1))
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    let hit = &results[0].record;
    assert_eq!(hit.filename(), Some("handbook.txt"));
    assert_eq!(hit.processing_method(), Some(ProcessingMethod::TextChunking));
    assert!(hit.content.starts_with("Vacation policy"));
}

#[tokio::test]
async fn recreate_replaces_previous_contents() {
    let store = Arc::new(InMemoryVectorStore::new());
    let kb = knowledge_base(store.clone());
    let pipeline = IngestionPipeline::default();

    pipeline.ingest(&kb, uploads(), false).await.unwrap();
    let only_csv = vec![UploadedFile::new(
        "staff.csv",
        Some("text/csv"),
        b"name,team\nLinus,kernels\n".to_vec(),
    )];
    pipeline.ingest(&kb, only_csv, true).await.unwrap();

    assert_eq!(store.count(COLLECTION).await.unwrap(), 1);
}

#[tokio::test]
async fn reingesting_same_files_does_not_duplicate() {
    let store = Arc::new(InMemoryVectorStore::new());
    let kb = knowledge_base(store.clone());
    let pipeline = IngestionPipeline::default();

    pipeline.ingest(&kb, uploads(), false).await.unwrap();
    pipeline.ingest(&kb, uploads(), false).await.unwrap();

    assert_eq!(store.count(COLLECTION).await.unwrap(), 5);
}

#[tokio::test]
async fn per_user_knowledge_bases_share_an_index() {
    let store = Arc::new(InMemoryVectorStore::new());
    let index = Arc::new(VectorKnowledgeIndex::new(
        Arc::new(MockEmbedder::new(64)),
        store,
        COLLECTION,
    ));

    let alice = KnowledgeBase::new(index.clone()).with_filters(user_filter("alice"));
    let bob = KnowledgeBase::new(index).with_filters(user_filter("bob"));

    let doc = |body: &str| vec![UploadedFile::new("notes.txt", None, body.as_bytes().to_vec())];
    IngestionPipeline::default()
        .with_tag("user_id", "alice")
        .ingest(&alice, doc("alice likes hiking trips"), false)
        .await
        .unwrap();
    IngestionPipeline::default()
        .with_tag("user_id", "bob")
        .ingest(&bob, doc("bob likes hiking boots"), false)
        .await
        .unwrap();

    let results = alice
        .search("hiking", SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.content, "alice likes hiking trips");

    let results = alice
        .search(
            "hiking",
            SearchOptions::default().with_filters(user_filter("bob")),
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].record.metadata["user_id"], "bob");
}

#[tokio::test]
async fn all_failed_batch_loads_nothing() {
    let store = Arc::new(InMemoryVectorStore::new());
    let kb = knowledge_base(store.clone());

    let outcome = IngestionPipeline::default()
        .ingest(
            &kb,
            vec![UploadedFile::new("blob.bin", None, vec![0xff, 0xfe, 0x00])],
            false,
        )
        .await
        .unwrap();

    assert_eq!(outcome.loaded, 0);
    assert_eq!(outcome.failed_files(), 1);
    assert!(!store.collection_exists(COLLECTION).await.unwrap());
}
