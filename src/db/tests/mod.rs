
use super::Database;
use tempfile::NamedTempFile;

/// Helper to create a fresh on-disk test database.
///
/// Returns the temp file alongside the handle so the file outlives the test.
async fn setup_db() -> (Database, NamedTempFile) {
    let temp_file = NamedTempFile::new().unwrap();
    let db = Database::new(temp_file.path()).await.unwrap();
    (db, temp_file)
}

fn stub(source_id: &str) -> crate::types::ArticleStub {
    crate::types::ArticleStub {
        source_id: source_id.to_string(),
        source_url: format!("https://news.example.com/show-{}.html", source_id),
        title: format!("Article {}", source_id),
        category: "经济".to_string(),
        publish_time: None,
        site_status: "通过".to_string(),
    }
}
