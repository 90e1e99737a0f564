//! Knowledge base calls against a mock server

use ragchat_core::config::UploadConfig;
use ragchat_core::http::ClientError;
use ragchat_core::notify::{NoticeId, Notifier};
use ragchat_core::protocol::KnowledgeFile;
use ragchat_core::{ClientConfig, HttpClient, KnowledgeBaseClient};
use serde_json::json;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, header_regex, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Notifier that records what it was asked to show
#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn info(&self, message: &str) -> NoticeId {
        let mut events = self.events.lock().unwrap();
        events.push(format!("info: {}", message));
        NoticeId(events.len() as u64)
    }

    fn success(&self, message: &str) {
        self.events.lock().unwrap().push(format!("success: {}", message));
    }

    fn error(&self, message: &str) {
        self.events.lock().unwrap().push(format!("error: {}", message));
    }

    fn dismiss(&self, notice: NoticeId) {
        self.events.lock().unwrap().push(format!("dismiss: {}", notice.0));
    }
}

fn kb_for(server: &MockServer) -> (KnowledgeBaseClient, Arc<RecordingNotifier>) {
    let http = HttpClient::from_config(&ClientConfig::with_base_url(server.uri())).unwrap();
    let notifier = Arc::new(RecordingNotifier::default());
    let kb = KnowledgeBaseClient::new(http).with_notifier(notifier.clone());
    (kb, notifier)
}

#[tokio::test]
async fn test_list_files() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/knowledge-base"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "files": [
                {"name": "graph_rag.txt", "size": "12.50 KB"},
                {"name": "faq.txt", "size": "0.98 KB"}
            ]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (kb, notifier) = kb_for(&mock_server);
    let files = kb.list_files().await.unwrap();

    assert_eq!(
        files,
        vec![
            KnowledgeFile {
                name: "graph_rag.txt".to_string(),
                size: "12.50 KB".to_string()
            },
            KnowledgeFile {
                name: "faq.txt".to_string(),
                size: "0.98 KB".to_string()
            },
        ]
    );
    assert!(notifier.events().is_empty());
}

#[tokio::test]
async fn test_list_files_failure_notifies() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/knowledge-base"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "disk gone"})))
        .mount(&mock_server)
        .await;

    let (kb, notifier) = kb_for(&mock_server);
    let err = kb.list_files().await.unwrap_err();

    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("disk gone"));
    assert_eq!(notifier.events(), vec!["error: Failed to load the knowledge base"]);
}

#[tokio::test]
async fn test_upload_file_from_disk() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header_regex("content-type", "^multipart/form-data; boundary="))
        .and(body_string_contains("name=\"file\"; filename=\"notes.txt\""))
        .and(body_string_contains("Knowledge graphs link entities."))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "文件上传成功",
            "filename": "notes.txt",
            "size": 31
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "Knowledge graphs link entities.").unwrap();

    let (kb, notifier) = kb_for(&mock_server);
    let receipt = kb.upload_file(&file).await.unwrap();

    assert_eq!(receipt.filename, "notes.txt");
    assert_eq!(receipt.size, 31);
    assert_eq!(
        notifier.events(),
        vec![
            "info: Uploading notes.txt...",
            "dismiss: 1",
            "success: Uploaded notes.txt"
        ]
    );
}

/// Some servers answer a stored upload with only the name and size
#[tokio::test]
async fn test_upload_receipt_without_message() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(body_string_contains("filename=\"minutes.docx\""))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"filename": "minutes.docx", "size": 31})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let (kb, notifier) = kb_for(&mock_server);
    let receipt = kb
        .upload_bytes("minutes.docx", b"Knowledge graphs link entities.".to_vec())
        .await
        .unwrap();

    assert_eq!(receipt.filename, "minutes.docx");
    assert_eq!(receipt.size, 31);
    assert!(receipt.message.is_empty());
    assert_eq!(
        notifier.events().last().map(String::as_str),
        Some("success: Uploaded minutes.docx")
    );
}

#[tokio::test]
async fn test_delete_missing_file_detail_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/knowledge-base/gone.txt"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "文件不存在"})))
        .mount(&mock_server)
        .await;

    let (kb, _) = kb_for(&mock_server);
    match kb.delete_file("gone.txt").await {
        Err(ClientError::Status { status, message }) => {
            assert_eq!(status, 404);
            assert!(message.starts_with("文件不存在 [request_id: "), "got {message}");
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upload_rejected_by_server() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "不支持的文件类型"})))
        .mount(&mock_server)
        .await;

    let (kb, notifier) = kb_for(&mock_server);
    let err = kb
        .upload_bytes("notes.txt", b"hello".to_vec())
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(400));
    assert!(!err.is_retryable());
    assert_eq!(
        notifier.events().last().map(String::as_str),
        Some("error: Upload of notes.txt failed")
    );
}

#[tokio::test]
async fn test_upload_rejected_locally_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let (kb, notifier) = kb_for(&mock_server);
    let kb = kb.with_upload_config(UploadConfig {
        max_file_size_bytes: 8,
        allowed_extensions: vec!["txt".to_string(), "md".to_string()],
    });

    let wrong_type = kb.upload_bytes("paper.pdf", vec![1, 2, 3]).await;
    assert!(matches!(wrong_type, Err(ClientError::InvalidUpload { .. })));

    let too_big = kb.upload_bytes("long.md", vec![b'x'; 9]).await;
    match too_big {
        Err(ClientError::InvalidUpload { filename, reason }) => {
            assert_eq!(filename, "long.md");
            assert!(reason.contains("limit"));
        }
        other => panic!("Expected InvalidUpload, got {:?}", other),
    }

    assert!(notifier.events().is_empty());
}

#[tokio::test]
async fn test_upload_missing_file() {
    let mock_server = MockServer::start().await;
    let (kb, _) = kb_for(&mock_server);
    let dir = TempDir::new().unwrap();

    let result = kb.upload_file(dir.path().join("absent.txt")).await;
    assert!(matches!(result, Err(ClientError::Io { .. })));
}

#[tokio::test]
async fn test_delete_file_encodes_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/knowledge-base/meeting%20notes.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "文件删除成功"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let (kb, notifier) = kb_for(&mock_server);
    let reply = kb.delete_file("meeting notes.txt").await.unwrap();

    assert_eq!(reply.message, "文件删除成功");
    assert_eq!(
        notifier.events(),
        vec![
            "info: Deleting meeting notes.txt...",
            "dismiss: 1",
            "success: Deleted meeting notes.txt"
        ]
    );
}

#[tokio::test]
async fn test_delete_missing_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/api/knowledge-base/gone.txt"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "文件不存在"})))
        .mount(&mock_server)
        .await;

    let (kb, notifier) = kb_for(&mock_server);
    let err = kb.delete_file("gone.txt").await.unwrap_err();

    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 404);
            assert!(message.contains("文件不存在"));
        }
        other => panic!("Expected Status error, got {:?}", other),
    }
    assert_eq!(
        notifier.events().last().map(String::as_str),
        Some("error: Failed to delete gone.txt")
    );
}
