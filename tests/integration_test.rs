use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use base64::Engine;
use base64::prelude::BASE64_STANDARD;
use chunkpost::{
    ChunkProgress, ChunkRecord, ChunkedConfig, ChunkedUploader, Config, HttpTransport,
    MemorySource, ProgressCallback, UploadError,
};
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// 模拟接收端 - 最后一个分片返回完成
struct ChunkReceiver {
    fail_at: Option<(usize, u16)>,
    complete: bool,
}

impl ChunkReceiver {
    fn completing() -> Self {
        Self { fail_at: None, complete: true }
    }

    fn never_completing() -> Self {
        Self { fail_at: None, complete: false }
    }

    fn failing_at(index: usize, status: u16) -> Self {
        Self { fail_at: Some((index, status)), complete: true }
    }
}

impl Respond for ChunkReceiver {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let chunk: ChunkRecord = match request.body_json() {
            Ok(chunk) => chunk,
            Err(_) => return ResponseTemplate::new(400),
        };

        if let Some((index, status)) = self.fail_at {
            if chunk.chunk_index == index {
                return ResponseTemplate::new(status).set_body_string("disk full");
            }
        }

        if self.complete && chunk.current_chunk == chunk.total_chunks {
            ResponseTemplate::new(200).set_body_json(json!({
                "id": "obj-1",
                "filename": "benchy.stl",
                "size": 12 * 1024,
                "filetype": chunk.filetype,
                "url": "https://cdn.example.com/media/benchy.stl",
                "complete": true,
            }))
        } else {
            ResponseTemplate::new(200).set_body_json(json!({
                "received": chunk.current_chunk,
                "total": chunk.total_chunks,
                "complete": false,
            }))
        }
    }
}

fn model(len: usize) -> (Vec<u8>, MemorySource) {
    let data: Vec<u8> = (0..len).map(|i| (i * 31 % 256) as u8).collect();
    (data.clone(), MemorySource::new("benchy.stl", data))
}

async fn sent_chunks(server: &MockServer) -> Vec<ChunkRecord> {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .map(|request| request.body_json::<ChunkRecord>().unwrap())
        .collect()
}

#[tokio::test]
async fn test_upload_against_receiver() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(header("content-type", "application/json"))
        .respond_with(ChunkReceiver::completing())
        .expect(3)
        .mount(&server)
        .await;

    let uploader = ChunkedUploader::new(&server.uri(), ChunkedConfig { chunk_size: 5 * 1024 }).unwrap();
    let (data, source) = model(12 * 1024);

    let seen = Arc::new(Mutex::new(Vec::<ChunkProgress>::new()));
    let sink = seen.clone();
    let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));

    let upload = uploader.upload(&source, Some(&callback)).await.unwrap().unwrap();
    assert_eq!(upload.url, "https://cdn.example.com/media/benchy.stl");
    assert_eq!(upload.filetype, "stl");

    let chunks = sent_chunks(&server).await;
    let indices: Vec<usize> = chunks.iter().map(|c| c.chunk_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    assert!(chunks.iter().all(|c| c.id == chunks[0].id && c.total_chunks == 3));

    let reassembled: Vec<u8> = chunks
        .iter()
        .flat_map(|c| BASE64_STANDARD.decode(&c.data).unwrap())
        .collect();
    assert_eq!(reassembled, data);

    let percentages: Vec<f64> = seen.lock().unwrap().iter().map(|p| p.percentage).collect();
    assert_eq!(percentages.len(), 3);
    assert_eq!(percentages[2], 100.0);
}

#[tokio::test]
async fn test_server_error_aborts_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ChunkReceiver::failing_at(1, 500))
        .mount(&server)
        .await;

    let uploader = ChunkedUploader::new(&server.uri(), ChunkedConfig { chunk_size: 4 }).unwrap();
    let (_, source) = model(12);

    let err = uploader.upload(&source, None).await.unwrap_err();
    match err {
        UploadError::ServerError { status_code, message } => {
            assert_eq!(status_code, 500);
            assert_eq!(message, "disk full");
        }
        other => panic!("Expected ServerError, got {:?}", other),
    }

    assert_eq!(sent_chunks(&server).await.len(), 2);
}

#[tokio::test]
async fn test_empty_error_body_uses_reason() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(413))
        .mount(&server)
        .await;

    let uploader = ChunkedUploader::new(&server.uri(), ChunkedConfig::default()).unwrap();
    let (_, source) = model(10);

    let err = uploader.upload(&source, None).await.unwrap_err();
    assert!(matches!(
        err,
        UploadError::ServerError { status_code: 413, ref message } if message == "Payload Too Large"
    ));
}

#[tokio::test]
async fn test_receiver_never_completes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ChunkReceiver::never_completing())
        .expect(6)
        .mount(&server)
        .await;

    let uploader = ChunkedUploader::new(&server.uri(), ChunkedConfig { chunk_size: 4 }).unwrap();
    let (_, source) = model(12);

    assert!(uploader.upload(&source, None).await.unwrap().is_none());

    let err = uploader.upload_strict(&source, None).await.unwrap_err();
    assert!(matches!(err, UploadError::Incomplete { total_chunks: 3, .. }));
}

#[tokio::test]
async fn test_bare_incomplete_answers_keep_uploading() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "complete": false })))
        .expect(3)
        .mount(&server)
        .await;

    let uploader = ChunkedUploader::new(&server.uri(), ChunkedConfig { chunk_size: 4 }).unwrap();
    let (_, source) = model(12);

    assert!(uploader.upload(&source, None).await.unwrap().is_none());

    let indices: Vec<usize> = sent_chunks(&server).await.iter().map(|c| c.chunk_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_undecodable_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let uploader = ChunkedUploader::new(&server.uri(), ChunkedConfig::default()).unwrap();
    let (_, source) = model(10);

    let err = uploader.upload(&source, None).await.unwrap_err();
    assert!(matches!(err, UploadError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_config_headers_and_path_prefix() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/upload"))
        .and(header("authorization", "Bearer print-token"))
        .respond_with(ChunkReceiver::completing())
        .expect(1)
        .mount(&server)
        .await;

    let mut headers = HashMap::new();
    headers.insert("Authorization".to_string(), "Bearer print-token".to_string());
    let config = Config {
        server_url: format!("{}/api/", server.uri()),
        chunk_size: 1024,
        headers,
        timeout_secs: Some(10),
    };

    let transport = HttpTransport::from_config(&config).unwrap();
    assert!(transport.endpoint().as_str().ends_with("/api/upload"));

    let uploader = ChunkedUploader::from_config(&config).unwrap();
    let (_, source) = model(100);
    let upload = uploader.upload(&source, None).await.unwrap();
    assert!(upload.is_some());
}

#[tokio::test]
async fn test_upload_file_from_disk() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ChunkReceiver::completing())
        .expect(2)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("benchy.stl");
    tokio::fs::write(&file_path, vec![1u8; 2048]).await.unwrap();

    let uploader = ChunkedUploader::new(&server.uri(), ChunkedConfig { chunk_size: 1024 }).unwrap();
    let upload = uploader.upload_file_strict(&file_path, None).await.unwrap();

    assert_eq!(upload.filename, "benchy.stl");
    let chunks = sent_chunks(&server).await;
    assert!(chunks.iter().all(|c| BASE64_STANDARD.decode(&c.data).unwrap().len() == 1024));
}

#[tokio::test]
async fn test_one_shot_upload_file() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ChunkReceiver::completing())
        .expect(3)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("bracket.3mf");
    tokio::fs::write(&file_path, vec![9u8; 25]).await.unwrap();

    let upload = chunkpost::upload_file(&file_path, None, &format!("{}/", server.uri()), 10)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(upload.filetype, "3mf");
}
