//! HTTP upload integration tests
//!
//! Drives the uploader against wiremock servers and checks the outcome
//! mapping plus the exact multipart framing that reaches the server.

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use http_uploadr::accessor::{DataAccessor, FileAccessor};
    use http_uploadr::config::ClientConfig;
    use http_uploadr::scope::{MemorySink, Scope};
    use http_uploadr::upload::multipart::assemble;
    use http_uploadr::upload::{
        HttpDispatcher, HttpUploader, UploadError, UploadOutcome, UploadResult,
    };
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// One parsed form field: (name, filename, content)
    type Field = (Option<String>, Option<String>, Bytes);

    fn uploader() -> HttpUploader {
        HttpUploader::new(HttpDispatcher::new(&ClientConfig::default()).unwrap())
    }

    async fn parse_multipart(content_type: &str, body: Vec<u8>) -> Vec<Field> {
        let boundary = multer::parse_boundary(content_type).unwrap();
        let stream =
            futures::stream::once(async move { Ok::<_, std::io::Error>(Bytes::from(body)) });
        let mut multipart = multer::Multipart::new(stream, boundary);

        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().map(str::to_owned);
            let file_name = field.file_name().map(str::to_owned);
            let content = field.bytes().await.unwrap();
            fields.push((name, file_name, content));
        }
        fields
    }

    async fn received_upload(server: &MockServer) -> (String, Vec<u8>) {
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        let content_type = request
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        (content_type, request.body.clone())
    }

    // ========================================================================
    // Success
    // ========================================================================

    #[tokio::test]
    async fn test_upload_succeeds_with_explicit_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header_regex("content-type", "^multipart/form-data; boundary="))
            .respond_with(ResponseTemplate::new(200).set_body_string("stored"))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = uploader()
            .upload(
                &Scope::default(),
                &DataAccessor,
                "hello world",
                "greeting.txt",
                &format!("{}/upload", server.uri()),
            )
            .await;

        assert_eq!(
            outcome,
            UploadOutcome::Completed(UploadResult::succeeded("greeting.txt"))
        );
    }

    #[tokio::test]
    async fn test_any_2xx_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = uploader()
            .upload(&Scope::default(), &DataAccessor, "x", "x.bin", &server.uri())
            .await;

        assert!(outcome.result().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_uploaded_body_has_single_file_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let content: Vec<u8> = (0..50_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(dir.path().join("trace.bin"), &content).unwrap();

        let accessor = FileAccessor::new(Some(dir.path().to_path_buf()));
        let outcome = uploader()
            .upload(
                &Scope::default(),
                &accessor,
                "trace.bin",
                "host-a/trace.bin",
                &server.uri(),
            )
            .await;
        assert!(outcome.result().unwrap().is_success());

        let (content_type, body) = received_upload(&server).await;
        let fields = parse_multipart(&content_type, body).await;

        assert_eq!(fields.len(), 1);
        let (name, file_name, bytes) = &fields[0];
        assert_eq!(name.as_deref(), Some("file"));
        assert_eq!(file_name.as_deref(), Some("host-a/trace.bin"));
        assert_eq!(bytes.as_ref(), content.as_slice());
    }

    #[tokio::test]
    async fn test_empty_resource_uploads_empty_part() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let outcome = uploader()
            .upload(&Scope::default(), &DataAccessor, "", "empty.txt", &server.uri())
            .await;
        assert!(outcome.result().unwrap().is_success());

        let (content_type, body) = received_upload(&server).await;
        let fields = parse_multipart(&content_type, body).await;
        assert_eq!(fields.len(), 1);
        assert!(fields[0].2.is_empty());
    }

    #[tokio::test]
    async fn test_assembled_body_parses_with_standard_parser() {
        let content = b"line one\r\n--not-a-boundary\r\nline three".to_vec();
        let mut reader = std::io::Cursor::new(content.clone());

        let body = assemble(&mut reader, "notes.txt", &CancellationToken::new())
            .await
            .unwrap();

        let fields = parse_multipart(&body.content_type(), body.as_bytes().to_vec()).await;
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0.as_deref(), Some("file"));
        assert_eq!(fields[0].1.as_deref(), Some("notes.txt"));
        assert_eq!(fields[0].2.as_ref(), content.as_slice());
    }

    // ========================================================================
    // Filenames
    // ========================================================================

    #[tokio::test]
    async fn test_special_filenames_survive_standard_parser() {
        let names = [
            r"C:\Windows\System32\winevt\Logs\Security.evtx",
            r"\\fileserver\share\report.pdf",
            r#"say "hi".txt"#,
            r#"C:\temp\"odd".txt"#,
            "отчёт 2024.txt",
            "日本語のファイル.log",
            "semi;colon name=x.txt",
        ];

        for name in names {
            let mut reader = std::io::Cursor::new(b"DATA".to_vec());
            let body = assemble(&mut reader, name, &CancellationToken::new())
                .await
                .unwrap();

            let fields = parse_multipart(&body.content_type(), body.as_bytes().to_vec()).await;
            assert_eq!(fields.len(), 1, "name {name:?}");
            assert_eq!(fields[0].0.as_deref(), Some("file"), "name {name:?}");
            assert_eq!(fields[0].1.as_deref(), Some(name), "name {name:?}");
            assert_eq!(fields[0].2.as_ref(), b"DATA", "name {name:?}");
        }
    }

    #[tokio::test]
    async fn test_line_breaks_in_name_keep_content_intact() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let name = "evil\r\nX-Injected: 1\r\n\r\nfoo";
        let outcome = uploader()
            .upload(&Scope::default(), &DataAccessor, "DATA", name, &server.uri())
            .await;
        assert_eq!(outcome.into_result(), Some(UploadResult::succeeded(name)));

        let (content_type, body) = received_upload(&server).await;
        let fields = parse_multipart(&content_type, body).await;

        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].0.as_deref(), Some("file"));
        assert_eq!(
            fields[0].1.as_deref(),
            Some("evil%0D%0AX-Injected: 1%0D%0A%0D%0Afoo")
        );
        assert_eq!(fields[0].2.as_ref(), b"DATA");
    }

    #[tokio::test]
    async fn test_windows_path_name_reaches_server_unchanged() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let name = r"C:\Users\analyst\AppData\Local\Temp\dump.dmp";
        let outcome = uploader()
            .upload(&Scope::default(), &DataAccessor, "minidump", name, &server.uri())
            .await;
        assert!(outcome.result().unwrap().is_success());

        let (content_type, body) = received_upload(&server).await;
        let fields = parse_multipart(&content_type, body).await;
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].1.as_deref(), Some(name));
        assert_eq!(fields[0].2.as_ref(), b"minidump");
    }

    // ========================================================================
    // Directories
    // ========================================================================

    #[tokio::test]
    async fn test_directory_is_skipped_without_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let outcome = uploader()
            .upload(
                &Scope::default(),
                &FileAccessor::default(),
                dir.path().to_str().unwrap(),
                "dir",
                &server.uri(),
            )
            .await;

        assert_eq!(outcome, UploadOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_directory_is_skipped_with_invalid_uri() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = uploader()
            .upload(
                &Scope::default(),
                &FileAccessor::default(),
                dir.path().to_str().unwrap(),
                "dir",
                "::not a uri::",
            )
            .await;

        assert!(outcome.is_skipped());
    }

    // ========================================================================
    // Failures
    // ========================================================================

    #[tokio::test]
    async fn test_server_error_is_failed_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("disk full"))
            .expect(1)
            .mount(&server)
            .await;

        let sink = Arc::new(MemorySink::new());
        let outcome = uploader()
            .upload(
                &Scope::new(sink.clone()),
                &DataAccessor,
                "payload",
                "p.txt",
                &server.uri(),
            )
            .await;

        let result = outcome.into_result().unwrap();
        assert!(!result.is_success());
        assert_eq!(result.error(), Some("server rejected upload: status=500"));
        assert!(sink.contains("status=500"));
    }

    #[tokio::test]
    async fn test_not_found_is_failed_with_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let outcome = uploader()
            .upload(&Scope::default(), &DataAccessor, "x", "x", &server.uri())
            .await;

        assert!(outcome.result().unwrap().error().unwrap().contains("404"));
    }

    #[tokio::test]
    async fn test_refused_connection_is_failed() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let outcome = uploader()
            .upload(
                &Scope::default(),
                &DataAccessor,
                "payload",
                "p.txt",
                &format!("http://{}/upload", addr),
            )
            .await;

        let result = outcome.into_result().unwrap();
        assert!(result.error().unwrap().starts_with("transport error:"));

        // Still alive: a second call works the same way
        let again = uploader()
            .upload(
                &Scope::default(),
                &DataAccessor,
                "payload",
                "p.txt",
                &format!("http://{}/upload", addr),
            )
            .await;
        assert!(!again.result().unwrap().is_success());
    }

    #[tokio::test]
    async fn test_missing_file_is_resource_failure_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(MemorySink::new());
        let outcome = uploader()
            .upload(
                &Scope::new(sink.clone()),
                &FileAccessor::new(Some(dir.path().to_path_buf())),
                "nope.txt",
                "nope.txt",
                &server.uri(),
            )
            .await;

        let result = outcome.into_result().unwrap();
        assert!(result
            .error()
            .unwrap()
            .starts_with("resource error: Unable to open nope.txt"));
        assert!(sink.contains("Unable to open nope.txt"));
    }

    #[tokio::test]
    async fn test_dispatch_maps_outcomes() {
        let server = MockServer::start().await;
        Mock::given(path("/ok"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(path("/teapot"))
            .respond_with(ResponseTemplate::new(418))
            .mount(&server)
            .await;

        let dispatcher = HttpDispatcher::new(&ClientConfig::default()).unwrap();
        let cancel = CancellationToken::new();
        let body = || async {
            let mut reader = std::io::Cursor::new(b"abc".to_vec());
            assemble(&mut reader, "abc.txt", &CancellationToken::new())
                .await
                .unwrap()
        };

        let ok = dispatcher
            .dispatch(body().await, "abc.txt", &format!("{}/ok", server.uri()), &cancel)
            .await
            .unwrap();
        assert_eq!(ok, UploadResult::succeeded("abc.txt"));

        let rejected = dispatcher
            .dispatch(
                body().await,
                "abc.txt",
                &format!("{}/teapot", server.uri()),
                &cancel,
            )
            .await
            .unwrap_err();
        assert!(matches!(rejected, UploadError::Rejected { status: 418 }));
        assert_eq!(
            UploadResult::from(rejected),
            UploadResult::failed("server rejected upload: status=418")
        );
    }

    #[tokio::test]
    async fn test_large_response_body_is_drained() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 8 * 1024 * 1024]))
            .expect(2)
            .mount(&server)
            .await;

        let uploader = uploader();
        for name in ["first.txt", "second.txt"] {
            let outcome = uploader
                .upload(&Scope::default(), &DataAccessor, "payload", name, &server.uri())
                .await;
            assert_eq!(outcome.into_result(), Some(UploadResult::succeeded(name)));
        }
    }
}
