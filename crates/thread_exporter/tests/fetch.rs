use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use thread_exporter::{
    ExportError, ExporterConfig, FailureKind, ForumClient, PageContext, Pagination, PostId,
    ThreadExporter, ThreadFetcher, ThreadIdentity, TopicPage,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn post(pid: u64, username: &str, html: &str) -> Value {
    json!({
        "pid": pid,
        "deleted": false,
        "content": html,
        "user": {"username": username},
        "toPid": null
    })
}

async fn mount_pagination(server: &MockServer, tid: &str, page_count: u32) {
    Mock::given(method("GET"))
        .and(path(format!("/api/topic/pagination/{tid}")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"pagination": {"pageCount": page_count, "currentPage": 1}})),
        )
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, tid: &str, page: u32, posts: Value, delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path(format!("/api/topic/{tid}")))
        .and(query_param("page", page.to_string()))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"tid": tid, "posts": posts}))
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .expect(1)
        .mount(server)
        .await;
}

fn exporter() -> ThreadExporter<thread_exporter::ReqwestForumClient> {
    export_logging::initialize_for_tests();
    ThreadExporter::from_config(ExporterConfig::default()).expect("client builds")
}

fn pids(export: &thread_exporter::ThreadExport) -> Vec<PostId> {
    export.posts.iter().map(|p| p.pid.clone()).collect()
}

#[tokio::test]
async fn pagination_failure_issues_no_page_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/topic/pagination/42"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/topic/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"posts": []})))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = PageContext::new(format!("{}/topic/42/slug", server.uri()));
    let err = exporter().export(&ctx).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Network);
    match err {
        ExportError::Pagination { status } => assert!(status.contains("500"), "{status}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn pages_are_concatenated_in_page_order_regardless_of_arrival() {
    let server = MockServer::start().await;
    mount_pagination(&server, "42", 3).await;
    // Page 1 answers last, page 3 first.
    mount_page(&server, "42", 1, json!([post(1, "a", "<p>1</p>"), post(2, "b", "<p>2</p>")]), 300).await;
    mount_page(&server, "42", 2, json!([post(3, "c", "<p>3</p>")]), 150).await;
    mount_page(&server, "42", 3, json!([post(4, "d", "<p>4</p>"), post(5, "e", "<p>5</p>")]), 0).await;

    let ctx = PageContext::new(format!("{}/topic/42/slug", server.uri()))
        .with_state(None, Some("Ordered".into()));
    let export = exporter().export(&ctx).await.expect("export ok");

    assert_eq!(export.title, "Ordered");
    assert_eq!(
        pids(&export),
        (1..=5).map(PostId::Number).collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn failing_page_fails_the_export_and_names_the_page() {
    let server = MockServer::start().await;
    mount_pagination(&server, "42", 3).await;
    mount_page(&server, "42", 1, json!([post(1, "a", "<p>1</p>")]), 0).await;
    mount_page(&server, "42", 3, json!([post(3, "c", "<p>3</p>")]), 100).await;
    Mock::given(method("GET"))
        .and(path("/api/topic/42"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = PageContext::new(format!("{}/topic/42/slug", server.uri()));
    let err = exporter().export(&ctx).await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::Network);
    assert!(matches!(err, ExportError::Page { page: 2, .. }), "{err:?}");
    assert!(err.to_string().contains("page 2"));
}

#[tokio::test]
async fn zero_page_count_still_fetches_first_page() {
    let server = MockServer::start().await;
    mount_pagination(&server, "9", 0).await;
    mount_page(&server, "9", 1, json!([post(1, "a", "<p>only</p>")]), 0).await;

    let ctx = PageContext::new(format!("{}/topic/9", server.uri()));
    let export = exporter().export(&ctx).await.expect("export ok");
    assert_eq!(pids(&export), vec![PostId::Number(1)]);
}

#[tokio::test]
async fn sub_path_install_uses_prefixed_api_and_absolute_images() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/community/api/topic/pagination/5"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"pagination": {"pageCount": 1}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/community/api/topic/5"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "posts": [post(1, "a", r#"<p><img src="/assets/uploads/a.png" alt="pic"></p>"#)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = PageContext::new(format!("{}/community/topic/5/pics", server.uri()));
    let export = exporter().export(&ctx).await.expect("export ok");
    assert_eq!(
        export.posts[0].content,
        format!("![pic]({}/community/assets/uploads/a.png)", server.uri())
    );
}

#[tokio::test]
async fn non_json_page_is_an_invalid_response() {
    let server = MockServer::start().await;
    mount_pagination(&server, "42", 1).await;
    Mock::given(method("GET"))
        .and(path("/api/topic/42"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&server)
        .await;

    let ctx = PageContext::new(format!("{}/topic/42", server.uri()));
    let err = exporter().export(&ctx).await.unwrap_err();
    assert!(matches!(err, ExportError::InvalidResponse { .. }), "{err:?}");
    assert_eq!(err.kind(), FailureKind::Network);
}

#[tokio::test]
async fn unresolvable_thread_makes_no_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let ctx = PageContext::new(format!("{}/category/1/general", server.uri()));
    let err = exporter().export(&ctx).await.unwrap_err();
    assert_eq!(err, ExportError::ThreadIdUnresolved);
}

/// Records which pages were requested and which ones finished.
#[derive(Default)]
struct ScriptedClient {
    page_count: u32,
    failing_page: Option<u32>,
    started: Arc<Mutex<Vec<u32>>>,
    finished: Arc<Mutex<Vec<u32>>>,
}

#[async_trait::async_trait]
impl ForumClient for ScriptedClient {
    async fn pagination(&self, _base_url: &str, _tid: &str) -> Result<Pagination, ExportError> {
        Ok(Pagination {
            page_count: self.page_count,
        })
    }

    async fn page(&self, _base_url: &str, _tid: &str, page: u32) -> Result<TopicPage, ExportError> {
        self.started.lock().unwrap().push(page);
        // Earlier pages take longer.
        let delay = u64::from(self.page_count - page + 1) * 20;
        tokio::time::sleep(Duration::from_millis(delay)).await;
        self.finished.lock().unwrap().push(page);
        if self.failing_page == Some(page) {
            return Err(ExportError::Page {
                page,
                status: "500 Internal Server Error".into(),
            });
        }
        let body = json!({"posts": [post(u64::from(page), "u", "<p>x</p>")]});
        Ok(serde_json::from_value(body).unwrap())
    }
}

fn identity() -> ThreadIdentity {
    ThreadIdentity {
        id: "1".into(),
        title: "t".into(),
        base_url: "https://f.example".into(),
    }
}

#[tokio::test]
async fn all_page_requests_complete_before_a_failure_is_reported() {
    let client = ScriptedClient {
        page_count: 4,
        failing_page: Some(4),
        ..ScriptedClient::default()
    };
    let finished = client.finished.clone();
    let fetcher = ThreadFetcher::new(client);

    let err = fetcher.fetch_raw_posts(&identity()).await.unwrap_err();

    assert!(matches!(err, ExportError::Page { page: 4, .. }));
    let mut done = finished.lock().unwrap().clone();
    done.sort_unstable();
    assert_eq!(done, vec![1, 2, 3, 4]);
}

#[tokio::test]
async fn each_page_is_requested_once_and_results_keep_page_order() {
    let client = ScriptedClient {
        page_count: 3,
        ..ScriptedClient::default()
    };
    let finished = client.finished.clone();
    let started = client.started.clone();
    let fetcher = ThreadFetcher::new(client);

    let posts = fetcher.fetch_raw_posts(&identity()).await.expect("fetch ok");

    assert_eq!(*started.lock().unwrap(), vec![1, 2, 3]);
    assert_eq!(finished.lock().unwrap().len(), 3);
    let order: Vec<Option<PostId>> = posts
        .into_iter()
        .map(|post| post.and_then(|p| p.pid))
        .collect();
    assert_eq!(
        order,
        vec![
            Some(PostId::Number(1)),
            Some(PostId::Number(2)),
            Some(PostId::Number(3))
        ]
    );
}
