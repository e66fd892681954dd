use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use time::{Duration as TimeDuration, OffsetDateTime, macros::datetime};
use tower::ServiceExt;
use uuid::Uuid;

use folio::application::admin::posts::AdminPostService;
use folio::application::listing::ListingService;
use folio::application::pagination::PageSizePolicy;
use folio::application::repos::{
    CreatePostParams, PostsRepo, PostsWriteRepo, RepoError, UpdatePostParams,
};
use folio::application::site::SiteProfile;
use folio::application::sitemap::SitemapService;
use folio::application::uploads::UploadService;
use folio::domain::entities::PostRecord;
use folio::infra::http::{
    AdminKey, AdminRateLimiter, ApiState, HttpState, RouterState, build_application_router,
};
use folio::infra::memory::MemoryRepositories;
use folio::infra::uploads::UploadStorage;

const ADMIN_KEY: &str = "test-admin-key";
const BASE: OffsetDateTime = datetime!(2024-03-01 00:00 UTC);

struct TestApp {
    router: Router,
    repos: Arc<MemoryRepositories>,
    _uploads: tempfile::TempDir,
}

struct AppOptions {
    admin_key: Option<String>,
    writer: Option<Arc<dyn PostsWriteRepo>>,
    rate_limit: u32,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            admin_key: Some(ADMIN_KEY.to_string()),
            writer: None,
            rate_limit: 1_000,
        }
    }
}

fn build_app(options: AppOptions) -> TestApp {
    let repos = Arc::new(MemoryRepositories::new());
    let uploads_dir = tempfile::tempdir().expect("tempdir");
    let site = Arc::new(SiteProfile {
        base_url: "https://folio.test".to_string(),
        name: "Folio".to_string(),
        author: "Ada".to_string(),
        ..SiteProfile::default()
    });

    let posts: Arc<dyn PostsRepo> = repos.clone();
    let writer: Arc<dyn PostsWriteRepo> = options.writer.unwrap_or_else(|| repos.clone());

    let storage = Arc::new(UploadStorage::new(uploads_dir.path().to_path_buf()).expect("storage"));
    let state = RouterState {
        http: HttpState {
            sitemap: Arc::new(SitemapService::new(posts.clone(), site.clone())),
            health: repos.clone(),
            upload_storage: storage.clone(),
        },
        api: ApiState {
            listing: Arc::new(ListingService::new(posts.clone(), PageSizePolicy::default())),
            posts: Arc::new(AdminPostService::new(posts, writer, site.author.clone())),
            uploads: Arc::new(UploadService::new(storage, 5 * 1024 * 1024, "/uploads")),
            site,
            admin_key: AdminKey::new(options.admin_key),
            rate_limiter: Arc::new(AdminRateLimiter::new(
                Duration::from_secs(60),
                options.rate_limit,
            )),
        },
    };

    TestApp {
        router: build_application_router(state, "/uploads"),
        repos,
        _uploads: uploads_dir,
    }
}

fn post(index: i64, tags: &[&str], published: bool) -> PostRecord {
    let at = BASE - TimeDuration::hours(index);
    PostRecord {
        id: Uuid::new_v4(),
        slug: format!("post-{index}"),
        title: format!("Post {index}"),
        content: format!("<p>Body of post {index}</p>"),
        excerpt: format!("Excerpt {index}"),
        featured_image: None,
        images: Vec::new(),
        tags: tags.iter().map(|tag| tag.to_string()).collect(),
        published,
        published_at: published.then_some(at),
        author: "Ada".to_string(),
        read_time: 1,
        seo_title: None,
        seo_description: None,
        seo_keywords: Vec::new(),
        created_at: at,
        updated_at: at,
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app
        .router
        .clone()
        .oneshot(request)
        .await
        .expect("router response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let (status, bytes) = send(app, request).await;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request")
}

fn admin_json(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-admin-key", ADMIN_KEY)
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn multipart_upload(filename: &str, content_type: &str, data: &[u8]) -> Request<Body> {
    let boundary = "folio-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {content_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::post("/api/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .header("x-admin-key", ADMIN_KEY)
        .body(Body::from(body))
        .expect("request")
}

#[tokio::test]
async fn second_page_of_react_posts_lists_posts_ten_to_eighteen() {
    let app = build_app(AppOptions::default());
    let mut posts: Vec<PostRecord> = (1..=25).map(|i| post(i, &["react"], true)).collect();
    posts.extend((26..=30).map(|i| post(i, &["rust"], true)));
    app.repos.seed(posts).await;

    let (status, body) = send_json(&app, get("/api/blogs?page=2&limit=9&tag=react")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 9);
    assert_eq!(body["total"], 25);
    assert_eq!(body["totalPages"], 3);
    let slugs: Vec<&str> = body["posts"]
        .as_array()
        .expect("posts")
        .iter()
        .map(|p| p["slug"].as_str().expect("slug"))
        .collect();
    let expected: Vec<String> = (10..=18).map(|i| format!("post-{i}")).collect();
    assert_eq!(slugs, expected);
}

#[tokio::test]
async fn malformed_paging_parameters_fall_back_to_defaults() {
    let app = build_app(AppOptions::default());
    app.repos
        .seed((1..=12).map(|i| post(i, &[], true)))
        .await;

    let (status, body) = send_json(&app, get("/api/blogs?page=abc&limit=-3")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 9);
    assert_eq!(body["posts"].as_array().expect("posts").len(), 9);
}

#[tokio::test]
async fn drafts_require_the_admin_key() {
    let app = build_app(AppOptions::default());
    app.repos
        .seed(vec![post(1, &["rust"], true), post(2, &["draft"], false)])
        .await;

    let (_, public) = send_json(&app, get("/api/blogs?published=false")).await;
    assert_eq!(public["total"], 1);

    let request = Request::get("/api/blogs")
        .header("x-admin-key", ADMIN_KEY)
        .body(Body::empty())
        .expect("request");
    let (_, admin) = send_json(&app, request).await;
    assert_eq!(admin["total"], 2);

    let (status, body) = send_json(&app, get("/api/blogs/post-2")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Blog post not found" }));

    let (_, tags) = send_json(&app, get("/api/blogs/tags")).await;
    assert_eq!(tags, json!({ "tags": ["rust"] }));
}

#[tokio::test]
async fn mutations_without_a_valid_key_are_unauthorized() {
    let app = build_app(AppOptions::default());
    let payload = json!({ "title": "Hello", "content": "<p>World</p>" });

    let missing = Request::post("/api/blogs")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .expect("request");
    let (status, body) = send_json(&app, missing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Unauthorized" }));

    let wrong = Request::post("/api/blogs")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-admin-key", "guess")
        .body(Body::from(payload.to_string()))
        .expect("request");
    let (status, _) = send_json(&app, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_stay_closed_without_a_configured_key() {
    let app = build_app(AppOptions {
        admin_key: None,
        ..AppOptions::default()
    });

    let (status, _) = send_json(
        &app,
        admin_json("DELETE", "/api/blogs/anything", Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_update_and_delete_round_through_the_api() {
    let app = build_app(AppOptions::default());

    let (status, created) = send_json(
        &app,
        admin_json(
            "POST",
            "/api/blogs",
            json!({
                "title": "Hello World",
                "content": "<p>First <script>alert(1)</script>post</p>",
                "tags": ["Rust", "rust", " Web "],
                "published": false
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "hello-world");
    assert_eq!(created["tags"], json!(["rust", "web"]));
    assert_eq!(created["author"], "Ada");
    assert_eq!(created["readTime"], 1);
    assert!(created["publishedAt"].is_null());
    assert!(!created["content"].as_str().expect("content").contains("script"));

    let (status, second) = send_json(
        &app,
        admin_json(
            "POST",
            "/api/blogs",
            json!({ "title": "Hello World", "content": "<p>Again</p>" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(second["slug"], "hello-world-2");

    let (status, published) = send_json(
        &app,
        admin_json("PUT", "/api/blogs/hello-world", json!({ "published": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(published["published"], true);
    assert!(published["publishedAt"].is_string());
    assert_eq!(published["title"], "Hello World");

    let (status, fetched) = send_json(&app, get("/api/blogs/hello-world")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["id"], created["id"]);

    let (status, deleted) = send_json(
        &app,
        admin_json("DELETE", "/api/blogs/hello-world", Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        deleted,
        json!({ "message": "Blog post deleted successfully" })
    );

    let (status, _) = send_json(&app, get("/api/blogs/hello-world")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_input_is_reported_as_error_message() {
    let app = build_app(AppOptions::default());

    let (status, body) = send_json(
        &app,
        admin_json("POST", "/api/blogs", json!({ "title": "  ", "content": "<p>x</p>" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "title is required" }));

    let (status, body) = send_json(
        &app,
        admin_json("PUT", "/api/blogs/missing", json!({ "published": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "Blog post not found" }));

    let broken = Request::post("/api/blogs")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-admin-key", ADMIN_KEY)
        .body(Body::from("{not json"))
        .expect("request");
    let (status, body) = send_json(&app, broken).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request body");
}

/// Writer that loses every slug race, as a concurrent insert would.
struct ContendedWriter;

#[async_trait]
impl PostsWriteRepo for ContendedWriter {
    async fn create_post(&self, _params: CreatePostParams) -> Result<PostRecord, RepoError> {
        Err(RepoError::Duplicate {
            constraint: "posts_slug_key".to_string(),
        })
    }

    async fn update_post(&self, _params: UpdatePostParams) -> Result<PostRecord, RepoError> {
        Err(RepoError::NotFound)
    }

    async fn delete_post(&self, _id: Uuid) -> Result<(), RepoError> {
        Err(RepoError::NotFound)
    }
}

#[tokio::test]
async fn duplicate_slug_from_the_store_is_a_conflict() {
    let app = build_app(AppOptions {
        writer: Some(Arc::new(ContendedWriter)),
        ..AppOptions::default()
    });

    let (status, body) = send_json(
        &app,
        admin_json("POST", "/api/blogs", json!({ "title": "Race", "content": "<p>x</p>" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(
        body,
        json!({ "error": "A blog post with this slug already exists" })
    );
}

#[tokio::test]
async fn admin_mutations_are_rate_limited() {
    let app = build_app(AppOptions {
        rate_limit: 1,
        ..AppOptions::default()
    });

    let (first, _) = send_json(
        &app,
        admin_json("DELETE", "/api/blogs/none", Value::Null),
    )
    .await;
    assert_eq!(first, StatusCode::NOT_FOUND);

    let (second, body) = send_json(
        &app,
        admin_json("DELETE", "/api/blogs/none", Value::Null),
    )
    .await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(body["error"], "Too many requests");
}

#[tokio::test]
async fn rate_limit_is_shared_across_slugs_of_one_route() {
    let app = build_app(AppOptions {
        rate_limit: 1,
        ..AppOptions::default()
    });

    let (first, _) = send_json(
        &app,
        admin_json("DELETE", "/api/blogs/first", Value::Null),
    )
    .await;
    assert_eq!(first, StatusCode::NOT_FOUND);

    let (second, _) = send_json(
        &app,
        admin_json("DELETE", "/api/blogs/second", Value::Null),
    )
    .await;
    assert_eq!(second, StatusCode::TOO_MANY_REQUESTS);

    let (create, _) = send_json(
        &app,
        admin_json("POST", "/api/blogs", json!({ "title": "Other route", "content": "<p>x</p>" })),
    )
    .await;
    assert_eq!(create, StatusCode::CREATED);
}

#[tokio::test]
async fn post_titled_tags_stays_reachable() {
    let app = build_app(AppOptions::default());

    let (status, created) = send_json(
        &app,
        admin_json(
            "POST",
            "/api/blogs",
            json!({
                "title": "Tags",
                "content": "<p>How tags work</p>",
                "tags": ["meta"],
                "published": true
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["slug"], "tags-2");

    let (status, post) = send_json(&app, get("/api/blogs/tags-2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(post["title"], "Tags");

    let (status, tags) = send_json(&app, get("/api/blogs/tags")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags, json!({ "tags": ["meta"] }));

    let (status, _) = send_json(
        &app,
        admin_json("DELETE", "/api/blogs/tags-2", Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn tag_listing_accepts_numeric_published_flag() {
    let app = build_app(AppOptions::default());
    app.repos
        .seed(vec![post(1, &["live"], true), post(2, &["draft"], false)])
        .await;

    let (status, body) = send_json(
        &app,
        admin_json("GET", "/api/blogs/tags?published=1", Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "tags": ["live"] }));

    let (status, body) = send_json(
        &app,
        admin_json("GET", "/api/blogs/tags?published=0", Value::Null),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "tags": ["draft", "live"] }));

    let (status, body) = send_json(&app, get("/api/blogs/tags?published=yes")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "tags": ["live"] }));
}

#[tokio::test]
async fn uploads_are_validated_stored_and_served() {
    let app = build_app(AppOptions::default());

    let (status, body) = send_json(&app, multipart_upload("notes.txt", "text/plain", b"hi")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "Invalid file type. Only JPEG, PNG, WebP, and GIF are allowed." })
    );

    let png = b"\x89PNG\r\n\x1a\nfake-image-bytes";
    let (status, body) = send_json(&app, multipart_upload("Cover Art.png", "image/png", png)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["size"], png.len());
    assert_eq!(body["contentType"], "image/png");
    let url = body["url"].as_str().expect("url").to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with("-cover-art.png"));

    let response = app
        .router
        .clone()
        .oneshot(get(&url))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
    assert_eq!(
        response.headers()[header::CACHE_CONTROL],
        "public, max-age=31536000, immutable"
    );

    let (status, _) = send(&app, get("/uploads/2024/01/01/missing.png")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_uploads_are_rejected() {
    let app = build_app(AppOptions::default());
    let big = vec![0u8; 5 * 1024 * 1024 + 1];

    let (status, body) = send_json(&app, multipart_upload("huge.jpg", "image/jpeg", &big)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": "File size too large. Maximum size is 5MB." })
    );
}

#[tokio::test]
async fn related_and_seo_endpoints_describe_a_post() {
    let app = build_app(AppOptions::default());
    let mut subject = post(1, &["rust", "web"], true);
    subject.featured_image = Some("/uploads/2024/02/01/cover.png".to_string());
    app.repos
        .seed(vec![
            subject,
            post(2, &["web"], true),
            post(3, &["go"], true),
            post(4, &["rust"], false),
        ])
        .await;

    let (_, related) = send_json(&app, get("/api/blogs/post-1/related")).await;
    let slugs: Vec<&str> = related["posts"]
        .as_array()
        .expect("posts")
        .iter()
        .map(|p| p["slug"].as_str().expect("slug"))
        .collect();
    assert_eq!(slugs, vec!["post-2"]);

    let (status, blocks) =
        send_json(&app, get("/api/structured-data?type=blog&slug=post-1")).await;
    assert_eq!(status, StatusCode::OK);
    let types: Vec<&str> = blocks
        .as_array()
        .expect("blocks")
        .iter()
        .map(|b| b["@type"].as_str().expect("type"))
        .collect();
    assert_eq!(types, vec!["Blog", "BlogPosting", "BreadcrumbList"]);
    assert_eq!(
        blocks[1]["image"],
        "https://folio.test/uploads/2024/02/01/cover.png"
    );

    let (_, website) = send_json(&app, get("/api/structured-data")).await;
    assert_eq!(website.as_array().expect("blocks").len(), 1);
    assert_eq!(website[0]["@type"], "WebSite");

    let (status, metadata) = send_json(&app, get("/api/blogs/post-1/metadata")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(metadata["title"], "Post 1 | Folio");
    assert_eq!(metadata["canonicalUrl"], "https://folio.test/blog/post-1");
    assert_eq!(metadata["keywords"], json!(["rust", "web"]));

    let (status, _) = send_json(&app, get("/api/structured-data?type=blog&slug=post-4")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sitemap_robots_and_health_are_public() {
    let app = build_app(AppOptions::default());
    app.repos
        .seed(vec![post(1, &[], true), post(2, &[], false)])
        .await;

    let (status, body) = send(&app, get("/sitemap.xml")).await;
    assert_eq!(status, StatusCode::OK);
    let xml = String::from_utf8(body).expect("utf8");
    assert!(xml.contains("<loc>https://folio.test/blog/post-1</loc>"));
    assert!(!xml.contains("post-2"));

    let (status, body) = send(&app, get("/robots.txt")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(
        String::from_utf8(body)
            .expect("utf8")
            .contains("Sitemap: https://folio.test/sitemap.xml")
    );

    let (status, _) = send(&app, get("/_health/db")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}
