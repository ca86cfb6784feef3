//! End-to-end sweep scenarios against a live Postgres and mocked remotes.
//!
//! The AI gateway and LinkedIn are wiremock servers; the store is a fresh
//! per-test database with the workspace migrations applied.

use chrono::{DateTime, Duration, TimeZone, Utc};
use sqlx::PgPool;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use autopost_ai::AiClient;
use autopost_core::PostStatus;
use autopost_linkedin::LinkedinClient;
use autopost_pipeline::{
    run_cutoff_sweep, run_generate_sweep, run_publish_sweep, run_schedule_sweep, GenerateContext,
    PublishContext,
};

// ---------------------------------------------------------------------------
// Seed helpers
// ---------------------------------------------------------------------------

#[derive(Clone)]
struct ProfileSeed {
    timezone: &'static str,
    review_deadline_hour: i32,
    linkedin_connected: bool,
    access_token: Option<&'static str>,
    refresh_token: Option<&'static str>,
    token_expiry: Option<DateTime<Utc>>,
    member_urn: Option<&'static str>,
    posting_schedule: serde_json::Value,
}

impl Default for ProfileSeed {
    fn default() -> Self {
        Self {
            timezone: "UTC",
            review_deadline_hour: 18,
            linkedin_connected: true,
            access_token: Some("stored-token"),
            refresh_token: Some("stored-refresh"),
            token_expiry: Some(Utc::now() + Duration::days(30)),
            member_urn: Some("urn:li:person:me"),
            posting_schedule: serde_json::json!([]),
        }
    }
}

async fn seed_profile(pool: &PgPool, user_id: &str, seed: &ProfileSeed) {
    sqlx::query(
        "INSERT INTO profiles (user_id, timezone, review_deadline_hour, posting_schedule, \
             linkedin_connected, linkedin_access_token, linkedin_refresh_token, \
             linkedin_token_expiry, linkedin_member_urn) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
    )
    .bind(user_id)
    .bind(seed.timezone)
    .bind(seed.review_deadline_hour)
    .bind(&seed.posting_schedule)
    .bind(seed.linkedin_connected)
    .bind(seed.access_token)
    .bind(seed.refresh_token)
    .bind(seed.token_expiry)
    .bind(seed.member_urn)
    .execute(pool)
    .await
    .expect("seed profile");
}

#[derive(Clone)]
struct PostSeed {
    user_id: &'static str,
    status: &'static str,
    scheduled_for: DateTime<Utc>,
    media_type: &'static str,
    topic: Option<&'static str>,
    content: Option<&'static str>,
    review_deadline: Option<DateTime<Utc>>,
    media_url: Option<String>,
    image_urls: serde_json::Value,
    series_id: Option<i64>,
    topic_index: Option<i32>,
}

impl Default for PostSeed {
    fn default() -> Self {
        Self {
            user_id: "u1",
            status: "scheduled",
            scheduled_for: Utc::now() + Duration::hours(2),
            media_type: "text",
            topic: None,
            content: None,
            review_deadline: None,
            media_url: None,
            image_urls: serde_json::json!([]),
            series_id: None,
            topic_index: None,
        }
    }
}

async fn seed_post(pool: &PgPool, seed: &PostSeed) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO posts (public_id, user_id, status, scheduled_for, media_type, topic, \
             content, review_deadline, media_url, image_urls, series_id, topic_index) \
         VALUES (gen_random_uuid(), $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         RETURNING id",
    )
    .bind(seed.user_id)
    .bind(seed.status)
    .bind(seed.scheduled_for)
    .bind(seed.media_type)
    .bind(seed.topic)
    .bind(seed.content)
    .bind(seed.review_deadline)
    .bind(seed.media_url.as_deref())
    .bind(&seed.image_urls)
    .bind(seed.series_id)
    .bind(seed.topic_index)
    .fetch_one(pool)
    .await
    .expect("seed post")
}

async fn seed_series(pool: &PgPool, user_id: &str, topics: &[&str], current_index: i32) -> i64 {
    let queue: Vec<serde_json::Value> = topics
        .iter()
        .map(|t| serde_json::json!({"title": t}))
        .collect();
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO series (public_id, user_id, title, topic_queue, current_index) \
         VALUES (gen_random_uuid(), $1, 'Weekly series', $2, $3) RETURNING id",
    )
    .bind(user_id)
    .bind(serde_json::Value::Array(queue))
    .bind(current_index)
    .fetch_one(pool)
    .await
    .expect("seed series")
}

async fn seed_idea(pool: &PgPool, user_id: &str, text: &str) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO ideas (user_id, text) VALUES ($1, $2) RETURNING id",
    )
    .bind(user_id)
    .bind(text)
    .fetch_one(pool)
    .await
    .expect("seed idea")
}

async fn mock_text_generation(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/generations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": content
        })))
        .mount(server)
        .await;
}

fn generate_ctx<'a>(pool: &'a PgPool, ai: &'a AiClient) -> GenerateContext<'a> {
    GenerateContext {
        pool,
        ai,
        default_provider: "openai",
        default_model: "gpt-4o",
    }
}

fn linkedin_client(server: &MockServer) -> LinkedinClient {
    LinkedinClient::with_base_url("client-id", "client-secret", 10, &server.uri())
        .expect("linkedin client")
}

async fn get_status(pool: &PgPool, post_id: i64) -> String {
    autopost_db::get_post(pool, post_id)
        .await
        .expect("get post")
        .status
}

// ---------------------------------------------------------------------------
// Scenario A — generate sweep produces a reviewable draft
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn generate_sweep_drafts_post_inside_window(pool: PgPool) {
    seed_profile(&pool, "u1", &ProfileSeed::default()).await;
    let scheduled_for = Utc::now() + Duration::hours(2);
    let post_id = seed_post(
        &pool,
        &PostSeed {
            topic: Some("Why we moved off Kubernetes"),
            scheduled_for,
            ..PostSeed::default()
        },
    )
    .await;

    let ai_server = MockServer::start().await;
    mock_text_generation(&ai_server, "Draft body from the model.").await;
    let ai = AiClient::with_base_url(&ai_server.uri()).expect("ai client");

    let outcome = run_generate_sweep(&generate_ctx(&pool, &ai), Utc::now())
        .await
        .expect("sweep runs");

    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.results[0].status, "generated");

    let post = autopost_db::get_post(&pool, post_id).await.expect("get");
    assert_eq!(post.status, PostStatus::PendingReview.as_str());
    assert_eq!(post.content.as_deref(), Some("Draft body from the model."));

    // Review deadline: scheduled date at the profile's deadline hour, UTC zone.
    let expected = Utc
        .from_utc_datetime(
            &scheduled_for
                .date_naive()
                .and_hms_opt(18, 0, 0)
                .expect("valid time"),
        );
    assert_eq!(post.review_deadline, Some(expected));
}

#[sqlx::test(migrations = "../../migrations")]
async fn generate_sweep_ignores_posts_outside_window(pool: PgPool) {
    seed_profile(&pool, "u1", &ProfileSeed::default()).await;
    let post_id = seed_post(
        &pool,
        &PostSeed {
            topic: Some("Too far out"),
            scheduled_for: Utc::now() + Duration::hours(40),
            ..PostSeed::default()
        },
    )
    .await;

    let ai_server = MockServer::start().await;
    let ai = AiClient::with_base_url(&ai_server.uri()).expect("ai client");

    let outcome = run_generate_sweep(&generate_ctx(&pool, &ai), Utc::now())
        .await
        .expect("sweep runs");

    assert_eq!(outcome.processed, 0);
    assert_eq!(get_status(&pool, post_id).await, "scheduled");
}

#[sqlx::test(migrations = "../../migrations")]
async fn generate_sweep_is_idempotent_for_drafted_posts(pool: PgPool) {
    seed_profile(&pool, "u1", &ProfileSeed::default()).await;
    seed_post(
        &pool,
        &PostSeed {
            topic: Some("One draft only"),
            ..PostSeed::default()
        },
    )
    .await;

    let ai_server = MockServer::start().await;
    mock_text_generation(&ai_server, "First draft.").await;
    let ai = AiClient::with_base_url(&ai_server.uri()).expect("ai client");
    let ctx = generate_ctx(&pool, &ai);

    let first = run_generate_sweep(&ctx, Utc::now()).await.expect("run 1");
    assert_eq!(first.processed, 1);

    // The post now sits in pending_review and is no longer a candidate.
    let second = run_generate_sweep(&ctx, Utc::now()).await.expect("run 2");
    assert_eq!(second.processed, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn generate_failure_leaves_post_scheduled_and_batch_alive(pool: PgPool) {
    seed_profile(&pool, "u1", &ProfileSeed::default()).await;
    let failing_id = seed_post(
        &pool,
        &PostSeed {
            topic: Some("Will fail"),
            scheduled_for: Utc::now() + Duration::hours(1),
            media_type: "image",
            ..PostSeed::default()
        },
    )
    .await;
    let ok_id = seed_post(
        &pool,
        &PostSeed {
            topic: Some("Will succeed"),
            scheduled_for: Utc::now() + Duration::hours(2),
            ..PostSeed::default()
        },
    )
    .await;

    let ai_server = MockServer::start().await;
    // Image generation is rejected; text generation succeeds.
    Mock::given(method("POST"))
        .and(path("/v1/generations"))
        .and(body_string_contains("\"kind\":\"image\""))
        .respond_with(ResponseTemplate::new(422).set_body_json(serde_json::json!({
            "error": {"code": "content_policy", "message": "image prompt rejected"}
        })))
        .mount(&ai_server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/generations"))
        .and(body_string_contains("\"kind\":\"text\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "content": "Text draft."
        })))
        .mount(&ai_server)
        .await;

    let ai = AiClient::with_base_url(&ai_server.uri()).expect("ai client");
    let outcome = run_generate_sweep(&generate_ctx(&pool, &ai), Utc::now())
        .await
        .expect("sweep runs");

    assert_eq!(outcome.processed, 2);

    // Failed generation: post stays scheduled, error recorded per-post.
    assert_eq!(get_status(&pool, failing_id).await, "scheduled");
    let failed_item = outcome
        .results
        .iter()
        .find(|i| i.post_id == failing_id)
        .expect("item present");
    assert_eq!(failed_item.status, "error");

    // The rest of the batch still ran.
    assert_eq!(get_status(&pool, ok_id).await, "pending_review");
}

// ---------------------------------------------------------------------------
// Topic selector precedence
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn idea_beats_series_and_is_spent_exactly_once(pool: PgPool) {
    seed_profile(&pool, "u1", &ProfileSeed::default()).await;
    let series_id = seed_series(&pool, "u1", &["queued one", "queued two"], 0).await;
    let idea_id = seed_idea(&pool, "u1", "Hot take on hiring").await;

    let first_post = seed_post(
        &pool,
        &PostSeed {
            scheduled_for: Utc::now() + Duration::hours(1),
            ..PostSeed::default()
        },
    )
    .await;
    let second_post = seed_post(
        &pool,
        &PostSeed {
            scheduled_for: Utc::now() + Duration::hours(2),
            ..PostSeed::default()
        },
    )
    .await;

    let ai_server = MockServer::start().await;
    mock_text_generation(&ai_server, "Generated.").await;
    let ai = AiClient::with_base_url(&ai_server.uri()).expect("ai client");

    run_generate_sweep(&generate_ctx(&pool, &ai), Utc::now())
        .await
        .expect("sweep runs");

    // First post consumed the idea.
    let first = autopost_db::get_post(&pool, first_post).await.expect("get");
    assert_eq!(first.topic.as_deref(), Some("Hot take on hiring"));
    assert!(first.topic_index.is_none());

    let idea_used: bool = sqlx::query_scalar("SELECT used FROM ideas WHERE id = $1")
        .bind(idea_id)
        .fetch_one(&pool)
        .await
        .expect("idea row");
    assert!(idea_used, "selected idea must be marked used");

    // Second post fell through to the series queue, at position 0.
    let second = autopost_db::get_post(&pool, second_post).await.expect("get");
    assert_eq!(second.topic.as_deref(), Some("queued one"));
    assert_eq!(second.series_id, Some(series_id));
    assert_eq!(second.topic_index, Some(0));

    // Generation must not advance the series.
    let series = autopost_db::get_series(&pool, series_id).await.expect("series");
    assert_eq!(series.current_index, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn post_with_no_topic_source_is_skipped_with_diagnostic(pool: PgPool) {
    seed_profile(&pool, "u1", &ProfileSeed::default()).await;
    let post_id = seed_post(&pool, &PostSeed::default()).await;

    let ai_server = MockServer::start().await;
    let ai = AiClient::with_base_url(&ai_server.uri()).expect("ai client");

    let outcome = run_generate_sweep(&generate_ctx(&pool, &ai), Utc::now())
        .await
        .expect("sweep runs");

    assert_eq!(outcome.results[0].status, "skipped");
    assert_eq!(
        outcome.results[0].detail.as_deref(),
        Some("no topic available")
    );
    assert_eq!(get_status(&pool, post_id).await, "scheduled");
}

// ---------------------------------------------------------------------------
// Scenario B — cutoff sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cutoff_sweep_skips_expired_reviews_without_touching_series(pool: PgPool) {
    seed_profile(&pool, "u1", &ProfileSeed::default()).await;
    let series_id = seed_series(&pool, "u1", &["a", "b"], 1).await;
    let expired_id = seed_post(
        &pool,
        &PostSeed {
            status: "pending_review",
            content: Some("Draft"),
            review_deadline: Some(Utc::now() - Duration::minutes(1)),
            series_id: Some(series_id),
            topic_index: Some(1),
            ..PostSeed::default()
        },
    )
    .await;
    let fresh_id = seed_post(
        &pool,
        &PostSeed {
            status: "pending_review",
            content: Some("Draft"),
            scheduled_for: Utc::now() + Duration::hours(5),
            review_deadline: Some(Utc::now() + Duration::hours(3)),
            ..PostSeed::default()
        },
    )
    .await;

    let outcome = run_cutoff_sweep(&pool, Utc::now()).await.expect("sweep runs");

    assert_eq!(outcome.processed, 1);
    assert_eq!(get_status(&pool, expired_id).await, "skipped");
    assert_eq!(get_status(&pool, fresh_id).await, "pending_review");

    let series = autopost_db::get_series(&pool, series_id).await.expect("series");
    assert_eq!(series.current_index, 1, "cutoff must never advance a series");
}

// ---------------------------------------------------------------------------
// Scenario C — publish with token refresh and series advancement
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn publish_sweep_refreshes_expired_token_and_advances_series(pool: PgPool) {
    seed_profile(
        &pool,
        "u1",
        &ProfileSeed {
            access_token: Some("expired-token"),
            refresh_token: Some("refresh-1"),
            token_expiry: Some(Utc::now() - Duration::hours(1)),
            ..ProfileSeed::default()
        },
    )
    .await;
    let series_id = seed_series(&pool, "u1", &["a", "b", "c"], 1).await;
    let post_id = seed_post(
        &pool,
        &PostSeed {
            status: "approved",
            scheduled_for: Utc::now() - Duration::minutes(1),
            content: Some("Series body"),
            series_id: Some(series_id),
            topic_index: Some(1),
            ..PostSeed::default()
        },
    )
    .await;

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/v2/accessToken"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "fresh-token",
            "refresh_token": "refresh-2",
            "expires_in": 5_184_000
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/posts"))
        .and(body_string_contains("\"commentary\":\"Series body\""))
        .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:share:42"))
        .mount(&server)
        .await;

    let linkedin = linkedin_client(&server);
    let http = reqwest::Client::new();
    let ctx = PublishContext {
        pool: &pool,
        linkedin: &linkedin,
        http: &http,
    };

    let outcome = run_publish_sweep(&ctx, Utc::now()).await.expect("sweep runs");
    assert_eq!(outcome.processed, 1);
    assert_eq!(outcome.results[0].status, "published");

    let post = autopost_db::get_post(&pool, post_id).await.expect("get");
    assert_eq!(post.status, PostStatus::Published.as_str());
    assert_eq!(post.linkedin_post_id.as_deref(), Some("urn:li:share:42"));
    assert!(post.published_at.is_some());

    // The refreshed pair was persisted for the rest of the batch.
    let profile = autopost_db::get_profile(&pool, "u1")
        .await
        .expect("get")
        .expect("exists");
    assert_eq!(profile.linkedin_access_token.as_deref(), Some("fresh-token"));
    assert_eq!(profile.linkedin_refresh_token.as_deref(), Some("refresh-2"));

    // Exactly one step forward, driven by the published transition.
    let series = autopost_db::get_series(&pool, series_id).await.expect("series");
    assert_eq!(series.current_index, 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn publish_fails_cleanly_when_no_refresh_token_exists(pool: PgPool) {
    seed_profile(
        &pool,
        "u1",
        &ProfileSeed {
            access_token: Some("expired-token"),
            refresh_token: None,
            token_expiry: Some(Utc::now() - Duration::hours(1)),
            ..ProfileSeed::default()
        },
    )
    .await;
    let post_id = seed_post(
        &pool,
        &PostSeed {
            status: "approved",
            scheduled_for: Utc::now() - Duration::minutes(1),
            content: Some("Body"),
            ..PostSeed::default()
        },
    )
    .await;

    let server = MockServer::start().await;
    let linkedin = linkedin_client(&server);
    let http = reqwest::Client::new();
    let ctx = PublishContext {
        pool: &pool,
        linkedin: &linkedin,
        http: &http,
    };

    let outcome = run_publish_sweep(&ctx, Utc::now()).await.expect("sweep runs");
    assert_eq!(outcome.results[0].status, "failed");

    let post = autopost_db::get_post(&pool, post_id).await.expect("get");
    assert_eq!(post.status, PostStatus::Failed.as_str());
    assert!(post
        .failure_reason
        .as_deref()
        .is_some_and(|r| r.contains("refresh token")));
}

// ---------------------------------------------------------------------------
// Scenario D — one post's upload failure never aborts the batch
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upload_failure_marks_one_post_failed_and_batch_continues(pool: PgPool) {
    seed_profile(&pool, "u1", &ProfileSeed::default()).await;
    let series_id = seed_series(&pool, "u1", &["a", "b"], 0).await;

    let media_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/media/pic.png"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x89, 0x50, 0x4e, 0x47]))
        .mount(&media_server)
        .await;

    let failing_id = seed_post(
        &pool,
        &PostSeed {
            status: "approved",
            scheduled_for: Utc::now() - Duration::minutes(10),
            media_type: "image",
            content: Some("Image body"),
            media_url: Some(format!("{}/media/pic.png", media_server.uri())),
            series_id: Some(series_id),
            topic_index: Some(0),
            ..PostSeed::default()
        },
    )
    .await;
    let ok_id = seed_post(
        &pool,
        &PostSeed {
            status: "approved",
            scheduled_for: Utc::now() - Duration::minutes(5),
            content: Some("Text body"),
            ..PostSeed::default()
        },
    )
    .await;

    let server = MockServer::start().await;
    // Upload initialization blows up; plain text posting works.
    Mock::given(method("POST"))
        .and(path("/rest/images"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/posts"))
        .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:share:ok"))
        .mount(&server)
        .await;

    let linkedin = linkedin_client(&server);
    let http = reqwest::Client::new();
    let ctx = PublishContext {
        pool: &pool,
        linkedin: &linkedin,
        http: &http,
    };

    let outcome = run_publish_sweep(&ctx, Utc::now()).await.expect("sweep runs");
    assert_eq!(outcome.processed, 2);

    let failed = autopost_db::get_post(&pool, failing_id).await.expect("get");
    assert_eq!(failed.status, PostStatus::Failed.as_str());
    assert!(failed.failure_reason.is_some());

    let ok = autopost_db::get_post(&pool, ok_id).await.expect("get");
    assert_eq!(ok.status, PostStatus::Published.as_str());

    // The failed series post must not move the queue.
    let series = autopost_db::get_series(&pool, series_id).await.expect("series");
    assert_eq!(series.current_index, 0);
}

// ---------------------------------------------------------------------------
// Scenario E — html carousel preserves captured page order
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn html_post_uploads_pages_in_order_and_publishes_a_carousel(pool: PgPool) {
    seed_profile(&pool, "u1", &ProfileSeed::default()).await;

    let media_server = MockServer::start().await;
    for page in ["p1.png", "p2.png", "p3.png"] {
        Mock::given(method("GET"))
            .and(path(format!("/pages/{page}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![1, 2, 3]))
            .expect(1)
            .mount(&media_server)
            .await;
    }

    let post_id = seed_post(
        &pool,
        &PostSeed {
            status: "approved",
            scheduled_for: Utc::now() - Duration::minutes(1),
            media_type: "html",
            content: Some("Carousel body"),
            image_urls: serde_json::json!([
                format!("{}/pages/p1.png", media_server.uri()),
                format!("{}/pages/p2.png", media_server.uri()),
                format!("{}/pages/p3.png", media_server.uri()),
            ]),
            ..PostSeed::default()
        },
    )
    .await;

    let server = MockServer::start().await;
    // One-shot initialize mocks, consumed in mount order: the first page's
    // upload gets urn p1, the second p2, the third p3.
    for urn in ["urn:li:image:p1", "urn:li:image:p2", "urn:li:image:p3"] {
        Mock::given(method("POST"))
            .and(path("/rest/images"))
            .and(query_param("action", "initializeUpload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": {
                    "uploadUrl": format!("{}/upload-slot", server.uri()),
                    "image": urn
                }
            })))
            .up_to_n_times(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("PUT"))
        .and(path("/upload-slot"))
        .respond_with(ResponseTemplate::new(201))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/rest/posts"))
        .and(body_string_contains(
            "{\"id\":\"urn:li:image:p1\"},{\"id\":\"urn:li:image:p2\"},{\"id\":\"urn:li:image:p3\"}",
        ))
        .respond_with(ResponseTemplate::new(201).insert_header("x-restli-id", "urn:li:share:html"))
        .mount(&server)
        .await;

    let linkedin = linkedin_client(&server);
    let http = reqwest::Client::new();
    let ctx = PublishContext {
        pool: &pool,
        linkedin: &linkedin,
        http: &http,
    };

    let outcome = run_publish_sweep(&ctx, Utc::now()).await.expect("sweep runs");
    assert_eq!(outcome.results[0].status, "published");

    let post = autopost_db::get_post(&pool, post_id).await.expect("get");
    assert_eq!(post.status, PostStatus::Published.as_str());
    assert_eq!(post.linkedin_post_id.as_deref(), Some("urn:li:share:html"));
}

// ---------------------------------------------------------------------------
// Schedule sweep
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn schedule_sweep_materializes_slots_idempotently(pool: PgPool) {
    seed_profile(
        &pool,
        "u1",
        &ProfileSeed {
            posting_schedule: serde_json::json!([
                {"weekday": 0, "enabled": true, "post_time": "09:00"},
                {"weekday": 3, "enabled": true, "post_time": "15:00"}
            ]),
            ..ProfileSeed::default()
        },
    )
    .await;

    let now = Utc::now();
    let first = run_schedule_sweep(&pool, now).await.expect("run 1");
    assert!(first.processed >= 2, "a week holds both weekday slots");

    let second = run_schedule_sweep(&pool, now).await.expect("run 2");
    assert_eq!(second.processed, 0, "second run must create nothing");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE user_id = 'u1'")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(usize::try_from(count).expect("fits"), first.processed);
}
