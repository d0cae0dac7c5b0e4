use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use sqlx::PgPool;
use tower::ServiceExt;

use chronicle::application::pagination::ListingPolicy;
use chronicle::application::repos::{
    HealthRepo, StoriesRepo, StoriesWriteRepo, TopicsRepo, TopicsWriteRepo,
};
use chronicle::application::stories::StoryService;
use chronicle::application::topics::TopicService;
use chronicle::cache::{CacheConfig, CacheState};
use chronicle::infra::db::PostgresRepositories;
use chronicle::infra::http::{self, ApiState};

fn build_app(pool: PgPool) -> Router {
    let repos = Arc::new(PostgresRepositories::new(pool));

    let stories_repo: Arc<dyn StoriesRepo> = repos.clone();
    let stories_write_repo: Arc<dyn StoriesWriteRepo> = repos.clone();
    let topics_repo: Arc<dyn TopicsRepo> = repos.clone();
    let topics_write_repo: Arc<dyn TopicsWriteRepo> = repos.clone();
    let health_repo: Arc<dyn HealthRepo> = repos;

    let state = ApiState {
        stories: Arc::new(StoryService::new(stories_repo, stories_write_repo)),
        topics: Arc::new(TopicService::new(topics_repo, topics_write_repo)),
        health: health_repo,
        story_listing: ListingPolicy::stories(20, 100),
        topic_listing: ListingPolicy::topics(20, 100),
    };

    let cache = CacheState::disabled(CacheConfig {
        enabled: false,
        ..CacheConfig::default()
    });

    http::build_router(state, cache)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).expect("request"))
        .await
        .expect("response");
    let status = response.status();
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

async fn create_topic(app: &Router, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/topics/insert",
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["topic"]["id"].as_i64().expect("topic id")
}

async fn create_story(app: &Router, title: &str, topics: &[i64]) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/stories/insert",
        Some(json!({
            "title": title,
            "excerpt": "Short excerpt",
            "content": "Body text",
            "reporter": "Reporter",
            "editor": "Editor",
            "author": "Author",
            "topics": topics,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["story"].clone()
}

fn topic_ids(story: &Value) -> Vec<i64> {
    story["topics"]
        .as_array()
        .expect("topics array")
        .iter()
        .map(|topic| topic["id"].as_i64().expect("topic id"))
        .collect()
}

#[sqlx::test(migrations = "./migrations")]
async fn stories_are_filed_under_their_topics(pool: PgPool) {
    let app = build_app(pool);
    let politics = create_topic(&app, "Politics").await;
    let economy = create_topic(&app, "Economy").await;

    let both = create_story(&app, "Budget Vote Passes", &[politics, economy]).await;
    assert_eq!(both["slug"], "budget-vote-passes");
    assert_eq!(both["status"], "Draft");
    assert_eq!(topic_ids(&both), vec![politics, economy]);

    create_story(&app, "Market Rally", &[economy]).await;
    create_story(&app, "Unfiled Note", &[]).await;

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/stories/?topic={politics}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let stories = body["stories"].as_array().expect("stories");
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0]["title"], "Budget Vote Passes");
    assert_eq!(topic_ids(&stories[0]), vec![politics, economy]);
    assert_eq!(body["pagination"]["totalItems"], 1);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/stories/?topic={economy}&sort-by=createdAt&order=asc"),
        None,
    )
    .await;
    let titles: Vec<&str> = body["stories"]
        .as_array()
        .expect("stories")
        .iter()
        .map(|story| story["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["Budget Vote Passes", "Market Rally"]);
    assert_eq!(body["pagination"]["totalItems"], 2);

    let (_, body) = send(&app, Method::GET, "/api/stories/", None).await;
    let unfiled = body["stories"]
        .as_array()
        .expect("stories")
        .iter()
        .find(|story| story["title"] == "Unfiled Note")
        .expect("unfiled story listed");
    assert_eq!(unfiled["topics"], json!([]));
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_links_do_not_duplicate_listing_rows(pool: PgPool) {
    let app = build_app(pool.clone());
    let topic = create_topic(&app, "Sports").await;
    let story = create_story(&app, "Derby Day", &[topic]).await;
    let story_id = story["id"].as_i64().expect("story id");

    sqlx::query("INSERT INTO topic_stories (story_id, topic_id) VALUES ($1, $2)")
        .bind(story_id)
        .bind(topic)
        .execute(&pool)
        .await
        .expect("duplicate link");

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/stories/?topic={topic}"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let stories = body["stories"].as_array().expect("stories");
    assert_eq!(stories.len(), 1);
    assert_eq!(body["pagination"]["totalItems"], 1);
    assert_eq!(topic_ids(&stories[0]), vec![topic]);
}

#[sqlx::test(migrations = "./migrations")]
async fn pagination_reports_totals_and_slices(pool: PgPool) {
    let app = build_app(pool);
    for title in ["One", "Two", "Three", "Four", "Five"] {
        create_story(&app, title, &[]).await;
    }

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/stories/?page=3&limit=2&sort-by=createdAt&order=asc",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["pagination"],
        json!({ "totalItems": 5, "page": 3, "itemsPerPage": 2, "totalPage": 3 })
    );
    let stories = body["stories"].as_array().expect("stories");
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0]["title"], "Five");

    let (_, body) = send(&app, Method::GET, "/api/stories/?page=4&limit=2", None).await;
    assert_eq!(body["stories"], json!([]));
    assert_eq!(body["pagination"]["totalItems"], 5);

    let (status, body) = send(&app, Method::GET, "/api/stories/?limit=100", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["itemsPerPage"], 100);
    assert_eq!(body["stories"].as_array().expect("stories").len(), 5);

    let (status, body) = send(&app, Method::GET, "/api/stories/?limit=500", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_query");
}

#[sqlx::test(migrations = "./migrations")]
async fn status_filter_matches_publish_state(pool: PgPool) {
    let app = build_app(pool);
    let draft = create_story(&app, "Still Drafting", &[]).await;
    let published = create_story(&app, "Ready To Go", &[]).await;

    let (status, _) = send(
        &app,
        Method::PATCH,
        &format!("/api/stories/{}/update", published["id"]),
        Some(json!({ "status": "Publish" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = send(&app, Method::GET, "/api/stories/?status=Publish", None).await;
    let stories = body["stories"].as_array().expect("stories");
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0]["id"], published["id"]);
    assert_eq!(stories[0]["status"], "Publish");

    let (_, body) = send(&app, Method::GET, "/api/stories/?status=Draft", None).await;
    let stories = body["stories"].as_array().expect("stories");
    assert_eq!(stories.len(), 1);
    assert_eq!(stories[0]["id"], draft["id"]);

    let (status, body) = send(&app, Method::GET, "/api/stories/?status=Archived", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_query");
}

#[sqlx::test(migrations = "./migrations")]
async fn partial_update_keeps_unsupplied_fields(pool: PgPool) {
    let app = build_app(pool);
    let first = create_topic(&app, "Health").await;
    let second = create_topic(&app, "Science").await;
    let story = create_story(&app, "Clinic Opens", &[first]).await;
    let id = story["id"].as_i64().expect("id");

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/stories/{id}/update"),
        Some(json!({ "excerpt": "Updated excerpt", "title": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["story"]["title"], "Clinic Opens");
    assert_eq!(body["story"]["slug"], "clinic-opens");
    assert_eq!(body["story"]["excerpt"], "Updated excerpt");
    assert_eq!(body["story"]["content"], "Body text");
    assert_eq!(topic_ids(&body["story"]), vec![first]);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/stories/{id}/update"),
        Some(json!({ "title": "Clinic Opens Early", "topics": [second] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["story"]["slug"], "clinic-opens-early");
    assert_eq!(topic_ids(&body["story"]), vec![second]);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/stories/{id}/update"),
        Some(json!({ "topics": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(topic_ids(&body["story"]), vec![second]);

    let (status, body) = send(
        &app,
        Method::PATCH,
        "/api/stories/999999/update",
        Some(json!({ "excerpt": "nobody" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "not_found");
}

#[sqlx::test(migrations = "./migrations")]
async fn stories_resolve_by_id_or_slug(pool: PgPool) {
    let app = build_app(pool);
    let story = create_story(&app, "Harbour Bridge Reopens", &[]).await;

    let (status, by_slug) = send(
        &app,
        Method::GET,
        "/api/stories/harbour-bridge-reopens",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_slug["story"]["id"], story["id"]);

    let (status, by_id) = send(
        &app,
        Method::GET,
        &format!("/api/stories/{}", story["id"]),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_id["story"]["slug"], "harbour-bridge-reopens");

    let (status, _) = send(&app, Method::GET, "/api/stories/no-such-story", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn deleting_a_story_removes_it_and_its_links(pool: PgPool) {
    let app = build_app(pool.clone());
    let topic = create_topic(&app, "Weather").await;
    let story = create_story(&app, "Storm Warning", &[topic]).await;
    let id = story["id"].as_i64().expect("id");

    let (status, body) = send(&app, Method::DELETE, &format!("/api/stories/{id}/delete"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": 200, "message": "Story Deleted" }));

    let (status, _) = send(&app, Method::GET, &format!("/api/stories/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let links: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM topic_stories WHERE story_id = $1")
        .bind(id)
        .fetch_one(&pool)
        .await
        .expect("count links");
    assert_eq!(links, 0);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/stories/{id}/delete"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn topics_support_crud_and_reject_duplicates(pool: PgPool) {
    let app = build_app(pool);
    let id = create_topic(&app, "Local News").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/topics/insert",
        Some(json!({ "name": "Local News" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "duplicate");

    let (status, body) = send(&app, Method::GET, "/api/topics/local-news", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic"]["id"], id);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/topics/{id}/update"),
        Some(json!({ "name": "Regional News" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topic"]["slug"], "regional-news");

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/topics/?sort-by=createdAt&order=desc",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["topics"].as_array().expect("topics").len(), 1);

    let (status, body) = send(&app, Method::DELETE, &format!("/api/topics/{id}/delete"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Topic Deleted");

    let (status, _) = send(&app, Method::GET, &format!("/api/topics/{id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn topic_listing_requires_explicit_sort(pool: PgPool) {
    let app = build_app(pool);

    let (status, body) = send(&app, Method::GET, "/api/topics/", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "invalid_query");
}

#[sqlx::test(migrations = "./migrations")]
async fn malformed_payloads_are_bad_requests(pool: PgPool) {
    let app = build_app(pool);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/stories/insert",
        Some(json!({ "title": "Missing fields" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "bad_request");

    let (status, _) = send(
        &app,
        Method::PATCH,
        "/api/stories/abc/update",
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "./migrations")]
async fn datastore_failures_are_opaque_to_clients(pool: PgPool) {
    let app = build_app(pool.clone());
    create_story(&app, "Before The Outage", &[]).await;

    sqlx::query("DROP TABLE topic_stories")
        .execute(&pool)
        .await
        .expect("drop links");

    let (status, body) = send(&app, Method::GET, "/api/stories/", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "repo_error");
    assert!(body["error"].get("hint").is_none(), "{body}");
    assert!(!body.to_string().contains("topic_stories"));
}

#[sqlx::test(migrations = "./migrations")]
async fn health_reports_no_content(pool: PgPool) {
    let app = build_app(pool);
    let (status, body) = send(&app, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);
}
