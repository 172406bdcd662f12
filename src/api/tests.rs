//! HTTP integration tests
//!
//! Exercise the full router against an in-memory database, form posts and
//! all, the same way a browser would drive the site.

use axum::http::StatusCode;
use axum_test::TestServer;
use std::sync::Arc;

use crate::api::{build_router, AppState};
use crate::config::ListingConfig;
use crate::db::repositories::{SqlxGenreRepository, SqlxPartRepository, SqlxStoryRepository};
use crate::db::{create_test_pool, migrations};
use crate::services::{CatalogService, GenreService, StoryService, WriteGuard};
use crate::view::ViewEngine;

const SECRET: &str = "test-secret";

async fn setup_server() -> TestServer {
    let pool = create_test_pool().await.expect("Failed to create test pool");
    migrations::run_migrations(&pool)
        .await
        .expect("Failed to run migrations");

    let stories = SqlxStoryRepository::boxed(pool.clone());
    let parts = SqlxPartRepository::boxed(pool.clone());
    let genres = SqlxGenreRepository::boxed(pool);

    let state = AppState {
        stories: Arc::new(StoryService::new(
            stories.clone(),
            parts.clone(),
            genres.clone(),
        )),
        catalog: Arc::new(CatalogService::new(stories, parts, genres.clone())),
        genres: Arc::new(GenreService::new(genres)),
        guard: Arc::new(WriteGuard::new(SECRET)),
        views: Arc::new(ViewEngine::new().expect("Failed to build view engine")),
        listing: ListingConfig {
            per_page: 10,
            admin_per_page: 25,
        },
    };

    TestServer::new(build_router(state)).expect("Failed to start test server")
}

fn form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

async fn post_form(server: &TestServer, path: &str, pairs: &[(&str, &str)]) -> axum_test::TestResponse {
    server
        .post(path)
        .text(form(pairs))
        .content_type("application/x-www-form-urlencoded")
        .await
}

/// Create a story through the upload endpoint and return its id.
async fn create_story(server: &TestServer, title: &str, content: &str) -> i64 {
    let response = post_form(
        server,
        "/upload",
        &[
            ("title", title),
            ("author", ""),
            ("length", "short"),
            ("content", content),
            ("secret", SECRET),
        ],
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);

    let location = response
        .headers()
        .get("location")
        .expect("redirect must carry a location")
        .to_str()
        .unwrap()
        .to_string();
    location
        .rsplit('/')
        .next()
        .and_then(|id| id.parse().ok())
        .expect("redirect location must end with the story id")
}

#[tokio::test]
async fn test_home_page_renders() {
    let server = setup_server().await;

    let response = server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("Đọc Truyện"));
}

#[tokio::test]
async fn test_create_story_and_see_it_listed() {
    let server = setup_server().await;

    create_story(&server, "Hành Trình", "Chương 1...").await;

    let home = server.get("/").await;
    assert_eq!(home.status_code(), StatusCode::OK);
    assert!(home.text().contains("Hành Trình"));
    // Blank author shows as the anonymous pseudonym
    assert!(home.text().contains("Ẩn danh"));
}

#[tokio::test]
async fn test_create_story_wrong_secret_is_rejected() {
    let server = setup_server().await;

    let response = post_form(
        &server,
        "/upload",
        &[
            ("title", "Bị chặn"),
            ("length", "short"),
            ("content", "Nội dung"),
            ("secret", "wrong"),
        ],
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    // Nothing was created
    let home = server.get("/").await;
    assert!(!home.text().contains("Bị chặn"));
}

#[tokio::test]
async fn test_create_story_empty_title_rerenders_form() {
    let server = setup_server().await;

    let response = post_form(
        &server,
        "/upload",
        &[
            ("title", "  "),
            ("length", "short"),
            ("content", "Nội dung quan trọng"),
            ("secret", SECRET),
        ],
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    // Submitted content is kept in the re-rendered form
    assert!(response.text().contains("Nội dung quan trọng"));
}

#[tokio::test]
async fn test_story_detail_counts_views_and_navigates_parts() {
    let server = setup_server().await;

    let id = create_story(&server, "Nhiều phần", "Chương 1").await;
    post_form(
        &server,
        &format!("/story/{}/parts", id),
        &[("content", "Chương 2"), ("secret", SECRET)],
    )
    .await
    .assert_status(StatusCode::SEE_OTHER);

    let first = server.get(&format!("/story/{}", id)).await;
    assert_eq!(first.status_code(), StatusCode::OK);
    assert!(first.text().contains("Chương 1"));

    let second = server
        .get(&format!("/story/{}", id))
        .add_query_param("part", 2)
        .await;
    assert_eq!(second.status_code(), StatusCode::OK);
    assert!(second.text().contains("Chương 2"));

    // Two detail requests so far, each counted once
    assert!(second.text().contains("2 lượt xem"));

    let out_of_range = server
        .get(&format!("/story/{}", id))
        .add_query_param("part", 9)
        .await;
    assert_eq!(out_of_range.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_story_renders_not_found_page() {
    let server = setup_server().await;

    let response = server.get("/story/999").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.text().contains("Không tìm thấy"));
}

#[tokio::test]
async fn test_unknown_path_renders_not_found_page() {
    let server = setup_server().await;

    let response = server.get("/no-such-page").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert!(response.text().contains("Không tìm thấy"));
}

#[tokio::test]
async fn test_remove_last_part_conflict_on_single_part() {
    let server = setup_server().await;

    let id = create_story(&server, "Một phần", "Chương 1").await;
    let response = post_form(
        &server,
        &format!("/story/{}/parts/remove-last", id),
        &[("secret", SECRET)],
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_rate_story_validates_range() {
    let server = setup_server().await;

    let id = create_story(&server, "Được chấm", "Nội dung").await;

    post_form(&server, &format!("/story/{}/rate", id), &[("rating", "5")])
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let bad = post_form(&server, &format!("/story/{}/rate", id), &[("rating", "9")]).await;
    assert_eq!(bad.status_code(), StatusCode::BAD_REQUEST);

    let detail = server.get(&format!("/story/{}", id)).await;
    assert!(detail.text().contains("Đánh giá: 5"));
}

#[tokio::test]
async fn test_search_endpoint() {
    let server = setup_server().await;

    create_story(&server, "Hành Trình Về Phương Đông", "mở đầu").await;
    create_story(&server, "Truyện khác", "nội dung khác").await;

    let hits = server.get("/search").add_query_param("q", "hành trình").await;
    assert_eq!(hits.status_code(), StatusCode::OK);
    assert!(hits.text().contains("Hành Trình Về Phương Đông"));
    assert!(!hits.text().contains("Truyện khác"));

    let empty = server.get("/search").add_query_param("q", "").await;
    assert_eq!(empty.status_code(), StatusCode::OK);
    assert!(empty.text().contains("Không tìm thấy truyện nào"));
}

#[tokio::test]
async fn test_genre_management_flow() {
    let server = setup_server().await;

    post_form(&server, "/genres", &[("name", "Kiếm hiệp"), ("secret", SECRET)])
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let listing = server.get("/genres").await;
    assert!(listing.text().contains("Kiếm hiệp"));

    // Duplicate name conflicts
    let dup = post_form(&server, "/genres", &[("name", "Kiếm hiệp"), ("secret", SECRET)]).await;
    assert_eq!(dup.status_code(), StatusCode::CONFLICT);

    // Wrong secret cannot create
    let unauthorized =
        post_form(&server, "/genres", &[("name", "Lén lút"), ("secret", "wrong")]).await;
    assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);

    post_form(&server, "/genres/1/update", &[("name", "Tiên hiệp"), ("secret", SECRET)])
        .await
        .assert_status(StatusCode::SEE_OTHER);
    let listing = server.get("/genres").await;
    assert!(listing.text().contains("Tiên hiệp"));

    post_form(&server, "/genres/1/delete", &[("secret", SECRET)])
        .await
        .assert_status(StatusCode::SEE_OTHER);
    let listing = server.get("/genres").await;
    assert!(listing.text().contains("Chưa có thể loại nào"));
}

#[tokio::test]
async fn test_hidden_story_disappears_from_readers() {
    let server = setup_server().await;

    let id = create_story(&server, "Sắp ẩn", "Nội dung").await;

    post_form(
        &server,
        &format!("/story/{}/toggle-hidden", id),
        &[("secret", SECRET)],
    )
    .await
    .assert_status(StatusCode::SEE_OTHER);

    let home = server.get("/").await;
    assert!(!home.text().contains("Sắp ẩn"));

    let detail = server.get(&format!("/story/{}", id)).await;
    assert_eq!(detail.status_code(), StatusCode::NOT_FOUND);

    // Still reachable through the edit form
    let edit = server.get(&format!("/upload/{}", id)).await;
    assert_eq!(edit.status_code(), StatusCode::OK);
}

#[tokio::test]
async fn test_delete_story_via_endpoint() {
    let server = setup_server().await;

    let id = create_story(&server, "Sắp xóa", "Nội dung").await;
    post_form(&server, &format!("/story/{}/delete", id), &[("secret", SECRET)])
        .await
        .assert_status(StatusCode::SEE_OTHER);

    let detail = server.get(&format!("/story/{}", id)).await;
    assert_eq!(detail.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_upload_page_lists_all_stories_with_scoped_search() {
    let server = setup_server().await;

    let hidden = create_story(&server, "Truyện ẩn", "nội dung bí mật").await;
    create_story(&server, "Truyện hiện", "nội dung thường").await;
    post_form(
        &server,
        &format!("/story/{}/toggle-hidden", hidden),
        &[("secret", SECRET)],
    )
    .await
    .assert_status(StatusCode::SEE_OTHER);

    // Hidden stories stay on the management list
    let page = server.get("/upload").await;
    assert_eq!(page.status_code(), StatusCode::OK);
    assert!(page.text().contains("Truyện ẩn"));
    assert!(page.text().contains("Truyện hiện"));

    // Title scope does not match part content
    let by_title = server.get("/upload").add_query_param("q", "bí mật").await;
    assert!(!by_title.text().contains("Truyện ẩn"));

    // Content scope does
    let by_content = server
        .get("/upload")
        .add_query_param("q", "bí mật")
        .add_query_param("scope", "content")
        .await;
    assert!(by_content.text().contains("Truyện ẩn"));
    assert!(!by_content.text().contains("Truyện hiện"));
}

#[tokio::test]
async fn test_genre_and_length_and_author_listings() {
    let server = setup_server().await;

    post_form(&server, "/genres", &[("name", "Kiếm hiệp"), ("secret", SECRET)])
        .await
        .assert_status(StatusCode::SEE_OTHER);

    // Story in the genre, long form, named author
    let response = post_form(
        &server,
        "/upload",
        &[
            ("title", "Trong thể loại"),
            ("author", "Nguyễn Văn A"),
            ("length", "long"),
            ("genre_ids", "1"),
            ("content", "Nội dung"),
            ("secret", SECRET),
        ],
    )
    .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    create_story(&server, "Ngoài thể loại", "Nội dung").await;

    let by_genre = server.get("/genre/1").await;
    assert!(by_genre.text().contains("Trong thể loại"));
    assert!(!by_genre.text().contains("Ngoài thể loại"));

    let long = server.get("/type/long").await;
    assert!(long.text().contains("Trong thể loại"));
    let short = server.get("/type/short").await;
    assert!(short.text().contains("Ngoài thể loại"));
    let bogus = server.get("/type/epic").await;
    assert_eq!(bogus.status_code(), StatusCode::NOT_FOUND);

    let by_author = server
        .get(&format!("/author/{}", urlencoding::encode("Nguyễn Văn A")))
        .await;
    assert!(by_author.text().contains("Trong thể loại"));
}
