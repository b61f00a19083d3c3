mod common;

use axum::http::{Method, StatusCode};
use blogicum::{models::PostForm, repository::Repository};
use common::{TestApp, draft_form, get, post_form, send, titles};
use serde_json::json;

#[tokio::test]
async fn admin_surface_requires_the_admin_role() {
    let app = TestApp::new();
    let ann = app.author("ann").await;

    assert_eq!(get(&app, "/admin/categories", None).await.status, StatusCode::UNAUTHORIZED);
    assert_eq!(get(&app, "/admin/categories", Some(&ann)).await.status, StatusCode::FORBIDDEN);

    let res = send(
        &app,
        Method::POST,
        "/admin/categories",
        Some(&ann),
        Some(json!({ "title": "t", "slug": "t" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn category_slugs_are_validated_and_unique() {
    let app = TestApp::new();
    let root = app.admin("root").await;

    let res = send(
        &app,
        Method::POST,
        "/admin/categories",
        Some(&root),
        Some(json!({ "title": "Travel", "slug": "travel_2024" })),
    )
    .await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["is_published"], true);

    let duplicate = send(
        &app,
        Method::POST,
        "/admin/categories",
        Some(&root),
        Some(json!({ "title": "Again", "slug": "travel_2024" })),
    )
    .await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let bad_slug = send(
        &app,
        Method::POST,
        "/admin/categories",
        Some(&root),
        Some(json!({ "title": "Bad", "slug": "путешествия" })),
    )
    .await;
    assert_eq!(bad_slug.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(bad_slug.body["fields"]["slug"].is_array());
}

#[tokio::test]
async fn unpublishing_a_category_hides_its_posts() {
    let app = TestApp::new();
    let root = app.admin("root").await;
    let ann = app.author("ann").await;
    let travel = app.category("travel", true).await;
    app.post(
        &ann,
        PostForm {
            category_id: Some(travel.id),
            ..post_form("trip", 1)
        },
    )
    .await;
    assert_eq!(titles(&get(&app, "/posts", None).await.body), vec!["trip"]);

    let res = send(
        &app,
        Method::PUT,
        &format!("/admin/categories/{}", travel.id),
        Some(&root),
        Some(json!({ "title": "Travel", "slug": "travel", "is_published": false })),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    assert!(titles(&get(&app, "/posts", None).await.body).is_empty());
    assert_eq!(get(&app, "/category/travel", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_category_or_location_detaches_posts() {
    let app = TestApp::new();
    let root = app.admin("root").await;
    let ann = app.author("ann").await;
    let hidden = app.category("hidden", false).await;

    let location = send(
        &app,
        Method::POST,
        "/admin/locations",
        Some(&root),
        Some(json!({ "name": "Lisbon" })),
    )
    .await;
    assert_eq!(location.status, StatusCode::CREATED);
    let location_id = location.body["id"].as_i64().unwrap();

    let post = app
        .post(
            &ann,
            PostForm {
                category_id: Some(hidden.id),
                location_id: Some(location_id),
                ..post_form("survivor", 1)
            },
        )
        .await;

    let res = send(&app, Method::DELETE, &format!("/admin/categories/{}", hidden.id), Some(&root), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    let res = send(&app, Method::DELETE, &format!("/admin/locations/{location_id}"), Some(&root), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    let stored = app.repo.get_post(post.id).await.unwrap().unwrap();
    assert_eq!(stored.category_id, None);
    assert_eq!(stored.location_id, None);
    // Without a hidden category the post becomes visible.
    assert_eq!(titles(&get(&app, "/posts", None).await.body), vec!["survivor"]);

    let again = send(&app, Method::DELETE, &format!("/admin/categories/{}", hidden.id), Some(&root), None).await;
    assert_eq!(again.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_listing_includes_hidden_posts_and_filters() {
    let app = TestApp::new();
    let root = app.admin("root").await;
    let ann = app.author("ann").await;
    let bob = app.author("bob").await;
    app.post(&ann, post_form("Rust tips", 1)).await;
    app.post(&ann, draft_form("rust draft")).await;
    app.post(&bob, post_form("Cooking", 2)).await;

    let all = get(&app, "/admin/posts", Some(&root)).await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body["total"], 3);

    let search = get(&app, "/admin/posts?search=RUST", Some(&root)).await;
    assert_eq!(search.body["total"], 2);

    let by_author = get(&app, &format!("/admin/posts?author={}", bob.id), Some(&root)).await;
    assert_eq!(titles(&by_author.body), vec!["Cooking"]);
}

#[tokio::test]
async fn moderation_can_unpublish_a_post() {
    let app = TestApp::new();
    let root = app.admin("root").await;
    let ann = app.author("ann").await;
    let post = app.post(&ann, post_form("flagged", 1)).await;
    let uri = format!("/admin/posts/{}", post.id);

    let res = send(&app, Method::PATCH, &uri, Some(&root), Some(json!({ "is_published": false }))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["is_published"], false);
    assert_eq!(get(&app, &format!("/posts/{}", post.id), None).await.status, StatusCode::NOT_FOUND);

    let res = send(
        &app,
        Method::PATCH,
        &uri,
        Some(&root),
        Some(json!({ "is_published": true, "category_id": 777 })),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let missing = send(&app, Method::PATCH, "/admin/posts/999", Some(&root), Some(json!({ "is_published": true }))).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn moderation_checks_the_role_before_the_body() {
    let app = TestApp::new();
    let root = app.admin("root").await;
    let ann = app.author("ann").await;
    let post = app.post(&ann, post_form("flagged", 1)).await;
    let uri = format!("/admin/posts/{}", post.id);
    let untyped = json!({ "is_published": "nope" });

    let res = send(&app, Method::PATCH, &uri, Some(&ann), Some(untyped.clone())).await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);

    let res = send(&app, Method::PATCH, &uri, Some(&root), Some(untyped)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body["fields"]["body"].is_array());
}

#[tokio::test]
async fn admin_can_search_edit_and_delete_comments() {
    let app = TestApp::new();
    let root = app.admin("root").await;
    let ann = app.author("ann").await;
    let post = app.post(&ann, post_form("post", 1)).await;
    let spam = app.comment(&post, &ann, "buy cheap watches").await;
    app.comment(&post, &ann, "great read").await;

    let res = get(&app, "/admin/comments?search=cheap", Some(&root)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body.as_array().unwrap().len(), 1);

    let uri = format!("/admin/comments/{}", spam.id);
    let res = send(&app, Method::PATCH, &uri, Some(&root), Some(json!({ "text": "[removed]" }))).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["text"], "[removed]");

    let res = send(&app, Method::DELETE, &uri, Some(&root), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(app.repo.get_comment(spam.id).await.unwrap().is_none());
}

#[tokio::test]
async fn deleting_a_user_removes_everything_they_wrote() {
    let app = TestApp::new();
    let root = app.admin("root").await;
    let ann = app.author("ann").await;
    let bob = app.author("bob").await;
    let anns_post = app.post(&ann, post_form("ann's post", 1)).await;
    let bobs_post = app.post(&bob, post_form("bob's post", 2)).await;
    let on_anns = app.comment(&anns_post, &bob, "bob on ann").await;
    let on_bobs = app.comment(&bobs_post, &ann, "ann on bob").await;
    let bob_self = app.comment(&bobs_post, &bob, "bob on bob").await;

    let res = send(&app, Method::DELETE, &format!("/admin/users/{}", ann.id), Some(&root), None).await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);

    assert!(app.repo.get_user(ann.id).await.unwrap().is_none());
    assert!(app.repo.get_post(anns_post.id).await.unwrap().is_none());
    assert!(app.repo.get_comment(on_anns.id).await.unwrap().is_none());
    assert!(app.repo.get_comment(on_bobs.id).await.unwrap().is_none());
    assert!(app.repo.get_comment(bob_self.id).await.unwrap().is_some());
    assert_eq!(get(&app, "/profile/ann", None).await.status, StatusCode::NOT_FOUND);
}
