mod common;

use axum::http::{Method, StatusCode};
use blogicum::{models::PostForm, repository::Repository};
use chrono::{Duration, Utc};
use common::{TestApp, draft_form, get, post_form, send, titles};
use serde_json::json;

#[tokio::test]
async fn index_lists_only_visible_posts_newest_first() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let hidden = app.category("hidden", false).await;

    app.post(&ann, post_form("older", 3)).await;
    app.post(&ann, post_form("newer", 1)).await;
    app.post(&ann, draft_form("draft")).await;
    app.post(&ann, post_form("scheduled", -2)).await;
    app.post(
        &ann,
        PostForm {
            category_id: Some(hidden.id),
            ..post_form("in hidden category", 1)
        },
    )
    .await;

    let res = get(&app, "/posts", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(titles(&res.body), vec!["newer", "older"]);
    assert_eq!(res.body["total"], 2);
}

#[tokio::test]
async fn listing_pages_clamp_instead_of_failing() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    for i in 0..25 {
        app.post(&ann, post_form(&format!("post {i:02}"), i + 1)).await;
    }

    let first = get(&app, "/posts", None).await;
    assert_eq!(first.body["number"], 1);
    assert_eq!(first.body["num_pages"], 3);
    assert_eq!(first.body["items"].as_array().unwrap().len(), 10);
    assert_eq!(titles(&first.body)[0], "post 00");
    assert_eq!(first.body["has_previous"], false);

    let last = get(&app, "/posts?page=3", None).await;
    assert_eq!(last.body["items"].as_array().unwrap().len(), 5);
    assert_eq!(last.body["has_next"], false);

    let beyond = get(&app, "/posts?page=99", None).await;
    assert_eq!(beyond.status, StatusCode::OK);
    assert_eq!(beyond.body["number"], 3);

    let garbage = get(&app, "/posts?page=abc", None).await;
    assert_eq!(garbage.status, StatusCode::OK);
    assert_eq!(garbage.body["number"], 1);
}

#[tokio::test]
async fn empty_index_still_has_one_page() {
    let app = TestApp::new();

    let res = get(&app, "/posts?page=5", None).await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["number"], 1);
    assert_eq!(res.body["num_pages"], 1);
    assert!(res.body["items"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn hidden_post_is_404_for_everyone_but_its_author() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let bob = app.author("bob").await;
    let draft = app.post(&ann, draft_form("secret")).await;
    let uri = format!("/posts/{}", draft.id);

    assert_eq!(get(&app, &uri, None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, &uri, Some(&bob)).await.status, StatusCode::NOT_FOUND);

    let own = get(&app, &uri, Some(&ann)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["post"]["title"], "secret");
}

#[tokio::test]
async fn missing_post_is_404() {
    let app = TestApp::new();
    assert_eq!(get(&app, "/posts/999", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn category_page_requires_a_published_category() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let travel = app.category("travel", true).await;
    let hidden = app.category("hidden", false).await;
    let food = app.category("food", true).await;

    for (title, category_id) in [("trip", travel.id), ("secret", hidden.id), ("soup", food.id)] {
        app.post(
            &ann,
            PostForm {
                category_id: Some(category_id),
                ..post_form(title, 1)
            },
        )
        .await;
    }
    app.post(
        &ann,
        PostForm {
            category_id: Some(travel.id),
            ..draft_form("unfinished trip")
        },
    )
    .await;

    let res = get(&app, "/category/travel", None).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["category"]["slug"], "travel");
    assert_eq!(titles(&res.body["page"]), vec!["trip"]);

    assert_eq!(get(&app, "/category/hidden", None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, "/category/nope", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_owner_sees_drafts_and_scheduled_posts() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let bob = app.author("bob").await;
    app.post(&ann, post_form("public", 1)).await;
    app.post(&ann, draft_form("draft")).await;
    app.post(&ann, post_form("scheduled", -3)).await;
    app.post(&bob, post_form("bob's", 1)).await;

    let own = get(&app, "/profile/ann", Some(&ann)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["profile"]["username"], "ann");
    assert_eq!(own.body["page"]["total"], 3);
    assert_eq!(titles(&own.body["page"])[0], "scheduled");

    let other = get(&app, "/profile/ann", Some(&bob)).await;
    assert_eq!(titles(&other.body["page"]), vec!["public"]);

    let anonymous = get(&app, "/profile/ann", None).await;
    assert_eq!(titles(&anonymous.body["page"]), vec!["public"]);

    assert_eq!(get(&app, "/profile/nobody", None).await.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_post_uses_the_requesting_author() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let body = json!({
        "title": "Hello",
        "text": "First post",
        "pub_date": (Utc::now() - Duration::hours(1)).to_rfc3339(),
    });

    let anonymous = send(&app, Method::POST, "/posts", None, Some(body.clone())).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let res = send(&app, Method::POST, "/posts", Some(&ann), Some(body)).await;
    assert_eq!(res.status, StatusCode::CREATED);
    assert_eq!(res.body["author_id"], ann.id.to_string());
    assert_eq!(res.body["author_username"], "ann");
    assert_eq!(res.body["is_published"], true);
    assert_eq!(res.body["comment_count"], 0);
}

#[tokio::test]
async fn create_post_rejects_invalid_forms() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let pub_date = Utc::now().to_rfc3339();

    let empty_title = json!({ "title": "", "text": "x", "pub_date": pub_date });
    let res = send(&app, Method::POST, "/posts", Some(&ann), Some(empty_title)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body["fields"]["title"].is_array());

    let long_title = json!({ "title": "x".repeat(257), "text": "x", "pub_date": pub_date });
    let res = send(&app, Method::POST, "/posts", Some(&ann), Some(long_title)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let missing_date = json!({ "title": "t", "text": "x" });
    let res = send(&app, Method::POST, "/posts", Some(&ann), Some(missing_date)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body["fields"]["body"].is_array());

    let unknown_category =
        json!({ "title": "t", "text": "x", "pub_date": pub_date, "category_id": 4242 });
    let res = send(&app, Method::POST, "/posts", Some(&ann), Some(unknown_category)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn non_owner_is_redirected_from_edit() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let bob = app.author("bob").await;
    let post = app.post(&ann, post_form("mine", 1)).await;
    let uri = format!("/posts/{}/edit", post.id);

    let res = get(&app, &uri, Some(&bob)).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), format!("/posts/{}", post.id));

    let own = get(&app, &uri, Some(&ann)).await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["is_edit"], true);
    assert_eq!(own.body["object"]["title"], "mine");
}

#[tokio::test]
async fn editing_someone_elses_hidden_post_is_404() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let bob = app.author("bob").await;
    let draft = app.post(&ann, draft_form("draft")).await;

    let res = get(&app, &format!("/posts/{}/edit", draft.id), Some(&bob)).await;

    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn ownership_is_checked_before_validation() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let bob = app.author("bob").await;
    let post = app.post(&ann, post_form("mine", 1)).await;
    let uri = format!("/posts/{}", post.id);
    let invalid = json!({ "title": "", "text": "", "pub_date": Utc::now().to_rfc3339() });

    let res = send(&app, Method::PUT, &uri, Some(&bob), Some(invalid.clone())).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);

    let res = send(&app, Method::PUT, &uri, Some(&ann), Some(invalid)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn ownership_is_checked_before_the_body_is_parsed() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let bob = app.author("bob").await;
    let post = app.post(&ann, post_form("mine", 1)).await;
    let uri = format!("/posts/{}", post.id);
    let incomplete = json!({ "title": "x" });

    let res = send(&app, Method::PUT, &uri, Some(&bob), Some(incomplete.clone())).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), uri);

    let res = send(&app, Method::PUT, &uri, Some(&ann), Some(incomplete)).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(res.body["fields"]["body"].is_array());
}

#[tokio::test]
async fn owner_can_unpublish_and_still_see_the_post() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let post = app.post(&ann, post_form("mine", 1)).await;
    let uri = format!("/posts/{}", post.id);
    let update = json!({
        "title": "mine, edited",
        "text": "new text",
        "pub_date": post.pub_date.to_rfc3339(),
        "is_published": false,
    });

    let res = send(&app, Method::PUT, &uri, Some(&ann), Some(update)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["title"], "mine, edited");

    assert_eq!(get(&app, &uri, None).await.status, StatusCode::NOT_FOUND);
    assert_eq!(get(&app, &uri, Some(&ann)).await.status, StatusCode::OK);
    assert!(titles(&get(&app, "/posts", None).await.body).is_empty());
}

#[tokio::test]
async fn deleting_a_post_removes_its_comments_and_redirects_to_profile() {
    let app = TestApp::new();
    let ann = app.author("ann").await;
    let bob = app.author("bob").await;
    let post = app.post(&ann, post_form("doomed", 1)).await;
    let comment = app.comment(&post, &bob, "nice").await;
    let uri = format!("/posts/{}", post.id);

    let res = send(&app, Method::DELETE, &uri, Some(&bob), None).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), uri);
    assert!(app.repo.get_post(post.id).await.unwrap().is_some());

    let res = send(&app, Method::DELETE, &uri, Some(&ann), None).await;
    assert_eq!(res.status, StatusCode::SEE_OTHER);
    assert_eq!(res.location(), "/profile/ann");
    assert!(app.repo.get_post(post.id).await.unwrap().is_none());
    assert!(app.repo.get_comment(comment.id).await.unwrap().is_none());
}
