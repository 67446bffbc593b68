use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::like;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn comments_are_paged_newest_first() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let video_id = app.publish_video(&alice.token, "clip").await;
    for content in ["one", "two", "three"] {
        app.add_comment(&alice.token, &video_id, content).await;
    }

    let res = app
        .get_with_token(
            &format!("{}?page=1&limit=2", routes::comments(&video_id)),
            &alice.token,
        )
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["totalDocs"], 3);
    assert_eq!(res.data()["totalPages"], 2);
    let docs = res.data()["docs"].as_array().unwrap();
    assert_eq!(docs[0]["content"], "three");
    assert_eq!(docs[1]["content"], "two");
    assert_eq!(docs[0]["owner"]["username"], "alice");
    assert_eq!(docs[0]["likesCount"], 0);
}

#[tokio::test]
async fn comments_need_content_and_an_existing_video() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let video_id = app.publish_video(&alice.token, "clip").await;

    let res = app
        .post_with_token(&routes::comments(&video_id), &json!({"content": "  "}), &alice.token)
        .await;
    assert_eq!(res.status, 400);

    let unknown = uuid::Uuid::now_v7().to_string();
    let res = app
        .post_with_token(&routes::comments(&unknown), &json!({"content": "hi"}), &alice.token)
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn only_the_author_edits_or_deletes() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let video_id = app.publish_video(&alice.token, "clip").await;
    let comment_id = app.add_comment(&bob.token, &video_id, "hello").await;

    let res = app
        .patch_with_token(&routes::comment(&comment_id), &json!({"content": "hijacked"}), &alice.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch_with_token(&routes::comment(&comment_id), &json!({"content": "edited"}), &bob.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["content"], "edited");

    app.post_with_token(&routes::like_comment(&comment_id), &json!({}), &alice.token)
        .await;

    let res = app.delete_with_token(&routes::comment(&comment_id), &alice.token).await;
    assert_eq!(res.status, 403);
    let res = app.delete_with_token(&routes::comment(&comment_id), &bob.token).await;
    assert_eq!(res.status, 200, "{}", res.text);

    let res = app.get_with_token(&routes::comments(&video_id), &bob.token).await;
    assert_eq!(res.data()["totalDocs"], 0);

    let likes = like::Entity::find()
        .filter(like::Column::TargetId.eq(comment_id.as_str()))
        .count(&app.db)
        .await
        .unwrap();
    assert_eq!(likes, 0);
}
