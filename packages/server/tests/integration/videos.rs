use reqwest::Method;
use reqwest::multipart::Form;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use serde_json::json;

use server::entity::{comment, like, playlist_video, video, watch_history};

use crate::common::{TestApp, file_part, routes};

mod feed {
    use super::*;

    #[tokio::test]
    async fn unpublished_videos_never_appear() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let shown = app.publish_video(&alice.token, "shown").await;
        let hidden = app.publish_video(&alice.token, "hidden").await;

        let res = app
            .patch_with_token(&routes::toggle_publish(&hidden), &json!({}), &alice.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["isPublished"], false);

        let res = app.get_with_token(routes::VIDEOS, &alice.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["totalDocs"], 1);
        let docs = res.data()["docs"].as_array().unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["id"], shown.as_str());
        assert_eq!(docs[0]["ownerDetails"]["username"], "alice");
    }

    #[tokio::test]
    async fn search_sort_and_paging() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        for title in ["Rust basics", "Cooking pasta", "Advanced rust"] {
            app.publish_video(&alice.token, title).await;
        }

        let res = app
            .get_with_token(
                &format!("{}?query=RUST&sortBy=createdAt&sortType=asc", routes::VIDEOS),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        let titles: Vec<&str> = res.data()["docs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, ["Rust basics", "Advanced rust"]);

        let res = app
            .get_with_token(&format!("{}?page=2&limit=2", routes::VIDEOS), &alice.token)
            .await;
        assert_eq!(res.data()["totalDocs"], 3);
        assert_eq!(res.data()["totalPages"], 2);
        assert_eq!(res.data()["docs"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn invalid_sort_and_page_are_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        for query in ["sortBy=password", "sortType=up", "page=0", "limit=-1", "page=abc"] {
            let res = app
                .get_with_token(&format!("{}?{query}", routes::VIDEOS), &alice.token)
                .await;
            assert_eq!(res.status, 400, "{query}: {}", res.text);
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }
}

mod detail {
    use super::*;

    #[tokio::test]
    async fn each_view_increments_once_and_history_is_a_set() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let video_id = app.publish_video(&alice.token, "clip").await;

        let first = app.get_with_token(&routes::video(&video_id), &bob.token).await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.data()["views"], 0);
        let second = app.get_with_token(&routes::video(&video_id), &bob.token).await;
        assert_eq!(second.data()["views"], 1);

        let stored = video::Entity::find_by_id(video_id.clone())
            .one(&app.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.views, 2);

        let history = watch_history::Entity::find()
            .filter(watch_history::Column::UserId.eq(bob.id.as_str()))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(history, 1);

        let res = app.get_with_token(routes::HISTORY, &bob.token).await;
        let entries = res.data().as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["id"], video_id.as_str());
        assert_eq!(entries[0]["owner"]["username"], "alice");
    }

    #[tokio::test]
    async fn detail_reports_viewer_state() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let video_id = app.publish_video(&alice.token, "clip").await;

        app.post_with_token(&routes::like_video(&video_id), &json!({}), &bob.token)
            .await;
        app.post_with_token(
            &routes::channel_subscriptions(&alice.id),
            &json!({}),
            &bob.token,
        )
        .await;

        let res = app.get_with_token(&routes::video(&video_id), &bob.token).await;
        assert_eq!(res.data()["likesCount"], 1);
        assert_eq!(res.data()["isLikedByViewer"], true);
        assert_eq!(res.data()["owner"]["username"], "alice");
        assert_eq!(res.data()["owner"]["subscriberCount"], 1);
        assert_eq!(res.data()["owner"]["isSubscribedByViewer"], true);

        let res = app.get_with_token(&routes::video(&video_id), &alice.token).await;
        assert_eq!(res.data()["isLikedByViewer"], false);
        assert_eq!(res.data()["owner"]["isSubscribedByViewer"], false);
    }

    #[tokio::test]
    async fn missing_and_malformed_ids() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;

        let res = app
            .get_with_token(&routes::video(&uuid::Uuid::now_v7().to_string()), &alice.token)
            .await;
        assert_eq!(res.status, 404);

        let res = app.get_with_token(&routes::video("not-an-id"), &alice.token).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }
}

mod ownership {
    use super::*;

    #[tokio::test]
    async fn only_the_owner_may_update_or_delete() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let video_id = app.publish_video(&alice.token, "clip").await;

        let form = Form::new().text("title", "stolen");
        let res = app
            .multipart(Method::PATCH, &routes::video(&video_id), form, Some(&bob.token))
            .await;
        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");

        let res = app.delete_with_token(&routes::video(&video_id), &bob.token).await;
        assert_eq!(res.status, 403);

        let res = app
            .patch_with_token(&routes::toggle_publish(&video_id), &json!({}), &bob.token)
            .await;
        assert_eq!(res.status, 403);
    }

    #[tokio::test]
    async fn owner_can_replace_the_thumbnail() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let video_id = app.publish_video(&alice.token, "clip").await;

        let form = Form::new()
            .text("title", "Renamed")
            .part("thumbnail", file_part(b"new thumbnail", "new.jpg"));
        let res = app
            .multipart(Method::PATCH, &routes::video(&video_id), form, Some(&alice.token))
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["title"], "Renamed");
        assert_eq!(res.data()["description"], "About clip");

        let url = res.data()["thumbnail"].as_str().unwrap();
        let media = app
            .get_without_token(url.strip_prefix("http://127.0.0.1").unwrap())
            .await;
        assert_eq!(media.text, "new thumbnail");
    }
}

mod deletion {
    use super::*;

    #[tokio::test]
    async fn delete_cascades_to_every_dependent_row() {
        let app = TestApp::spawn().await;
        let alice = app.create_user("alice").await;
        let bob = app.create_user("bob").await;
        let video_id = app.publish_video(&alice.token, "doomed").await;
        let keeper = app.publish_video(&alice.token, "keeper").await;

        app.post_with_token(&routes::like_video(&video_id), &json!({}), &bob.token)
            .await;
        let comment_id = app.add_comment(&bob.token, &video_id, "nice").await;
        app.post_with_token(&routes::like_comment(&comment_id), &json!({}), &alice.token)
            .await;
        let playlist_id = app.create_playlist(&alice.token, "Favs").await;
        app.patch_with_token(
            &routes::playlist_add(&video_id, &playlist_id),
            &json!({}),
            &alice.token,
        )
        .await;
        app.get_with_token(&routes::video(&video_id), &bob.token).await;

        let res = app.delete_with_token(&routes::video(&video_id), &alice.token).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let likes = like::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(likes, 0);
        let comments = comment::Entity::find()
            .filter(comment::Column::VideoId.eq(video_id.as_str()))
            .count(&app.db)
            .await
            .unwrap();
        assert_eq!(comments, 0);
        let memberships = playlist_video::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(memberships, 0);
        let history = watch_history::Entity::find().count(&app.db).await.unwrap();
        assert_eq!(history, 0);

        let res = app.get_with_token(&routes::video(&video_id), &bob.token).await;
        assert_eq!(res.status, 404);

        // The surviving video uploaded identical thumbnail bytes.
        let res = app.get_with_token(&routes::video(&keeper), &bob.token).await;
        let url = res.data()["thumbnail"].as_str().unwrap();
        let media = app
            .get_without_token(url.strip_prefix("http://127.0.0.1").unwrap())
            .await;
        assert_eq!(media.status, 200);
    }
}
