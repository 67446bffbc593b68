use serde_json::json;

use crate::common::{TestApp, routes};

fn video_ids(detail: &serde_json::Value) -> Vec<String> {
    detail["videos"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v["id"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn add_is_idempotent_and_remove_is_exact() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let v1 = app.publish_video(&alice.token, "v1").await;
    let playlist_id = app.create_playlist(&alice.token, "Favs").await;

    for _ in 0..2 {
        let res = app
            .patch_with_token(&routes::playlist_add(&v1, &playlist_id), &json!({}), &alice.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(video_ids(res.data()), [v1.clone()]);
        assert_eq!(res.data()["videoCount"], 1);
    }

    let res = app
        .patch_with_token(&routes::playlist_remove(&v1, &playlist_id), &json!({}), &alice.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert!(video_ids(res.data()).is_empty());

    let res = app.get_with_token(&routes::playlist(&playlist_id), &alice.token).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["name"], "Favs");
    assert_eq!(res.data()["videoCount"], 0);
    assert_eq!(res.data()["owner"]["username"], "alice");
}

#[tokio::test]
async fn owner_listing_sums_views_of_existing_videos() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let v1 = app.publish_video(&alice.token, "v1").await;
    let v2 = app.publish_video(&alice.token, "v2").await;
    let playlist_id = app.create_playlist(&alice.token, "Mix").await;
    for id in [&v1, &v2] {
        app.patch_with_token(&routes::playlist_add(id, &playlist_id), &json!({}), &alice.token)
            .await;
    }
    for _ in 0..3 {
        app.get_with_token(&routes::video(&v1), &alice.token).await;
    }
    app.get_with_token(&routes::video(&v2), &alice.token).await;

    let res = app.get_with_token(&routes::user_playlists(&alice.id), &alice.token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    let playlists = res.data().as_array().unwrap();
    assert_eq!(playlists.len(), 1);
    assert_eq!(playlists[0]["videoCount"], 2);
    assert_eq!(playlists[0]["totalViews"], 4);

    app.delete_with_token(&routes::video(&v2), &alice.token).await;

    let res = app.get_with_token(&routes::user_playlists(&alice.id), &alice.token).await;
    let playlists = res.data().as_array().unwrap();
    assert_eq!(playlists[0]["videoCount"], 1);
    assert_eq!(playlists[0]["totalViews"], 3);
}

#[tokio::test]
async fn detail_hides_unpublished_videos() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let shown = app.publish_video(&alice.token, "shown").await;
    let hidden = app.publish_video(&alice.token, "hidden").await;
    let playlist_id = app.create_playlist(&alice.token, "Mix").await;
    for id in [&shown, &hidden] {
        app.patch_with_token(&routes::playlist_add(id, &playlist_id), &json!({}), &alice.token)
            .await;
    }
    app.patch_with_token(&routes::toggle_publish(&hidden), &json!({}), &alice.token)
        .await;

    let res = app.get_with_token(&routes::playlist(&playlist_id), &alice.token).await;
    assert_eq!(video_ids(res.data()), [shown]);
}

#[tokio::test]
async fn ownership_and_validation() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let alices_video = app.publish_video(&alice.token, "alice clip").await;
    let bobs_video = app.publish_video(&bob.token, "bob clip").await;
    let playlist_id = app.create_playlist(&alice.token, "Favs").await;

    let res = app
        .post_with_token(routes::PLAYLISTS, &json!({"description": "no name"}), &alice.token)
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .patch_with_token(&routes::playlist_add(&alices_video, &playlist_id), &json!({}), &bob.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch_with_token(&routes::playlist_add(&bobs_video, &playlist_id), &json!({}), &alice.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch_with_token(&routes::playlist(&playlist_id), &json!({}), &alice.token)
        .await;
    assert_eq!(res.status, 400);

    let res = app
        .patch_with_token(&routes::playlist(&playlist_id), &json!({"name": "Best"}), &bob.token)
        .await;
    assert_eq!(res.status, 403);

    let res = app
        .patch_with_token(&routes::playlist(&playlist_id), &json!({"name": "Best"}), &alice.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["name"], "Best");
    assert_eq!(res.data()["description"], "test playlist");

    let res = app.delete_with_token(&routes::playlist(&playlist_id), &bob.token).await;
    assert_eq!(res.status, 403);
    let res = app.delete_with_token(&routes::playlist(&playlist_id), &alice.token).await;
    assert_eq!(res.status, 200);

    let res = app.get_with_token(&routes::playlist(&playlist_id), &alice.token).await;
    assert_eq!(res.status, 404);
    let res = app.get_with_token(&routes::video(&alices_video), &alice.token).await;
    assert_eq!(res.status, 200);
}
