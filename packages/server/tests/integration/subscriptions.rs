use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn toggle_subscribes_then_unsubscribes() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let path = routes::channel_subscriptions(&alice.id);

    let res = app.post_with_token(&path, &json!({}), &bob.token).await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["subscribed"], true);

    let res = app.post_with_token(&path, &json!({}), &bob.token).await;
    assert_eq!(res.data()["subscribed"], false);

    let res = app.get_with_token(&path, &alice.token).await;
    assert_eq!(res.data().as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn cannot_subscribe_to_yourself_or_a_missing_channel() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;

    let res = app
        .post_with_token(&routes::channel_subscriptions(&alice.id), &json!({}), &alice.token)
        .await;
    assert_eq!(res.status, 400);

    let unknown = uuid::Uuid::now_v7().to_string();
    let res = app
        .post_with_token(&routes::channel_subscriptions(&unknown), &json!({}), &alice.token)
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn subscriber_list_is_private_to_the_channel() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;

    let res = app
        .get_with_token(&routes::channel_subscriptions(&alice.id), &bob.token)
        .await;
    assert_eq!(res.status, 403);
    assert_eq!(res.body["code"], "PERMISSION_DENIED");

    let unknown = uuid::Uuid::now_v7().to_string();
    let res = app
        .get_with_token(&routes::channel_subscriptions(&unknown), &bob.token)
        .await;
    assert_eq!(res.status, 404);
}

#[tokio::test]
async fn subscriber_list_reports_follow_back() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    let carol = app.create_user("carol").await;

    for fan in [&bob, &carol] {
        app.post_with_token(&routes::channel_subscriptions(&alice.id), &json!({}), &fan.token)
            .await;
    }
    // Alice follows Bob back.
    app.post_with_token(&routes::channel_subscriptions(&bob.id), &json!({}), &alice.token)
        .await;

    let res = app
        .get_with_token(&routes::channel_subscriptions(&alice.id), &alice.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let subscribers = res.data().as_array().unwrap();
    assert_eq!(subscribers.len(), 2);

    let entry = |username: &str| {
        subscribers
            .iter()
            .find(|s| s["subscriber"]["username"] == username)
            .unwrap()
    };
    assert_eq!(entry("bob")["subscriber"]["subscribedToSubscriber"], true);
    assert_eq!(entry("bob")["subscriber"]["subscriberCount"], 1);
    assert_eq!(entry("carol")["subscriber"]["subscribedToSubscriber"], false);
    assert_eq!(entry("carol")["subscriber"]["subscriberCount"], 0);
}

#[tokio::test]
async fn subscribed_channels_carry_their_latest_video() {
    let app = TestApp::spawn().await;
    let alice = app.create_user("alice").await;
    let bob = app.create_user("bob").await;
    app.publish_video(&alice.token, "old").await;
    let latest = app.publish_video(&alice.token, "new").await;

    app.post_with_token(&routes::channel_subscriptions(&alice.id), &json!({}), &bob.token)
        .await;

    let res = app
        .get_with_token(&routes::subscribed_channels(&bob.id), &bob.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    let channels = res.data().as_array().unwrap();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0]["subscribedChannel"]["username"], "alice");
    assert_eq!(
        channels[0]["subscribedChannel"]["latestVideo"]["id"],
        latest.as_str()
    );

    let res = app
        .patch_with_token(&routes::toggle_publish(&latest), &json!({}), &alice.token)
        .await;
    assert_eq!(res.data()["isPublished"], false);
    let res = app
        .get_with_token(&routes::subscribed_channels(&bob.id), &bob.token)
        .await;
    assert_eq!(
        res.data()[0]["subscribedChannel"]["latestVideo"]["id"],
        latest.as_str()
    );
}
