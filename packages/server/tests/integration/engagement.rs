use serde_json::json;

use crate::common::{TestApp, routes};

mod wishlist {
    use super::*;

    #[tokio::test]
    async fn saving_is_idempotent_and_listed() {
        let app = TestApp::spawn().await;
        let (_, id) = app.approved_event(json!({})).await;
        let student = app.create_student("ana@uni.edu").await;

        for _ in 0..2 {
            let res = app
                .put_with_token(&routes::wishlist(id), &json!({}), &student)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.body["in_wishlist"], true);
        }

        let list = app.get_with_token(routes::MY_WISHLIST, &student).await;
        assert_eq!(list.body.as_array().unwrap().len(), 1);
        assert_eq!(list.body[0]["event"]["id"], id);

        let detail = app.get_with_token(&routes::event(id), &student).await;
        assert_eq!(detail.body["viewer"]["in_wishlist"], true);
    }

    #[tokio::test]
    async fn removing_is_idempotent() {
        let app = TestApp::spawn().await;
        let (_, id) = app.approved_event(json!({})).await;
        let student = app.create_student("ana@uni.edu").await;
        app.put_with_token(&routes::wishlist(id), &json!({}), &student)
            .await;

        for _ in 0..2 {
            let res = app
                .delete_with_token(&routes::wishlist(id), &student)
                .await;
            assert_eq!(res.status, 200);
            assert_eq!(res.body["in_wishlist"], false);
        }

        let list = app.get_with_token(routes::MY_WISHLIST, &student).await;
        assert!(list.body.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn pending_events_cannot_be_saved() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let id = app.create_event(&org, json!({})).await;
        let student = app.create_student("ana@uni.edu").await;

        let res = app
            .put_with_token(&routes::wishlist(id), &json!({}), &student)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod home {
    use super::*;

    #[tokio::test]
    async fn repeated_views_keep_one_entry_most_recent_first() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let admin = app.create_admin("admin@portal.io").await;
        let first = app.create_event(&org, json!({"title": "First"})).await;
        let second = app.create_event(&org, json!({"title": "Second"})).await;
        app.approve(&admin, first).await;
        app.approve(&admin, second).await;
        let student = app.create_student("ana@uni.edu").await;

        for id in [first, second, first] {
            app.post_with_token(&routes::event_view(id), &json!({}), &student)
                .await;
        }

        let res = app
            .get_with_token(routes::MY_RECENTLY_VIEWED, &student)
            .await;
        let titles: Vec<&str> = res
            .body
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["event"]["title"].as_str().unwrap())
            .collect();
        assert_eq!(titles, vec!["First", "Second"]);
    }

    #[tokio::test]
    async fn feed_sections_are_capped_and_rounds_are_upcoming_only() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let admin = app.create_admin("admin@portal.io").await;
        let student = app.create_student("ana@uni.edu").await;
        let now = chrono::Utc::now();

        let mut ids = Vec::new();
        for days in [12, 8, 20, 15] {
            let id = app
                .create_event(
                    &org,
                    json!({
                        "title": format!("In {days} days"),
                        "event_date": (now + chrono::Duration::days(days)).to_rfc3339(),
                    }),
                )
                .await;
            app.approve(&admin, id).await;
            ids.push(id);
        }
        for &id in &ids {
            app.put_with_token(&routes::wishlist(id), &json!({}), &student)
                .await;
            app.post_with_token(&routes::event_view(id), &json!({}), &student)
                .await;
            let res = app.register_team(&student, id, 1).await;
            assert_eq!(res.status, 201, "{}", res.text);
        }

        let res = app.get_with_token(routes::HOME, &student).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["recently_viewed"].as_array().unwrap().len(), 3);
        assert_eq!(res.body["wishlist"].as_array().unwrap().len(), 3);
        let rounds: Vec<&str> = res.body["upcoming_rounds"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["event"]["title"].as_str().unwrap())
            .collect();
        assert_eq!(rounds, vec!["In 8 days", "In 12 days", "In 15 days"]);

        let all = app.get_with_token(routes::MY_REGISTRATIONS, &student).await;
        assert_eq!(all.body.as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn feed_requires_a_session() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::HOME).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}
