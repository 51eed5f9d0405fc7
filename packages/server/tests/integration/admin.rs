use serde_json::json;

use crate::common::{TestApp, routes};

mod review {
    use super::*;

    #[tokio::test]
    async fn approval_publishes_the_event() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let admin = app.create_admin("admin@portal.io").await;
        let id = app.create_event(&org, json!({})).await;

        let res = app
            .post_with_token(&routes::approve(id), &json!({}), &admin)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["approval_status"], "approved");
        let public = app.get_without_token(&routes::event(id)).await;
        assert_eq!(public.status, 200);
    }

    #[tokio::test]
    async fn rejection_requires_and_stores_a_reason() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let admin = app.create_admin("admin@portal.io").await;
        let id = app.create_event(&org, json!({})).await;

        let blank = app
            .post_with_token(&routes::reject(id), &json!({"reason": "   "}), &admin)
            .await;
        assert_eq!(blank.status, 400);
        assert_eq!(blank.body["message"], "Please provide a reason for rejection");

        let res = app
            .post_with_token(
                &routes::reject(id),
                &json!({"reason": " Missing venue details "}),
                &admin,
            )
            .await;
        assert_eq!(res.status, 200);
        assert_eq!(res.body["approval_status"], "rejected");
        assert_eq!(res.body["rejection_reason"], "Missing venue details");

        let own = app.get_with_token(&routes::event(id), &org).await;
        assert_eq!(own.body["rejection_reason"], "Missing venue details");
        let public = app.get_without_token(&routes::event(id)).await;
        assert_eq!(public.status, 404);
    }

    #[tokio::test]
    async fn reviewed_events_cannot_be_reviewed_again() {
        let app = TestApp::spawn().await;
        let (_, id) = app.approved_event(json!({})).await;
        let admin = app.login("admin@portal.io").await;

        let again = app
            .post_with_token(&routes::approve(id), &json!({}), &admin)
            .await;
        let reject = app
            .post_with_token(&routes::reject(id), &json!({"reason": "late"}), &admin)
            .await;

        for res in [again, reject] {
            assert_eq!(res.status, 409);
            assert_eq!(res.body["message"], "Event has already been reviewed");
        }
    }

    #[tokio::test]
    async fn organizers_cannot_approve_their_own_events() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let id = app.create_event(&org, json!({})).await;

        let res = app
            .post_with_token(&routes::approve(id), &json!({}), &org)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["message"], "This page is only accessible to admins");
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("admin@portal.io").await;

        let res = app
            .post_with_token(&routes::approve(9999), &json!({}), &admin)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod dashboard {
    use super::*;

    #[tokio::test]
    async fn lists_every_event_with_status_filter() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let admin = app.create_admin("admin@portal.io").await;
        let approved = app.create_event(&org, json!({"title": "Approved"})).await;
        app.create_event(&org, json!({"title": "Waiting"})).await;
        app.approve(&admin, approved).await;

        let all = app.get_with_token(routes::ADMIN_EVENTS, &admin).await;
        assert_eq!(all.status, 200);
        assert_eq!(all.body.as_array().unwrap().len(), 2);
        assert_eq!(all.body[0]["title"], "Waiting");

        let pending = app
            .get_with_token(&format!("{}?status=pending", routes::ADMIN_EVENTS), &admin)
            .await;
        assert_eq!(pending.body.as_array().unwrap().len(), 1);
        assert_eq!(pending.body[0]["title"], "Waiting");

        let detail = app
            .get_with_token(&routes::admin_event(approved), &admin)
            .await;
        assert_eq!(detail.body["title"], "Approved");
    }

    #[tokio::test]
    async fn stats_count_platform_activity() {
        let app = TestApp::spawn().await;
        let (org, id) = app.approved_event(json!({})).await;
        app.create_event(&org, json!({"title": "Second"})).await;
        let student = app.create_student("ana@uni.edu").await;
        app.register_team(&student, id, 1).await;
        let admin = app.login("admin@portal.io").await;

        let res = app.get_with_token(routes::ADMIN_STATS, &admin).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total_events"], 2);
        assert_eq!(res.body["pending_approvals"], 1);
        assert_eq!(res.body["total_users"], 3);
        assert_eq!(res.body["total_registrations"], 1);
    }
}
