use serde_json::json;

use crate::common::{TestApp, event_body, routes};

mod creation {
    use super::*;

    #[tokio::test]
    async fn organizer_creates_a_pending_event_with_defaults() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;

        let res = app
            .post_with_token(routes::EVENTS, &event_body(json!({})), &org)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["approval_status"], "pending");
        assert_eq!(res.body["event_type"], "Hackathon");
        assert_eq!(res.body["eligibility"], "Everyone can apply");
        assert_eq!(res.body["registered_count"], 0);
        assert_eq!(res.body["tags"], json!(["ai", "web"]));
    }

    #[tokio::test]
    async fn deadline_after_event_date_is_rejected() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let now = chrono::Utc::now();

        let res = app
            .post_with_token(
                routes::EVENTS,
                &event_body(json!({
                    "event_date": (now + chrono::Duration::days(2)).to_rfc3339(),
                    "registration_deadline": (now + chrono::Duration::days(3)).to_rfc3339(),
                })),
                &org,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["message"],
            "Registration deadline must be on or before the event date"
        );
    }

    #[tokio::test]
    async fn team_size_bounds_must_be_ordered() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;

        let res = app
            .post_with_token(
                routes::EVENTS,
                &event_body(json!({"team_size_min": 3, "team_size_max": 2})),
                &org,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(
            res.body["message"],
            "Maximum team size cannot be less than minimum team size"
        );
    }

    #[tokio::test]
    async fn students_cannot_create_events() {
        let app = TestApp::spawn().await;
        let student = app.create_student("ana@uni.edu").await;

        let res = app
            .post_with_token(routes::EVENTS, &event_body(json!({})), &student)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "ACCESS_DENIED");
        assert_eq!(
            res.body["message"],
            "This page is only accessible to organizers"
        );
    }

    #[tokio::test]
    async fn organizer_profile_is_required() {
        let app = TestApp::spawn().await;
        app.register("Org Owner", "org@club.org", "organizer").await;
        let org = app.login("org@club.org").await;

        let res = app
            .post_with_token(routes::EVENTS, &event_body(json!({})), &org)
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Organizer profile not found");
    }
}

mod editing {
    use super::*;

    #[tokio::test]
    async fn pending_event_can_be_edited_by_owner() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let id = app.create_event(&org, json!({})).await;

        let res = app
            .patch_with_token(
                &routes::event(id),
                &json!({"title": "Campus Hack II", "prize_money": 5000}),
                &org,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Campus Hack II");
        assert_eq!(res.body["prize_money"], 5000);
        assert_eq!(res.body["location"], "Main Auditorium");
    }

    #[tokio::test]
    async fn partial_update_is_checked_against_stored_values() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let id = app.create_event(&org, json!({"team_size_min": 2})).await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({"team_size_max": 1}), &org)
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn reviewed_event_is_frozen() {
        let app = TestApp::spawn().await;
        let (org, id) = app.approved_event(json!({})).await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({"title": "Renamed"}), &org)
            .await;

        assert_eq!(res.status, 409);
        assert_eq!(res.body["message"], "Only events pending review can be edited");
    }

    #[tokio::test]
    async fn other_organizers_see_not_found() {
        let app = TestApp::spawn().await;
        let owner = app.create_organizer("owner@club.org").await;
        let other = app.create_organizer("other@club.org").await;
        let id = app.create_event(&owner, json!({})).await;

        let res = app
            .patch_with_token(&routes::event(id), &json!({"title": "Mine now"}), &other)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn pending_events_are_hidden_from_the_public() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let id = app.create_event(&org, json!({})).await;

        let list = app.get_without_token(routes::EVENTS).await;
        assert_eq!(list.body["pagination"]["total"], 0);

        let detail = app.get_without_token(&routes::event(id)).await;
        assert_eq!(detail.status, 404);

        let own = app.get_with_token(&routes::event(id), &org).await;
        assert_eq!(own.status, 200);
        assert_eq!(own.body["approval_status"], "pending");
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_filters_compose() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let admin = app.create_admin("admin@portal.io").await;
        for (title, tags, kind) in [
            ("AI Sprint", json!(["ai"]), "Hackathon"),
            ("Web Weekend", json!(["web"]), "Hackathon"),
            ("Quiz Night", json!(["ai"]), "Quiz"),
        ] {
            let id = app
                .create_event(&org, json!({"title": title, "tags": tags, "event_type": kind}))
                .await;
            app.approve(&admin, id).await;
        }

        let res = app
            .get_without_token(&format!("{}?search=SPRINT", routes::EVENTS))
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "AI Sprint");

        let res = app
            .get_without_token(&format!("{}?tag=ai&event_type=Quiz", routes::EVENTS))
            .await;
        assert_eq!(res.body["pagination"]["total"], 1);
        assert_eq!(res.body["data"][0]["title"], "Quiz Night");

        let res = app
            .get_without_token(&format!(
                "{}?sort_by=title&sort_order=desc&per_page=2",
                routes::EVENTS
            ))
            .await;
        assert_eq!(res.body["pagination"]["total"], 3);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
        assert_eq!(res.body["data"][0]["title"], "Web Weekend");
    }

    #[tokio::test]
    async fn unknown_sort_field_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .get_without_token(&format!("{}?sort_by=password", routes::EVENTS))
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn detail_carries_flags_and_viewer_state() {
        let app = TestApp::spawn().await;
        let (_, id) = app.approved_event(json!({"team_size_max": 1})).await;
        let student = app.create_student("ana@uni.edu").await;

        let anonymous = app.get_without_token(&routes::event(id)).await;
        assert_eq!(anonymous.status, 200);
        assert_eq!(anonymous.body["flags"]["is_individual"], true);
        assert_eq!(anonymous.body["flags"]["registration_open"], true);
        assert!(anonymous.body.get("viewer").is_none());

        let res = app.get_with_token(&routes::event(id), &student).await;
        assert_eq!(res.body["viewer"]["is_registered"], false);
        assert_eq!(res.body["viewer"]["in_wishlist"], false);
    }

    #[tokio::test]
    async fn invalid_token_browses_anonymously() {
        let app = TestApp::spawn().await;
        let (_, id) = app.approved_event(json!({})).await;

        let res = app.get_with_token(&routes::event(id), "stale-token").await;

        assert_eq!(res.status, 200);
        assert!(res.body.get("viewer").is_none());
    }

    #[tokio::test]
    async fn views_count_impressions_and_track_recent() {
        let app = TestApp::spawn().await;
        let (_, id) = app.approved_event(json!({})).await;
        let student = app.create_student("ana@uni.edu").await;

        let res = app
            .post_with_token(&routes::event_view(id), &json!({}), &student)
            .await;
        assert_eq!(res.status, 204);
        let res = app
            .post_without_token(&routes::event_view(id), &json!({}))
            .await;
        assert_eq!(res.status, 204);

        let detail = app.get_without_token(&routes::event(id)).await;
        assert_eq!(detail.body["impressions"], 2);

        let recent = app
            .get_with_token(routes::MY_RECENTLY_VIEWED, &student)
            .await;
        assert_eq!(recent.body.as_array().unwrap().len(), 1);
        assert_eq!(recent.body[0]["event"]["id"], id);
    }
}

mod organizer_dashboard {
    use super::*;

    #[tokio::test]
    async fn own_events_are_split_by_date() {
        let app = TestApp::spawn().await;
        let org = app.create_organizer("org@club.org").await;
        let now = chrono::Utc::now();
        app.create_event(&org, json!({"title": "Ahead"})).await;
        app.create_event(
            &org,
            json!({
                "title": "Done",
                "event_date": (now - chrono::Duration::days(3)).to_rfc3339(),
                "registration_deadline": (now - chrono::Duration::days(5)).to_rfc3339(),
            }),
        )
        .await;

        let res = app.get_with_token(routes::ORGANIZER_EVENTS, &org).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["upcoming"][0]["title"], "Ahead");
        assert_eq!(res.body["past"][0]["title"], "Done");
    }
}
