use axum::routing::get;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .merge(profile_routes())
        .nest("/events", event_routes(config))
        .nest("/submissions", submission_routes())
        .nest("/me", me_routes())
        .nest("/admin", admin_routes())
        // Keys contain slashes, which the OpenAPI path syntax cannot express.
        .route("/files/{*key}", get(handlers::submission::download_file))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
        .routes(routes!(handlers::auth::check_access))
}

fn profile_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::profile::get_student_profile,
            handlers::profile::upsert_student_profile
        ))
        .routes(routes!(
            handlers::profile::get_organizer_profile,
            handlers::profile::upsert_organizer_profile
        ))
        .routes(routes!(handlers::event::list_organizer_events))
}

fn event_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let catalog = OpenApiRouter::new()
        .routes(routes!(
            handlers::event::list_events,
            handlers::event::create_event
        ))
        .routes(routes!(
            handlers::event::get_event,
            handlers::event::update_event
        ))
        .routes(routes!(handlers::event::record_view))
        .routes(routes!(
            handlers::engagement::add_to_wishlist,
            handlers::engagement::remove_from_wishlist
        ))
        .routes(routes!(
            handlers::registration::register_for_event,
            handlers::registration::get_my_registration,
            handlers::registration::cancel_registration
        ))
        .routes(routes!(handlers::evaluation::list_event_submissions))
        .routes(routes!(handlers::evaluation::publish_results));

    let uploads = OpenApiRouter::new()
        .routes(routes!(
            handlers::submission::get_my_submission,
            handlers::submission::upsert_submission
        ))
        .layer(handlers::submission::submission_body_limit(
            config.storage.max_upload_size,
        ));

    catalog.merge(uploads)
}

fn submission_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::evaluation::evaluate_submission))
}

fn me_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::engagement::list_wishlist))
        .routes(routes!(handlers::engagement::list_recently_viewed))
        .routes(routes!(handlers::engagement::list_my_registrations))
        .routes(routes!(handlers::engagement::home_feed))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::list_events))
        .routes(routes!(handlers::admin::get_event))
        .routes(routes!(handlers::admin::approve_event))
        .routes(routes!(handlers::admin::reject_event))
        .routes(routes!(handlers::admin::stats))
}
