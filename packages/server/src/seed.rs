use common::Role;
use sea_orm::sea_query::{Index, IndexCreateStatement, OnConflict, PostgresQueryBuilder};
use sea_orm::*;
use tracing::info;

use crate::config::BootstrapAdmin;
use crate::entity::{event, registration, role, submission, team_member, user, user_role};
use crate::utils::hash;

/// Seed the `role` table with every known role.
pub async fn seed_roles(db: &DatabaseConnection) -> Result<(), DbErr> {
    let mut inserted = 0u32;
    for role in Role::ALL {
        let model = role::ActiveModel {
            name: Set(role.as_str().to_string()),
        };

        let result = role::Entity::insert(model)
            .on_conflict(OnConflict::column(role::Column::Name).do_nothing().to_owned())
            .exec_without_returning(db)
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    if inserted > 0 {
        info!("Seeded {} new roles", inserted);
    }
    Ok(())
}

/// Ensure required database indexes exist.
///
/// Schema sync only knows single-column constraints, so the composite ones are
/// created here.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // One registration per (event, user); the registration workflow maps the
    // violation to a 409.
    let unique_registration = Index::create()
        .if_not_exists()
        .unique()
        .name("idx_registration_event_user")
        .table(registration::Entity)
        .col(registration::Column::EventId)
        .col(registration::Column::UserId)
        .to_owned();
    // A failed unique index means duplicate registrations are possible.
    create_index(db, "idx_registration_event_user", unique_registration).await?;

    let lookups = [
        (
            "idx_event_status_date",
            Index::create()
                .if_not_exists()
                .name("idx_event_status_date")
                .table(event::Entity)
                .col(event::Column::ApprovalStatus)
                .col(event::Column::EventDate)
                .to_owned(),
        ),
        (
            "idx_team_member_registration",
            Index::create()
                .if_not_exists()
                .name("idx_team_member_registration")
                .table(team_member::Entity)
                .col(team_member::Column::RegistrationId)
                .to_owned(),
        ),
        (
            "idx_submission_event",
            Index::create()
                .if_not_exists()
                .name("idx_submission_event")
                .table(submission::Entity)
                .col(submission::Column::EventId)
                .to_owned(),
        ),
    ];

    for (name, stmt) in lookups {
        if let Err(e) = create_index(db, name, stmt).await {
            tracing::warn!("Failed to create index {}: {}", name, e);
        }
    }

    Ok(())
}

async fn create_index(
    db: &DatabaseConnection,
    name: &str,
    stmt: IndexCreateStatement,
) -> Result<(), DbErr> {
    db.execute_unprepared(&stmt.to_string(PostgresQueryBuilder))
        .await?;
    info!("Ensured index {} exists", name);
    Ok(())
}

/// Create the configured admin account if no account with that email exists.
pub async fn ensure_bootstrap_admin(
    db: &DatabaseConnection,
    admin: &BootstrapAdmin,
) -> Result<(), anyhow::Error> {
    let email = admin.email.trim().to_lowercase();
    let existing = user::Entity::find()
        .filter(user::Column::Email.eq(&email))
        .one(db)
        .await?;
    if existing.is_some() {
        return Ok(());
    }

    let password = hash::hash_password(&admin.password)?;
    let now = chrono::Utc::now();

    let txn = db.begin().await?;
    let model = user::ActiveModel {
        email: Set(email.clone()),
        name: Set("Administrator".into()),
        password: Set(password),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    user_role::ActiveModel {
        user_id: Set(model.id),
        role: Set(Role::Admin.as_str().to_string()),
        assigned_at: Set(now),
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;

    info!(email = %email, "Created bootstrap admin account");
    Ok(())
}
