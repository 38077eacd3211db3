//! End-to-end tests over an in-memory SQLite database: repository behavior,
//! filter semantics, transaction rollback, and resolver authorization.

use std::str::FromStr;

use assert_matches::assert_matches;
use async_graphql::Request;
use chrono::{Datelike, NaiveDate, Utc};
use pretty_assertions::assert_eq;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use castbook::db::schema::sync_all_schemas;
use castbook::db::{
    ActivationRepository, Database, PendingActivation, Performer, PerformerAlias,
    PerformerRepository, Studio, StudioRepository,
};
use castbook::error::ApiError;
use castbook::graphql::auth::{AuthUser, Role};
use castbook::graphql::build_schema;
use castbook::graphql::filters::{CriterionModifier, IntCriterion, PerformerFilter, QuerySpec};

async fn test_db() -> Database {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sync_all_schemas(&pool).await.unwrap();
    Database::from_pool(pool)
}

fn performer(name: &str, birthdate: Option<NaiveDate>) -> Performer {
    let now = Utc::now();
    Performer {
        id: 0,
        name: name.to_string(),
        disambiguation: None,
        gender: None,
        birthdate,
        ethnicity: None,
        country: None,
        height_cm: None,
        created_at: now,
        updated_at: now,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn create_then_find_returns_the_row() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let mut input = performer("Jane Doe", Some(date(1990, 6, 15)));
    input.country = Some("US".to_string());
    input.height_cm = Some(170);

    let created = repo.create(&mut conn, input).await.unwrap();
    assert!(created.id > 0);

    let found = repo.find(&mut conn, created.id).await.unwrap().unwrap();
    assert_eq!(found.name, "Jane Doe");
    assert_eq!(found.birthdate, Some(date(1990, 6, 15)));
    assert_eq!(found.country, Some("US".to_string()));
    assert_eq!(found.height_cm, Some(170));
}

#[tokio::test]
async fn update_persists_new_values() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let created = repo
        .create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();

    let mut changed = created.clone();
    changed.name = "Jane Smith".to_string();
    changed.ethnicity = Some("caucasian".to_string());
    let updated = repo.update(&mut conn, changed).await.unwrap();
    assert_eq!(updated.name, "Jane Smith");

    let found = repo.find(&mut conn, created.id).await.unwrap().unwrap();
    assert_eq!(found.name, "Jane Smith");
    assert_eq!(found.ethnicity, Some("caucasian".to_string()));
}

#[tokio::test]
async fn updating_a_missing_row_is_not_found() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let mut ghost = performer("Nobody", None);
    ghost.id = 9999;
    let err = repo.update(&mut conn, ghost).await.unwrap_err();
    assert_matches!(err, ApiError::NotFound { .. });
}

#[tokio::test]
async fn destroying_a_missing_row_is_not_found() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();

    let err = PerformerRepository::new()
        .destroy(&mut conn, 4242)
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::NotFound { .. });
}

#[tokio::test]
async fn replacing_joins_overwrites_the_full_set() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let created = repo
        .create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();

    let first: Vec<PerformerAlias> = ["JD", "Janie"]
        .iter()
        .map(|a| PerformerAlias {
            performer_id: created.id,
            alias: a.to_string(),
        })
        .collect();
    repo.update_aliases(&mut conn, created.id, &first)
        .await
        .unwrap();

    let second = vec![PerformerAlias {
        performer_id: created.id,
        alias: "Janie".to_string(),
    }];
    repo.update_aliases(&mut conn, created.id, &second)
        .await
        .unwrap();

    let aliases = repo.get_aliases(&mut conn, created.id).await.unwrap();
    assert_eq!(aliases, vec!["Janie".to_string()]);
}

#[tokio::test]
async fn replacing_joins_with_the_same_set_leaves_no_duplicates() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let created = repo
        .create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();

    let aliases = vec![PerformerAlias {
        performer_id: created.id,
        alias: "JD".to_string(),
    }];
    repo.update_aliases(&mut conn, created.id, &aliases)
        .await
        .unwrap();
    repo.update_aliases(&mut conn, created.id, &aliases)
        .await
        .unwrap();

    let stored = repo.get_aliases(&mut conn, created.id).await.unwrap();
    assert_eq!(stored, vec!["JD".to_string()]);
}

#[tokio::test]
async fn replacing_joins_with_empty_set_clears_them() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let created = repo
        .create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();

    // Clearing joins on a performer with none is a no-op, not an error.
    repo.update_aliases(&mut conn, created.id, &[]).await.unwrap();

    repo.create_aliases(
        &mut conn,
        &[PerformerAlias {
            performer_id: created.id,
            alias: "JD".to_string(),
        }],
    )
    .await
    .unwrap();
    repo.update_aliases(&mut conn, created.id, &[]).await.unwrap();

    let aliases = repo.get_aliases(&mut conn, created.id).await.unwrap();
    assert!(aliases.is_empty());
}

#[tokio::test]
async fn destroy_cascades_to_join_rows() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let created = repo
        .create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();
    repo.create_aliases(
        &mut conn,
        &[PerformerAlias {
            performer_id: created.id,
            alias: "JD".to_string(),
        }],
    )
    .await
    .unwrap();

    repo.destroy(&mut conn, created.id).await.unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM performer_aliases")
        .fetch_one(&mut *conn)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn failed_join_write_rolls_back_the_primary_row() {
    let db = test_db().await;
    let repo = PerformerRepository::new();

    let mut tx = db.begin().await.unwrap();
    let created = repo
        .create(&mut tx, performer("Jane Doe", None))
        .await
        .unwrap();

    // Bogus foreign key trips the constraint inside the transaction.
    let err = repo
        .create_aliases(
            &mut tx,
            &[PerformerAlias {
                performer_id: created.id + 1000,
                alias: "JD".to_string(),
            }],
        )
        .await
        .unwrap_err();
    assert_matches!(err, ApiError::Storage { .. });
    tx.rollback().await.unwrap();

    let mut conn = db.acquire().await.unwrap();
    let found = repo.find(&mut conn, created.id).await.unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn name_lookup_ignores_case() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    repo.create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();

    let found = repo.find_by_name(&mut conn, "JANE DOE").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].name, "Jane Doe");

    let found = repo.find_by_name(&mut conn, "jane doe").await.unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn alias_lookup_joins_the_alias_table() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let created = repo
        .create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();
    repo.create_aliases(
        &mut conn,
        &[PerformerAlias {
            performer_id: created.id,
            alias: "Janie".to_string(),
        }],
    )
    .await
    .unwrap();

    let found = repo.find_by_alias(&mut conn, "JANIE").await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, created.id);

    let found = repo.find_by_alias(&mut conn, "Nessie").await.unwrap();
    assert!(found.is_empty());
}

#[tokio::test]
async fn batch_lookups_match_any_of_the_given_names() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let jane = repo
        .create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();
    repo.create(&mut conn, performer("John Roe", None))
        .await
        .unwrap();
    repo.create_aliases(
        &mut conn,
        &[PerformerAlias {
            performer_id: jane.id,
            alias: "JD".to_string(),
        }],
    )
    .await
    .unwrap();

    let found = repo
        .find_by_names(&mut conn, &["Jane Doe".to_string(), "Nobody".to_string()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, jane.id);

    let found = repo
        .find_by_aliases(&mut conn, &["JD".to_string(), "XX".to_string()])
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, jane.id);

    // Empty input never reaches SQL.
    assert!(repo.find_by_names(&mut conn, &[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn age_filter_includes_the_birthday_boundary() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let today = Utc::now().date_naive();
    let turns_30_today = NaiveDate::from_ymd_opt(today.year() - 30, today.month(), today.day())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(today.year() - 30, 3, 1).unwrap());
    let still_29 = turns_30_today.succ_opt().unwrap();

    repo.create(&mut conn, performer("Boundary", Some(turns_30_today)))
        .await
        .unwrap();
    repo.create(&mut conn, performer("Younger", Some(still_29)))
        .await
        .unwrap();

    let filter = PerformerFilter {
        age: Some(IntCriterion {
            value: 30,
            modifier: CriterionModifier::Equals,
        }),
        ..Default::default()
    };
    let (results, count) = repo
        .query(&mut conn, &filter, &QuerySpec::default())
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Boundary");
}

#[tokio::test]
async fn birth_year_filter_is_exclusive_above_the_year() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    repo.create(&mut conn, performer("Edge", Some(date(1990, 12, 31))))
        .await
        .unwrap();
    repo.create(&mut conn, performer("After", Some(date(1991, 1, 1))))
        .await
        .unwrap();

    let filter = PerformerFilter {
        birth_year: Some(IntCriterion {
            value: 1990,
            modifier: CriterionModifier::GreaterThan,
        }),
        ..Default::default()
    };
    let (results, count) = repo
        .query(&mut conn, &filter, &QuerySpec::default())
        .await
        .unwrap();

    assert_eq!(count, 1);
    assert_eq!(results[0].name, "After");
}

#[tokio::test]
async fn query_paginates_and_counts_the_full_match_set() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    for name in ["Alice", "Bob", "Carol"] {
        repo.create(&mut conn, performer(name, None)).await.unwrap();
    }
    assert_eq!(repo.count(&mut conn).await.unwrap(), 3);

    let spec = QuerySpec {
        page: Some(1),
        per_page: Some(2),
        sort: Some("name".to_string()),
        ..Default::default()
    };
    let (results, count) = repo
        .query(&mut conn, &PerformerFilter::default(), &spec)
        .await
        .unwrap();

    assert_eq!(count, 3);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].name, "Alice");
    assert_eq!(results[1].name, "Bob");

    let spec = QuerySpec {
        page: Some(2),
        per_page: Some(2),
        sort: Some("name".to_string()),
        ..Default::default()
    };
    let (results, _) = repo
        .query(&mut conn, &PerformerFilter::default(), &spec)
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Carol");
}

#[tokio::test]
async fn name_filter_matches_substrings() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    repo.create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();
    repo.create(&mut conn, performer("John Roe", None))
        .await
        .unwrap();

    let filter = PerformerFilter {
        name: Some("doe".to_string()),
        ..Default::default()
    };
    let (results, count) = repo
        .query(&mut conn, &filter, &QuerySpec::default())
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(results[0].name, "Jane Doe");
}

#[tokio::test]
async fn name_filter_also_matches_aliases() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = PerformerRepository::new();

    let jane = repo
        .create(&mut conn, performer("Jane Doe", None))
        .await
        .unwrap();
    repo.create_aliases(
        &mut conn,
        &[PerformerAlias {
            performer_id: jane.id,
            alias: "Scarlett Blue".to_string(),
        }],
    )
    .await
    .unwrap();

    // Matches on both name and alias, but counts once.
    let smith = repo
        .create(&mut conn, performer("Scarlett Smith", None))
        .await
        .unwrap();
    repo.create_aliases(
        &mut conn,
        &[PerformerAlias {
            performer_id: smith.id,
            alias: "Scarlett S".to_string(),
        }],
    )
    .await
    .unwrap();

    repo.create(&mut conn, performer("John Roe", None))
        .await
        .unwrap();

    let filter = PerformerFilter {
        name: Some("scarlett".to_string()),
        ..Default::default()
    };
    let (results, count) = repo
        .query(&mut conn, &filter, &QuerySpec::default())
        .await
        .unwrap();
    assert_eq!(count, 2);
    let names: Vec<&str> = results.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Jane Doe", "Scarlett Smith"]);
}

#[tokio::test]
async fn studio_query_searches_names_and_counts() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = StudioRepository::new();
    let now = Utc::now();

    for name in ["Acme Films", "Acme Digital", "Other Pictures"] {
        repo.create(
            &mut conn,
            Studio {
                id: 0,
                name: name.to_string(),
                parent_studio_id: None,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();
    }
    assert_eq!(repo.count(&mut conn).await.unwrap(), 3);

    let filter = castbook::graphql::filters::StudioFilter {
        name: Some("acme".to_string()),
    };
    let (results, count) = repo
        .query(&mut conn, &filter, &QuerySpec::default())
        .await
        .unwrap();
    assert_eq!(count, 2);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|s| s.name.starts_with("Acme")));
}

#[tokio::test]
async fn studio_hierarchy_detaches_children_on_parent_delete() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = StudioRepository::new();
    let now = Utc::now();

    let parent = repo
        .create(
            &mut conn,
            Studio {
                id: 0,
                name: "Parent".to_string(),
                parent_studio_id: None,
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();
    let child = repo
        .create(
            &mut conn,
            Studio {
                id: 0,
                name: "Child".to_string(),
                parent_studio_id: Some(parent.id),
                created_at: now,
                updated_at: now,
            },
        )
        .await
        .unwrap();

    let children = repo.find_by_parent_id(&mut conn, parent.id).await.unwrap();
    assert_eq!(children.len(), 1);
    assert_eq!(children[0].id, child.id);

    repo.destroy(&mut conn, parent.id).await.unwrap();

    let orphan = repo.find(&mut conn, child.id).await.unwrap().unwrap();
    assert_eq!(orphan.parent_studio_id, None);
}

#[tokio::test]
async fn activation_lifecycle_by_email_and_key() {
    let db = test_db().await;
    let mut conn = db.acquire().await.unwrap();
    let repo = ActivationRepository::new();

    let created = repo
        .create(
            &mut conn,
            PendingActivation::new("new@user.test".to_string(), "invite-key-1".to_string()),
        )
        .await
        .unwrap();

    let by_email = repo
        .find_by_email(&mut conn, "new@user.test")
        .await
        .unwrap();
    assert_eq!(by_email.len(), 1);
    assert_eq!(by_email[0].id, created.id);

    let by_key = repo
        .find_by_key(&mut conn, "invite-key-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_key.id, created.id);

    repo.destroy(&mut conn, created.id).await.unwrap();
    assert!(
        repo.find_by_key(&mut conn, "invite-key-1")
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(repo.count(&mut conn).await.unwrap(), 0);
}

fn error_code(response: &async_graphql::Response) -> Option<String> {
    response.errors.first().and_then(|e| {
        e.extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .map(|v| format!("{v}").trim_matches('"').to_string())
    })
}

#[tokio::test]
async fn resolvers_reject_anonymous_requests() {
    let db = test_db().await;
    let schema = build_schema(db);

    let response = schema
        .execute(Request::new("{ findPerformer(id: \"1\") { id } }"))
        .await;
    assert_eq!(error_code(&response).as_deref(), Some("UNAUTHORIZED"));
}

#[tokio::test]
async fn read_only_users_cannot_mutate() {
    let db = test_db().await;
    let schema = build_schema(db);

    let request = Request::new(r#"mutation { performerCreate(input: { name: "Jane" }) { id } }"#)
        .data(AuthUser {
            name: "reader".to_string(),
            role: Role::Read,
        });
    let response = schema.execute(request).await;
    assert_eq!(error_code(&response).as_deref(), Some("UNAUTHORIZED"));
}

#[tokio::test]
async fn performer_create_mutation_round_trips_through_graphql() {
    let db = test_db().await;
    let schema = build_schema(db.clone());

    let request = Request::new(
        r#"mutation {
            performerCreate(input: {
                name: "Jane Doe",
                aliases: ["JD"],
                urls: [{ url: "https://example.test/jane", type: "HOME" }]
            }) { id name aliases urls { url type } }
        }"#,
    )
    .data(AuthUser {
        name: "editor".to_string(),
        role: Role::Modify,
    });
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let data = response.data.into_json().unwrap();
    let created = &data["performerCreate"];
    assert_eq!(created["name"], "Jane Doe");
    assert_eq!(created["aliases"][0], "JD");
    assert_eq!(created["urls"][0]["type"], "HOME");

    // The row is visible outside the request too.
    let mut conn = db.acquire().await.unwrap();
    let found = PerformerRepository::new()
        .find_by_name(&mut conn, "Jane Doe")
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
}

#[tokio::test]
async fn invite_flow_creates_and_rescinds_activations() {
    let db = test_db().await;
    let schema = build_schema(db.clone());
    let editor = AuthUser {
        name: "editor".to_string(),
        role: Role::Modify,
    };

    let request = Request::new(
        r#"mutation { inviteCreate(email: "new@user.test") { id inviteKey email } }"#,
    )
    .data(editor.clone());
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let data = response.data.into_json().unwrap();
    let key = data["inviteCreate"]["inviteKey"].as_str().unwrap().to_string();
    assert_eq!(data["inviteCreate"]["email"], "new@user.test");

    let request = Request::new(format!(
        r#"mutation {{ inviteRescind(key: "{key}") }}"#
    ))
    .data(editor.clone());
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    // Rescinding twice reports the missing activation.
    let request =
        Request::new(format!(r#"mutation {{ inviteRescind(key: "{key}") }}"#)).data(editor);
    let response = schema.execute(request).await;
    assert_eq!(error_code(&response).as_deref(), Some("NOT_FOUND"));
}

#[tokio::test]
async fn failed_rescind_leaves_other_invites_untouched() {
    let db = test_db().await;
    let schema = build_schema(db.clone());
    let editor = AuthUser {
        name: "editor".to_string(),
        role: Role::Modify,
    };

    let request =
        Request::new(r#"mutation { inviteCreate(email: "kept@user.test") { inviteKey } }"#)
            .data(editor.clone());
    let response = schema.execute(request).await;
    assert!(response.errors.is_empty(), "{:?}", response.errors);

    let request = Request::new(r#"mutation { inviteRescind(key: "no-such-key") }"#).data(editor);
    let response = schema.execute(request).await;
    assert_eq!(error_code(&response).as_deref(), Some("NOT_FOUND"));

    let mut conn = db.acquire().await.unwrap();
    let repo = ActivationRepository::new();
    assert_eq!(repo.count(&mut conn).await.unwrap(), 1);
    assert_eq!(
        repo.find_by_email(&mut conn, "kept@user.test")
            .await
            .unwrap()
            .len(),
        1
    );
}
