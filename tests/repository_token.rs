use affiliate_tracker::domain::repositories::TokenRepository;
use affiliate_tracker::infrastructure::persistence::PgTokenRepository;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

async fn token_timestamp(pool: &PgPool, column: &str, id: i64) -> Option<DateTime<Utc>> {
    sqlx::query_scalar(&format!("SELECT {column} FROM api_tokens WHERE id = $1"))
        .bind(id)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_create_token(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let result = repo.create_token("test-token", "hash123").await;

    assert!(result.is_ok());
    let token = result.unwrap();
    assert_eq!(token.name, "test-token");
    assert_eq!(token.token_hash, "hash123");
    assert!(token.revoked_at.is_none());
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_create_token_duplicate_name(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    repo.create_token("dup", "hash-a").await.unwrap();
    let result = repo.create_token("dup", "hash-b").await;

    assert!(matches!(
        result,
        Err(affiliate_tracker::AppError::Conflict { .. })
    ));
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_validate_token_valid(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    repo.create_token("valid-token", "validhash").await.unwrap();

    let result = repo.validate_token("validhash").await;

    assert!(result.is_ok());
    assert!(result.unwrap());
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_validate_token_invalid(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let result = repo.validate_token("nonexistent").await;

    assert!(result.is_ok());
    assert!(!result.unwrap());
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_validate_token_revoked(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo
        .create_token("revoked-token", "revokedhash")
        .await
        .unwrap();
    repo.revoke_token(token.id).await.unwrap();

    let result = repo.validate_token("revokedhash").await;

    assert!(result.is_ok());
    assert!(!result.unwrap());
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_update_last_used(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool.clone()));

    let token = repo
        .create_token("update-token", "updatehash")
        .await
        .unwrap();

    let result = repo.update_last_used("updatehash").await;
    assert!(result.is_ok());

    let last_used = token_timestamp(&pool, "last_used_at", token.id).await;
    assert!(last_used.is_some());
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_list_tokens(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    repo.create_token("token1", "hash1").await.unwrap();
    repo.create_token("token2", "hash2").await.unwrap();
    repo.create_token("token3", "hash3").await.unwrap();

    let tokens = repo.list_tokens().await.unwrap();

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].name, "token1");
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_find_by_id_and_name(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let created = repo.create_token("find-me", "findhash").await.unwrap();

    let by_id = repo.find_by_id(created.id).await.unwrap();
    assert_eq!(by_id.unwrap().name, "find-me");

    let by_name = repo.find_by_name("find-me").await.unwrap();
    assert_eq!(by_name.unwrap().id, created.id);

    assert!(repo.find_by_name("missing").await.unwrap().is_none());
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_revoke_token(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool.clone()));

    let token = repo
        .create_token("revoke-test", "revokehash")
        .await
        .unwrap();

    let result = repo.revoke_token(token.id).await;
    assert!(result.is_ok());

    let revoked_at = token_timestamp(&pool, "revoked_at", token.id).await;
    assert!(revoked_at.is_some());
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_revoke_already_revoked(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let token = repo
        .create_token("double-revoke", "doublehash")
        .await
        .unwrap();

    repo.revoke_token(token.id).await.unwrap();
    let result = repo.revoke_token(token.id).await;

    assert!(result.is_ok());
}

#[sqlx::test]
#[ignore = "requires a running PostgreSQL (DATABASE_URL)"]
async fn test_revoke_missing_token(pool: PgPool) {
    let repo = PgTokenRepository::new(Arc::new(pool));

    let result = repo.revoke_token(9999).await;

    assert!(matches!(
        result,
        Err(affiliate_tracker::AppError::NotFound { .. })
    ));
}
