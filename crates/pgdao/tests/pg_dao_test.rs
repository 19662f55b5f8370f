//! Integration tests for PgDao.
//!
//! These tests run against a real Postgres database using testcontainers.

mod common;

use common::TestDatabase;
use pgdao::{
    CursorPageParams, Dao, DaoError, IsolationLevel, OffsetPageParams, PgDao, QueryContext, RowCount,
    Serialized, SortOrder,
};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use sqlx::FromRow;

#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow)]
struct Account {
    id: i64,
    name: String,
    balance: i64,
}

#[derive(Serialize)]
struct NewAccount<'a> {
    name: &'a str,
    balance: i64,
}

async fn seed(dao: &PgDao, accounts: &[(&str, i64)]) -> Vec<i64> {
    let mut ids = Vec::new();
    for &(name, balance) in accounts {
        let id = dao
            .new_query()
            .create(&Serialized(&NewAccount { name, balance }))
            .await
            .expect("Failed to create account");
        ids.push(id);
    }
    ids
}

#[tokio::test]
async fn test_create_and_get() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");

    let ids = seed(&dao, &[("alice", 100)]).await;

    let mut account = Account::default();
    let found = dao.new_query().filter_by_id(ids[0]).get(&mut account).await.unwrap();
    assert!(found);
    assert_eq!(account.name, "alice");
    assert_eq!(account.balance, 100);
}

#[tokio::test]
async fn test_get_no_rows_is_not_an_error() {
    let db = TestDatabase::new().await;
    let mut dao = db.pool().dao("accounts");

    let mut account = Account::default();
    let found = dao.filter_by_id(404).get(&mut account).await.unwrap();
    assert!(!found);
    assert_eq!(account, Account::default());
}

#[tokio::test]
async fn test_select_filters_and_orders() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");
    seed(&dao, &[("a", 5), ("b", 50), ("c", 500), ("d", 5000)]).await;

    let mut accounts: Vec<Account> = Vec::new();
    dao.new_query()
        .filter_greater("balance", 10i64)
        .filter_less("balance", 1000i64)
        .order_by_desc("balance")
        .select(&mut accounts)
        .await
        .unwrap();

    let names: Vec<_> = accounts.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["c", "b"]);

    let mut empty = vec![Account::default()];
    dao.new_query()
        .filter_by_column("name", "nobody")
        .select(&mut empty)
        .await
        .unwrap();
    assert!(empty.is_empty());
}

#[tokio::test]
async fn test_page_and_cursor() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");
    let ids = seed(&dao, &[("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]).await;

    let mut page: Vec<Account> = Vec::new();
    dao.new_query()
        .page(&OffsetPageParams::new(1, 2, SortOrder::Asc), "id")
        .select(&mut page)
        .await
        .unwrap();
    assert_eq!(page.iter().map(|a| a.id).collect::<Vec<_>>(), ids[2..4].to_vec());

    let mut newest: Vec<Account> = Vec::new();
    dao.new_query()
        .cursor(&CursorPageParams::new(0, 2, SortOrder::Desc), "id")
        .select(&mut newest)
        .await
        .unwrap();
    assert_eq!(newest.iter().map(|a| a.id).collect::<Vec<_>>(), vec![ids[4], ids[3]]);
}

#[tokio::test]
async fn test_count() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");
    seed(&dao, &[("a", 1), ("b", 20), ("c", 30)]).await;

    let mut total = RowCount::default();
    dao.count().filter_greater("balance", 10i64).get(&mut total).await.unwrap();
    assert_eq!(total.count, 2);
}

#[tokio::test]
async fn test_update_and_not_found() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");
    let ids = seed(&dao, &[("alice", 100)]).await;

    dao.new_query()
        .update_column("balance", 150i64)
        .update_where_id(ids[0])
        .update()
        .await
        .unwrap();

    let mut account = Account::default();
    dao.new_query().filter_by_id(ids[0]).get(&mut account).await.unwrap();
    assert_eq!(account.balance, 150);

    let err = dao
        .new_query()
        .update_column("balance", 1i64)
        .update_where_id(ids[0] + 1000)
        .update()
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_delete() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");
    let ids = seed(&dao, &[("alice", 1), ("bob", 2)]).await;

    dao.new_query().delete_where_id(ids[0]).delete().await.unwrap();
    dao.new_query().delete_where_val("name", "nobody").delete().await.unwrap();

    let mut rest: Vec<Account> = Vec::new();
    dao.new_query().select(&mut rest).await.unwrap();
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].name, "bob");
}

#[tokio::test]
async fn test_duplicate_create_is_conflict() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");
    seed(&dao, &[("alice", 1)]).await;

    let err = dao
        .new_query()
        .create(&Serialized(&NewAccount { name: "alice", balance: 2 }))
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::Conflict(_)));
}

#[tokio::test]
async fn test_transaction_commits() {
    let db = TestDatabase::new().await;
    let mut dao = db.pool().dao("accounts");

    let id = dao
        .transaction(|q| {
            Box::pin(async move {
                let id = q
                    .new_query()
                    .create(&Serialized(&NewAccount { name: "carol", balance: 10 }))
                    .await?;
                q.new_query().update_column("balance", 20i64).update_where_id(id).update().await?;
                Ok(id)
            })
        })
        .await
        .unwrap();

    let mut account = Account::default();
    assert!(dao.clone_session().filter_by_id(id).get(&mut account).await.unwrap());
    assert_eq!(account.balance, 20);
}

#[tokio::test]
async fn test_transaction_rolls_back_on_error() {
    let db = TestDatabase::new().await;
    let mut dao = db.pool().dao("accounts");

    let result: Result<(), DaoError> = dao
        .transaction_serializable(|q| {
            Box::pin(async move {
                q.new_query()
                    .create(&Serialized(&NewAccount { name: "dave", balance: 10 }))
                    .await?;
                Err(anyhow::anyhow!("abort").into())
            })
        })
        .await;
    assert!(result.is_err());
    assert!(!dao.db().in_transaction().await);

    let mut total = RowCount::default();
    dao.count().get(&mut total).await.unwrap();
    assert_eq!(total.count, 0);
}

#[tokio::test]
async fn test_nested_transaction_is_rejected() {
    let db = TestDatabase::new().await;
    let mut dao = db.pool().dao("accounts");

    let result = dao
        .transaction_with_level(IsolationLevel::RepeatableRead, |q| {
            Box::pin(async move {
                q.transaction(|_inner| Box::pin(async move { Ok(()) })).await
            })
        })
        .await;
    assert!(matches!(result, Err(DaoError::Transaction(_))));
}

#[tokio::test]
async fn test_exec_raw_sees_transaction() {
    let db = TestDatabase::new().await;
    let mut dao = db.pool().dao("accounts");

    let inside = dao
        .transaction(|q| {
            Box::pin(async move {
                q.new_query()
                    .create(&Serialized(&NewAccount { name: "erin", balance: 1 }))
                    .await?;
                q.exec_raw(|raw| {
                    Box::pin(async move {
                        let count = raw
                            .fetch_scalar::<i64, _>(
                                "SELECT count(*) FROM accounts",
                                sqlx::postgres::PgArguments::default(),
                            )
                            .await?;
                        Ok(count)
                    })
                })
                .await
            })
        })
        .await
        .unwrap();
    assert_eq!(inside, 1);
}

#[tokio::test]
async fn test_created_at_filters() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");
    seed(&dao, &[("frank", 1), ("grace", 2)]).await;

    let hour = chrono::Duration::hours(1);
    let now = Utc::now();

    let mut recent: Vec<Account> = Vec::new();
    dao.new_query().filter_only_after(now - hour).select(&mut recent).await.unwrap();
    assert_eq!(recent.len(), 2);

    let mut old: Vec<Account> = Vec::new();
    dao.new_query().filter_only_before(now - hour).select(&mut old).await.unwrap();
    assert!(old.is_empty());
}

#[tokio::test]
async fn test_context_timeout() {
    let db = TestDatabase::new().await;
    let mut dao = db.pool().dao("accounts");

    let ctx = QueryContext::with_timeout(Duration::from_millis(50));
    let err = dao
        .exec_raw_ctx(&ctx, |raw| {
            Box::pin(async move {
                raw.execute("SELECT pg_sleep(2)", sqlx::postgres::PgArguments::default())
                    .await?;
                Ok(())
            })
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DaoError::Timeout(_)));
}

#[tokio::test]
async fn test_pool_health_check() {
    let db = TestDatabase::new().await;
    let pool = db.pool();
    pool.health_check().await.unwrap();
}

#[derive(Serialize)]
struct BackdatedAccount<'a> {
    name: &'a str,
    balance: i64,
    created_at: DateTime<Utc>,
}

#[tokio::test]
async fn test_create_with_timestamptz_cast() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");

    let created_at = Utc.with_ymd_and_hms(2020, 5, 1, 8, 30, 0).unwrap();
    let record = BackdatedAccount {
        name: "heidi",
        balance: 3,
        created_at,
    };
    let id = dao
        .new_query()
        .create(&Serialized(&record).cast("created_at", "timestamptz"))
        .await
        .unwrap();

    let mut old: Vec<Account> = Vec::new();
    dao.new_query()
        .filter_only_before(Utc.with_ymd_and_hms(2021, 1, 1, 0, 0, 0).unwrap())
        .select(&mut old)
        .await
        .unwrap();
    assert_eq!(old.len(), 1);
    assert_eq!(old[0].id, id);
}

#[tokio::test]
async fn test_cancelled_transaction_is_discarded() {
    let db = TestDatabase::new().await;
    let mut dao = db.pool().dao("accounts");

    let cancelled = tokio::time::timeout(
        Duration::from_millis(200),
        dao.transaction(|q| {
            Box::pin(async move {
                q.new_query()
                    .create(&Serialized(&NewAccount { name: "ivan", balance: 1 }))
                    .await?;
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
        }),
    )
    .await;
    assert!(cancelled.is_err());
    assert!(!dao.db().in_transaction().await);

    dao.transaction(|q| {
        Box::pin(async move {
            q.new_query()
                .create(&Serialized(&NewAccount { name: "judy", balance: 1 }))
                .await?;
            Ok(())
        })
    })
    .await
    .unwrap();

    let mut total = RowCount::default();
    dao.count().filter_by_column("name", "ivan").get(&mut total).await.unwrap();
    assert_eq!(total.count, 0);
    let mut total = RowCount::default();
    dao.count().filter_by_column("name", "judy").get(&mut total).await.unwrap();
    assert_eq!(total.count, 1);
}

#[tokio::test]
async fn test_sibling_queries_run_concurrently() {
    let db = TestDatabase::new().await;
    let dao = db.pool().dao("accounts");
    let first = dao.new_query();
    let second = dao.new_query();

    let sleep = |handle: &PgDao| {
        let raw = handle.db().clone();
        async move {
            raw.execute("SELECT pg_sleep(1)", sqlx::postgres::PgArguments::default())
                .await
        }
    };

    let started = Instant::now();
    let (a, b) = tokio::join!(sleep(&first), sleep(&second));
    a.unwrap();
    b.unwrap();
    assert!(started.elapsed() < Duration::from_millis(1800), "{:?}", started.elapsed());
}
