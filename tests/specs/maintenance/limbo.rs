//! Limbo transaction specs

use crate::prelude::*;

fn in_limbo(id: u64) -> LimboTransaction {
    let mut tx = LimboTransaction::new(id);
    tx.state = LimboState::Limbo;
    tx
}

#[tokio::test]
async fn empty_listing_is_not_an_error() {
    let mut server = Server::start().await;
    let listed = server.manager.list_limbo_transactions(DB).await.unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn committing_a_committed_transaction_renders_the_full_chain() {
    let mut server = Server::start().await;
    let err = server.manager.commit_transaction(DB, 1).await.unwrap_err();

    similar_asserts::assert_eq!(
        err.to_string(),
        format!(
            "failed to reconnect to a transaction in database {DB}\n\
             transaction is not in limbo\n\
             transaction 1 is committed\n"
        )
    );
    let codes: Vec<u32> = err.status().expect("service error").codes().collect();
    similar_asserts::assert_eq!(codes, vec![335_740_961, 335_544_335, 335_544_468]);
}

#[tokio::test]
async fn listing_spans_several_polls_and_keeps_metadata() {
    let fake = FakeService::new().with_database(DB);
    for id in 1..=4 {
        fake.add_limbo(DB, in_limbo(id));
    }
    let mut remote = in_limbo(u64::from(u32::MAX) + 7);
    remote.multi_database = true;
    remote.advise = Some(LimboAdvise::Rollback);
    remote.host_site = Some("coordinator".to_string());
    remote.remote_site = Some("branch".to_string());
    remote.db_path = Some("/db/branch.fdb".to_string());
    fake.add_limbo(DB, remote.clone());

    let mut server = Server::with(fake).await;
    let listed = server.manager.list_limbo_transactions(DB).await.unwrap();

    let ids: Vec<u64> = listed.iter().map(|t| t.id).collect();
    similar_asserts::assert_eq!(ids, vec![1, 2, 3, 4, u64::from(u32::MAX) + 7]);
    similar_asserts::assert_eq!(listed[4], remote);
    assert!(listed[..4].iter().all(|t| !t.multi_database && t.state == LimboState::Limbo));
}

#[tokio::test]
async fn resolving_removes_transactions_from_limbo() {
    let fake = FakeService::new().with_database(DB);
    fake.add_limbo(DB, in_limbo(11));
    fake.add_limbo(DB, in_limbo(12));
    let mut server = Server::with(fake).await;

    server.manager.commit_transaction(DB, 11).await.unwrap();
    server.manager.rollback_transaction(DB, 12).await.unwrap();
    assert!(server.manager.list_limbo_transactions(DB).await.unwrap().is_empty());
}
