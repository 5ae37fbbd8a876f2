//! End-to-end flow: writes through the SQLite data source propagate to
//! dashboard snapshots via the sync watchers.

use std::time::Duration;

use time::macros::date;
use tokio::sync::watch;

use spendview::{
    CollectionState, Dashboard, NewTransaction, SqliteDataSource, SyncStatus, TransactionFilter,
};

const ANCHOR: time::Date = date!(2024 - 02 - 15);

fn groceries() -> NewTransaction {
    NewTransaction {
        description: "Groceries".to_owned(),
        amount: 100.0,
        date: date!(2024 - 01 - 10),
        category_id: Some("food".to_owned()),
        custom_label: None,
    }
}

async fn wait_for<T, F>(receiver: &mut watch::Receiver<CollectionState<T>>, predicate: F)
where
    T: Clone,
    F: Fn(&CollectionState<T>) -> bool,
{
    tokio::time::timeout(Duration::from_secs(5), receiver.wait_for(predicate))
        .await
        .expect("timed out waiting for collection state")
        .expect("watcher task stopped unexpectedly");
}

#[tokio::test]
async fn inserted_expense_reaches_the_snapshot() {
    let source = SqliteDataSource::open_in_memory().unwrap();
    let mut dashboard = Dashboard::start(&source);

    let mut expenses = dashboard.coordinator().expenses();
    let mut categories = dashboard.coordinator().categories();
    wait_for(&mut expenses, |state| state.status == SyncStatus::Idle).await;
    wait_for(&mut categories, |state| state.status == SyncStatus::Idle).await;

    source.insert_expense(groceries()).unwrap();
    wait_for(&mut expenses, |state| state.rows.len() == 1).await;

    let snapshot = dashboard.snapshot(&TransactionFilter::default(), ANCHOR);

    assert_eq!(snapshot.total, 100.0);
    assert_eq!(snapshot.top_category.unwrap().name, "Food & Dining");
    assert_eq!(snapshot.monthly.len(), 6);
    assert!(!snapshot.loading);
    assert_eq!(snapshot.error, None);

    dashboard.shutdown();
}

#[tokio::test]
async fn custom_labelled_expense_resolves_through_the_snapshot() {
    let source = SqliteDataSource::open_in_memory().unwrap();
    let mut dashboard = Dashboard::start(&source);

    let mut expenses = dashboard.coordinator().expenses();
    let mut categories = dashboard.coordinator().categories();
    wait_for(&mut categories, |state| state.status == SyncStatus::Idle).await;

    source
        .insert_expense(NewTransaction {
            description: "Present".to_owned(),
            amount: 75.0,
            date: date!(2024 - 02 - 11),
            category_id: Some("other".to_owned()),
            custom_label: Some("Gifts".to_owned()),
        })
        .unwrap();
    wait_for(&mut expenses, |state| state.rows.len() == 1).await;

    let snapshot = dashboard.snapshot(&TransactionFilter::default(), ANCHOR);

    let top = snapshot.top_category.unwrap();
    assert_eq!(top.name, "Gifts");
    assert!(top.is_custom);

    dashboard.shutdown();
}

#[tokio::test]
async fn deleting_the_only_expense_empties_the_snapshot() {
    let source = SqliteDataSource::open_in_memory().unwrap();
    let mut dashboard = Dashboard::start(&source);

    let mut expenses = dashboard.coordinator().expenses();
    let created = source.insert_expense(groceries()).unwrap();
    wait_for(&mut expenses, |state| {
        state.status == SyncStatus::Idle && state.rows.len() == 1
    })
    .await;

    source.delete_expense(&created.id).unwrap();
    wait_for(&mut expenses, |state| {
        state.status == SyncStatus::Idle && state.rows.is_empty()
    })
    .await;

    let snapshot = dashboard.snapshot(&TransactionFilter::default(), ANCHOR);

    assert_eq!(snapshot.total, 0.0);
    assert_eq!(snapshot.top_category, None);

    dashboard.shutdown();
}

#[tokio::test]
async fn incomes_and_expenses_meet_in_the_comparison() {
    let source = SqliteDataSource::open_in_memory().unwrap();
    let mut dashboard = Dashboard::start(&source);

    let mut incomes = dashboard.coordinator().incomes();
    let mut expenses = dashboard.coordinator().expenses();

    source
        .insert_income(NewTransaction {
            description: "Salary".to_owned(),
            amount: 2000.0,
            date: date!(2024 - 02 - 01),
            category_id: None,
            custom_label: None,
        })
        .unwrap();
    source.insert_expense(groceries()).unwrap();

    wait_for(&mut incomes, |state| {
        state.status == SyncStatus::Idle && state.rows.len() == 1
    })
    .await;
    wait_for(&mut expenses, |state| {
        state.status == SyncStatus::Idle && state.rows.len() == 1
    })
    .await;

    let comparison = dashboard.comparison(ANCHOR);

    assert_eq!(comparison.monthly.len(), 12);
    assert_eq!(comparison.total_income, 2000.0);
    assert_eq!(comparison.total_expense, 100.0);
    assert_eq!(comparison.net_profit, 1900.0);

    dashboard.shutdown();
}
