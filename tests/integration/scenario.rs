//! Lending walkthrough and persistence failure handling

use std::sync::Arc;

use elidune_catalog::{
    error::AppError,
    models::{IndexKey, Isbn},
    repository::{Dataset, Repository},
    CatalogService,
};

use crate::support::{assert_indices_cover_catalog, book, FlakyStore};

#[tokio::test]
async fn test_lending_walkthrough() {
    let mut catalog = CatalogService::new(Repository::in_memory());
    let isbn = Isbn::new(9781111111111);

    catalog
        .add_book(book(9781111111111, "Doe, J", "Letras", 2020, 2))
        .await
        .unwrap();

    catalog.lend_book(isbn, "Alice").await.unwrap();
    assert_eq!(catalog.available_copies(isbn).unwrap(), 1);
    catalog.lend_book(isbn, "Bob").await.unwrap();
    assert_eq!(catalog.available_copies(isbn).unwrap(), 0);

    assert!(matches!(
        catalog.lend_book(isbn, "Carol").await,
        Err(AppError::Unavailable(_))
    ));

    catalog.return_book(isbn, "Alice").await.unwrap();

    assert!(matches!(
        catalog.remove_book(isbn).await,
        Err(AppError::InvalidState(_))
    ));
    assert!(catalog.get_book(isbn).is_ok());

    catalog.return_book(isbn, "Bob").await.unwrap();
    catalog.remove_book(isbn).await.unwrap();

    let state = catalog.state();
    assert!(state.by_year().get(&2020).is_none());
    assert!(state.by_subject().get(&IndexKey::new("Letras")).is_none());
    assert!(state.by_author().get(&IndexKey::new("Doe, J")).is_none());
    assert!(catalog.loans().is_empty());
    assert_indices_cover_catalog(&catalog);
}

#[tokio::test]
async fn test_removal_keeps_shared_buckets() {
    let mut catalog = CatalogService::new(Repository::in_memory());
    catalog
        .add_book(book(9781111111111, "Doe, J", "Letras", 2020, 1))
        .await
        .unwrap();
    catalog
        .add_book(book(9782222222222, "Doe, J", "Letras", 2020, 1))
        .await
        .unwrap();

    catalog.remove_book(Isbn::new(9781111111111)).await.unwrap();

    let remaining: Vec<Isbn> = catalog
        .books_by_author("Doe, J")
        .iter()
        .map(|b| b.isbn)
        .collect();
    assert_eq!(remaining, vec![Isbn::new(9782222222222)]);
    assert_eq!(catalog.books_by_year(2020).len(), 1);
    assert_indices_cover_catalog(&catalog);
}

#[tokio::test]
async fn test_partial_failure_rolls_back_and_flags_untrusted() {
    let store = Arc::new(FlakyStore::new());
    let repository = Repository::new(store.clone());
    let mut catalog = CatalogService::new(repository.clone());

    catalog
        .add_book(book(9781111111111, "Doe, J", "Letras", 2020, 2))
        .await
        .unwrap();
    let before = catalog.state().clone();

    store.fail(&[Dataset::BySubject]);
    let result = catalog
        .add_book(book(9782222222222, "Roe, K", "Historia", 1999, 1))
        .await;

    match result {
        Err(AppError::PersistencePartial { written, failed }) => {
            assert_eq!(written, vec![Dataset::Catalog, Dataset::ByYear]);
            assert_eq!(failed, vec![Dataset::BySubject, Dataset::ByAuthor, Dataset::Loans]);
        }
        other => panic!("expected partial persistence, got {:?}", other),
    }
    assert_eq!(catalog.state(), &before);
    // The restore batch hits the same failure.
    assert!(!catalog.is_trusted());

    store.heal();
    catalog.persist_all().await.unwrap();
    assert!(catalog.is_trusted());

    let reloaded = CatalogService::load(repository).await.unwrap();
    assert_eq!(reloaded.state(), catalog.state());
}

#[tokio::test]
async fn test_total_failure_leaves_durable_state_alone() {
    let store = Arc::new(FlakyStore::new());
    let repository = Repository::new(store.clone());
    let mut catalog = CatalogService::new(repository.clone());
    catalog
        .add_book(book(9781111111111, "Doe, J", "Letras", 2020, 2))
        .await
        .unwrap();

    store.fail(&[Dataset::Catalog]);
    let result = catalog.lend_book(Isbn::new(9781111111111), "Alice").await;
    assert!(matches!(result, Err(AppError::PersistenceFailed { .. })));
    assert!(catalog.loans().is_empty());
    assert!(catalog.is_trusted());

    store.heal();
    let reloaded = CatalogService::load(repository).await.unwrap();
    assert_eq!(reloaded.state(), catalog.state());
}
