//! Catalog round trip through the file-backed store

use std::sync::Arc;

use elidune_catalog::{
    models::{BookUpdate, Isbn},
    repository::{Dataset, FileStore, Repository},
    CatalogService,
};

use crate::support::book;

async fn file_repository(dir: &std::path::Path) -> (Arc<FileStore>, Repository) {
    let store = Arc::new(FileStore::open(dir, true).await.unwrap());
    (store.clone(), Repository::new(store))
}

#[tokio::test]
async fn test_reload_reconstructs_catalog_and_ledger() {
    let dir = tempfile::tempdir().unwrap();
    let (store, repository) = file_repository(dir.path()).await;

    let mut catalog = CatalogService::new(repository);
    catalog
        .add_book(book(9781111111111, "Doe, J", "Letras", 2020, 2))
        .await
        .unwrap();
    catalog
        .add_book(book(9782222222222, "Roe, K", "Letras", 1999, 1))
        .await
        .unwrap();
    catalog.add_copy(Isbn::new(9782222222222)).await.unwrap();
    catalog
        .edit_book(
            Isbn::new(9781111111111),
            BookUpdate {
                author: Some("Doe, Jane".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    catalog.lend_book(Isbn::new(9781111111111), "Alice").await.unwrap();
    catalog.lend_book(Isbn::new(9782222222222), "Bob").await.unwrap();
    catalog.persist_all().await.unwrap();

    for dataset in Dataset::ALL {
        assert!(store.path_for(dataset).exists(), "{} missing", dataset);
    }

    let (_, reopened) = file_repository(dir.path()).await;
    let reloaded = CatalogService::load(reopened).await.unwrap();

    assert!(reloaded.is_trusted());
    assert_eq!(reloaded.state(), catalog.state());
    assert_eq!(reloaded.get_book(Isbn::new(9782222222222)).unwrap().copy_count, 2);
    assert_eq!(reloaded.books_by_subject("letras").len(), 2);
    assert_eq!(reloaded.loans_for(Isbn::new(9781111111111))[0].borrower, "Alice");
    reloaded.verify().unwrap();
}

#[tokio::test]
async fn test_load_from_empty_directory() {
    let dir = tempfile::tempdir().unwrap();
    let (_, repository) = file_repository(dir.path()).await;

    let catalog = CatalogService::load(repository).await.unwrap();
    assert_eq!(catalog.stats().books, 0);
    assert!(catalog.loans().is_empty());
}

#[tokio::test]
async fn test_load_rejects_loans_beyond_copies() {
    let dir = tempfile::tempdir().unwrap();
    let (_, repository) = file_repository(dir.path()).await;

    let mut catalog = CatalogService::new(repository.clone());
    catalog
        .add_book(book(9781111111111, "Doe, J", "Letras", 2020, 1))
        .await
        .unwrap();
    catalog.lend_book(Isbn::new(9781111111111), "Alice").await.unwrap();

    // Tamper with the ledger behind the catalog's back.
    let mut loans = repository.store().load(Dataset::Loans).await.unwrap().unwrap();
    let entry = loans[0].clone();
    loans.as_array_mut().unwrap().push(entry);
    repository.store().save(Dataset::Loans, &loans).await.unwrap();

    assert!(CatalogService::load(repository).await.is_err());
}
