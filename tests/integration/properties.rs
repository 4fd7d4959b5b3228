//! Randomized operation sequences against the catalog invariants

use proptest::prelude::*;

use elidune_catalog::{
    error::AppError,
    models::{BookUpdate, Isbn},
    repository::Repository,
    CatalogService,
};

use crate::support::{assert_indices_cover_catalog, book};

const ISBNS: [u64; 4] = [9781111111111, 9782222222222, 9783333333333, 9784444444444];
const AUTHORS: [&str; 3] = ["Doe, J", "doe,  J", "Roe, K"];
const SUBJECTS: [&str; 3] = ["Letras", "Historia", "Ciência"];
const BORROWERS: [&str; 3] = ["Alice", "Bob", "Carol"];

#[derive(Debug, Clone)]
enum Op {
    Add { isbn: usize, author: usize, subject: usize, year: u32, copies: u32 },
    AddCopy { isbn: usize },
    Edit { isbn: usize, author: Option<usize>, subject: Option<usize>, year: Option<u32>, copies: Option<u32> },
    Remove { isbn: usize },
    Lend { isbn: usize, borrower: usize },
    Return { isbn: usize, borrower: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let isbn = 0..ISBNS.len();
    prop_oneof![
        (isbn.clone(), 0..AUTHORS.len(), 0..SUBJECTS.len(), 1990u32..1994, 1u32..3).prop_map(
            |(isbn, author, subject, year, copies)| Op::Add { isbn, author, subject, year, copies }
        ),
        isbn.clone().prop_map(|isbn| Op::AddCopy { isbn }),
        (
            isbn.clone(),
            proptest::option::of(0..AUTHORS.len()),
            proptest::option::of(0..SUBJECTS.len()),
            proptest::option::of(1990u32..1994),
            proptest::option::of(0u32..3),
        )
            .prop_map(|(isbn, author, subject, year, copies)| Op::Edit {
                isbn,
                author,
                subject,
                year,
                copies
            }),
        isbn.clone().prop_map(|isbn| Op::Remove { isbn }),
        (isbn.clone(), 0..BORROWERS.len()).prop_map(|(isbn, borrower)| Op::Lend { isbn, borrower }),
        (isbn, 0..BORROWERS.len()).prop_map(|(isbn, borrower)| Op::Return { isbn, borrower }),
    ]
}

async fn apply(catalog: &mut CatalogService, op: Op) {
    match op {
        Op::Add { isbn, author, subject, year, copies } => {
            let exists = catalog.get_book(Isbn::new(ISBNS[isbn])).is_ok();
            let before = catalog.state().clone();
            let result = catalog
                .add_book(book(ISBNS[isbn], AUTHORS[author], SUBJECTS[subject], year, copies))
                .await;
            if exists {
                assert!(matches!(result, Err(AppError::DuplicateKey(_))));
                assert_eq!(catalog.state(), &before);
            } else {
                result.unwrap();
            }
        }
        Op::AddCopy { isbn } => {
            let _ = catalog.add_copy(Isbn::new(ISBNS[isbn])).await;
        }
        Op::Edit { isbn, author, subject, year, copies } => {
            let update = BookUpdate {
                author: author.map(|i| AUTHORS[i].to_string()),
                subject: subject.map(|i| SUBJECTS[i].to_string()),
                publication_year: year,
                copy_count: copies,
                ..Default::default()
            };
            let _ = catalog.edit_book(Isbn::new(ISBNS[isbn]), update).await;
        }
        Op::Remove { isbn } => {
            let isbn = Isbn::new(ISBNS[isbn]);
            let lent = !catalog.loans_for(isbn).is_empty();
            let before = catalog.state().clone();
            let result = catalog.remove_book(isbn).await;
            if lent {
                assert!(matches!(result, Err(AppError::InvalidState(_))));
                assert_eq!(catalog.state(), &before);
            }
        }
        Op::Lend { isbn, borrower } => {
            let isbn = Isbn::new(ISBNS[isbn]);
            let full = catalog.available_copies(isbn).map(|n| n == 0).unwrap_or(false);
            let result = catalog.lend_book(isbn, BORROWERS[borrower]).await;
            if full {
                assert!(matches!(result, Err(AppError::Unavailable(_))));
            }
        }
        Op::Return { isbn, borrower } => {
            let _ = catalog.return_book(Isbn::new(ISBNS[isbn]), BORROWERS[borrower]).await;
        }
    }
}

fn check_invariants(catalog: &CatalogService) {
    catalog.verify().unwrap();
    assert_indices_cover_catalog(catalog);
    for record in catalog.books() {
        assert!(catalog.loans_for(record.isbn).len() <= record.copy_count as usize);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invariants_hold_across_operations(ops in prop::collection::vec(op_strategy(), 1..40)) {
        tokio_test::block_on(async {
            let repository = Repository::in_memory();
            let mut catalog = CatalogService::new(repository.clone());
            for op in ops {
                apply(&mut catalog, op).await;
                check_invariants(&catalog);
            }

            let reloaded = CatalogService::load(repository).await.unwrap();
            assert!(reloaded.is_trusted());
            assert_eq!(reloaded.state(), catalog.state());
        });
    }
}
