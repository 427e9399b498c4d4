//! Tests for the SQLite repository.

use tempfile::NamedTempFile;

use strictly_squares::{
    AllocationError, Claimant, GridId, GridRepository, NewGrid, Payouts, Position, Quarter,
    ScoreRecord, Settlement, SettlementError, SquareAllocator, SquareStore, StoreError,
};

/// Creates a temporary database file with schema applied, returns the file
/// handle (must stay in scope to keep the file alive) and a ready repository.
fn setup_test_db() -> (NamedTempFile, GridRepository) {
    let db_file = NamedTempFile::new().expect("Failed to create temp file");
    let db_path = db_file.path().to_str().expect("Invalid path").to_string();

    let repo = GridRepository::new(db_path).expect("Failed to create repository");
    repo.run_migrations().expect("Migrations failed");
    (db_file, repo)
}

fn new_grid(name: &str) -> NewGrid {
    NewGrid::new(
        name.to_string(),
        "Chiefs".to_string(),
        "Eagles".to_string(),
        1000,
        "10,20,30,40".parse::<Payouts>().expect("valid payouts"),
    )
}

fn open_grid(repo: &GridRepository, name: &str) -> GridId {
    let grid = repo
        .with_transaction(|uow| uow.create_grid(&new_grid(name)))
        .expect("Create failed");
    *grid.id()
}

fn positions(numbers: &[i64]) -> Vec<Position> {
    numbers
        .iter()
        .map(|n| Position::new(*n).expect("valid position"))
        .collect()
}

#[test]
fn test_empty_path_rejected() {
    assert!(GridRepository::new("  ".to_string()).is_err());
}

#[test]
fn test_migrations_are_idempotent() {
    let (_db, repo) = setup_test_db();
    repo.run_migrations().expect("Second run failed");
}

#[test]
fn test_create_and_load_grid() {
    let (_db, repo) = setup_test_db();
    let grid_id = open_grid(&repo, "Big Game");
    assert!(grid_id > 0);

    let grid = repo
        .with_transaction(|uow| uow.grid(grid_id))
        .expect("Load failed")
        .expect("Grid missing");
    assert_eq!(grid.name(), "Big Game");
    assert_eq!(*grid.price_cents(), 1000);
    assert_eq!(grid.payouts().weights(), &[10, 20, 30, 40]);
    assert!(!grid.is_sealed());

    let missing = repo
        .with_transaction(|uow| uow.grid(grid_id + 100))
        .expect("Load failed");
    assert!(missing.is_none());
}

#[test]
fn test_duplicate_grid_name_fails() {
    let (_db, repo) = setup_test_db();
    open_grid(&repo, "Big Game");
    let result = repo.with_transaction(|uow| uow.create_grid(&new_grid("Big Game")));
    assert_eq!(result.map(|_| ()), Err(StoreError::UniqueViolation));
}

#[test]
fn test_insert_claim_and_read_back() {
    let (_db, repo) = setup_test_db();
    let grid_id = open_grid(&repo, "Big Game");

    let claimant = Claimant::new(
        "Ann",
        Some("ann@example.com".to_string()),
        Some("555-0100".to_string()),
    );
    let claim_id = repo
        .with_transaction(|uow| uow.insert_claim(grid_id, &claimant, &positions(&[9, 3, 50])))
        .expect("Insert failed");

    let count = repo
        .with_transaction(|uow| uow.reserved_count(grid_id))
        .expect("Count failed");
    assert_eq!(count, 3);

    let claims = repo
        .with_transaction(|uow| uow.claims(grid_id))
        .expect("Load failed");
    assert_eq!(claims.len(), 1);
    assert_eq!(*claims[0].id(), claim_id);
    assert_eq!(claims[0].claimant(), &claimant);
    assert_eq!(claims[0].positions(), &positions(&[3, 9, 50]));

    let taken = repo
        .with_transaction(|uow| uow.taken_among(grid_id, &positions(&[1, 3, 50, 99])))
        .expect("Lookup failed");
    assert_eq!(taken, positions(&[3, 50]));
}

#[test]
fn test_duplicate_cell_is_unique_violation_and_rolls_back() {
    let (_db, repo) = setup_test_db();
    let grid_id = open_grid(&repo, "Big Game");
    repo.with_transaction(|uow| uow.insert_claim(grid_id, &Claimant::named("Ann"), &positions(&[7])))
        .expect("Insert failed");

    let result = repo.with_transaction(|uow| {
        uow.insert_claim(grid_id, &Claimant::named("Bob"), &positions(&[6, 7, 8]))
    });
    assert_eq!(result, Err(StoreError::UniqueViolation));

    let count = repo
        .with_transaction(|uow| uow.reserved_count(grid_id))
        .expect("Count failed");
    assert_eq!(count, 1);
    let claims = repo
        .with_transaction(|uow| uow.claims(grid_id))
        .expect("Load failed");
    assert_eq!(claims.len(), 1, "Failed claim row must not survive");
}

#[test]
fn test_same_position_on_different_grids() {
    let (_db, repo) = setup_test_db();
    let first = open_grid(&repo, "First");
    let second = open_grid(&repo, "Second");
    for grid_id in [first, second] {
        repo.with_transaction(|uow| {
            uow.insert_claim(grid_id, &Claimant::named("Ann"), &positions(&[1]))
        })
        .expect("Insert failed");
    }
}

#[test]
fn test_seal_is_one_way() {
    let (_db, repo) = setup_test_db();
    let grid_id = open_grid(&repo, "Big Game");
    let allocator = SquareAllocator::new(repo.clone());

    let axes = allocator.close(grid_id).expect("Close failed");
    let grid = repo
        .with_transaction(|uow| uow.grid(grid_id))
        .expect("Load failed")
        .expect("Grid missing");
    assert_eq!(grid.sealed_axes().expect("Axes missing"), &axes);

    assert_eq!(allocator.close(grid_id), Err(AllocationError::Closed(grid_id)));
    let again = repo.with_transaction(|uow| uow.seal(grid_id, &axes));
    assert!(matches!(again, Err(StoreError::Backend(_))));
}

#[test]
fn test_full_grid_through_allocator() {
    let (_db, repo) = setup_test_db();
    let grid_id = open_grid(&repo, "Big Game");
    let allocator = SquareAllocator::new(repo.clone());

    for chunk in (1..=100).collect::<Vec<i64>>().chunks(10) {
        let outcome = allocator
            .claim(grid_id, Claimant::named(format!("Block {}", chunk[0])), chunk)
            .expect("Claim failed");
        assert_eq!(outcome.sealed(), &(chunk[9] == 100));
    }

    let result = allocator.claim(grid_id, Claimant::named("Late"), &[1]);
    assert_eq!(result, Err(AllocationError::Closed(grid_id)));
}

#[test]
fn test_scores_upsert_and_delete() {
    let (_db, repo) = setup_test_db();
    let grid_id = open_grid(&repo, "Big Game");
    let settlement = Settlement::new(repo.clone());

    assert_eq!(
        settlement.record_score(grid_id, 1, 7, 3),
        Err(SettlementError::NotSealed(grid_id))
    );

    SquareAllocator::new(repo.clone())
        .close(grid_id)
        .expect("Close failed");
    settlement
        .record_score(grid_id, 2, 10, 3)
        .expect("Score failed");
    settlement
        .record_score(grid_id, 1, 7, 0)
        .expect("Score failed");
    settlement
        .record_score(grid_id, 2, 14, 10)
        .expect("Correction failed");

    let scores = repo
        .with_transaction(|uow| uow.scores(grid_id))
        .expect("Load failed");
    assert_eq!(
        scores,
        vec![
            ScoreRecord::new(Quarter::First, 7, 0),
            ScoreRecord::new(Quarter::Second, 14, 10),
        ]
    );

    assert!(settlement.delete_score(grid_id, 1).expect("Delete failed"));
    assert!(!settlement.delete_score(grid_id, 1).expect("Delete failed"));
    assert_eq!(settlement.winners(grid_id).expect("Winners failed").len(), 1);
}

#[test]
fn test_oversized_score_is_validation_error() {
    let (_db, repo) = setup_test_db();
    let grid_id = open_grid(&repo, "Big Game");
    SquareAllocator::new(repo.clone())
        .close(grid_id)
        .expect("Close failed");
    let settlement = Settlement::new(repo.clone());

    let result = settlement.record_score(grid_id, 1, 3_000_000_000, 7);
    assert!(
        matches!(result, Err(SettlementError::Validation(_))),
        "got {result:?}"
    );
    let scores = repo
        .with_transaction(|uow| uow.scores(grid_id))
        .expect("Load failed");
    assert!(scores.is_empty());

    settlement
        .record_score(grid_id, 1, i64::from(i32::MAX), 7)
        .expect("Largest storable score failed");
}

#[test]
fn test_list_grids_ordered_by_id() {
    let (_db, repo) = setup_test_db();
    let empty = repo
        .with_transaction(|uow| uow.grids())
        .expect("List failed");
    assert!(empty.is_empty());

    let first = open_grid(&repo, "First");
    let second = open_grid(&repo, "Second");
    SquareAllocator::new(repo.clone())
        .close(second)
        .expect("Close failed");

    let grids = Settlement::new(repo.clone()).grids().expect("List failed");
    let ids: Vec<GridId> = grids.iter().map(|g| *g.id()).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(!grids[0].is_sealed());
    assert!(grids[1].is_sealed());
}
