//! Integration tests for scanning a real repository and refreshing the
//! pending document.

mod common;

use common::TestRepo;
use gw::error::ScanError;
use gw::vcs::Inspector;
use gw::{ChangeState, VcsBackend};

fn lines(n: usize) -> String {
    (1..=n).map(|i| format!("line {}\n", i)).collect()
}

#[tokio::test]
async fn test_clean_tree_reports_no_changes() {
    let repo = TestRepo::with_files(&[("a.txt", "hello\n")]);
    let workspace = repo.workspace();

    let git = gw::GitCli::discover(repo.path()).unwrap();
    let scan = Inspector::new(&git).scan().await;
    assert!(matches!(scan, Err(ScanError::NoChanges)));

    let outcome = workspace.refresh(None).await.unwrap();
    assert!(outcome.clean);
    assert!(outcome.document.records.is_empty());
    let text = std::fs::read_to_string(workspace.store().path()).unwrap();
    assert!(text.contains("No changes detected."));
}

#[tokio::test]
async fn test_scan_reports_states_and_counts() {
    let repo = TestRepo::with_files(&[("a.txt", &lines(10)), ("gone.txt", &lines(4))]);
    repo.write("a.txt", &format!("{}extra\n", lines(10)));
    repo.remove("gone.txt");
    repo.write("src/new.rs", "fn main() {}\n// end\n");

    let git = gw::GitCli::discover(repo.path()).unwrap();
    let changes = Inspector::new(&git).scan().await.unwrap();

    let paths: Vec<&str> = changes.iter().map(|c| c.path.as_str()).collect();
    assert_eq!(paths, vec!["a.txt", "gone.txt", "src/new.rs"]);

    assert_eq!(changes[0].unstaged, ChangeState::Modified);
    assert_eq!((changes[0].lines_added, changes[0].lines_removed), (1, 0));
    assert_eq!(changes[0].total_lines, 11);

    assert_eq!(changes[1].unstaged, ChangeState::Deleted);
    assert_eq!(changes[1].lines_removed, 4);
    assert_eq!(changes[1].total_lines, 0);

    assert_eq!(changes[2].unstaged, ChangeState::Added);
    assert_eq!(changes[2].lines_added, 2);
}

#[tokio::test]
async fn test_refresh_twice_is_byte_identical() {
    let repo = TestRepo::with_files(&[("a.txt", &lines(5)), ("b.txt", &lines(5))]);
    repo.write("b.txt", "changed\n");
    repo.write("a.txt", &lines(6));
    let workspace = repo.workspace();

    let first = workspace.refresh(None).await.unwrap();
    let bytes = std::fs::read(workspace.store().path()).unwrap();

    let second = workspace.refresh(None).await.unwrap();
    assert!(!second.written);
    assert_eq!(first.document, second.document);
    assert_eq!(std::fs::read(workspace.store().path()).unwrap(), bytes);
}

#[tokio::test]
async fn test_state_directory_is_not_listed() {
    let repo = TestRepo::with_files(&[("a.txt", "one\n")]);
    repo.write("a.txt", "two\n");
    let workspace = repo.workspace();

    workspace.refresh(None).await.unwrap();
    let outcome = workspace.refresh(None).await.unwrap();

    assert_eq!(outcome.document.records.len(), 1);
    assert_eq!(outcome.document.records[0].path, "a.txt");
}

#[tokio::test]
async fn test_rescan_preserves_hand_edited_description() {
    let repo = TestRepo::with_files(&[("a.txt", &lines(3)), ("b.txt", &lines(3))]);
    repo.write("a.txt", &lines(4));
    let workspace = repo.workspace();
    workspace.refresh(None).await.unwrap();

    // Edit the description cell by hand, the way a user would.
    let path = workspace.store().path().to_path_buf();
    let text = std::fs::read_to_string(&path).unwrap();
    let row = text.lines().find(|l| l.starts_with("| a.txt")).unwrap();
    let edited_row = format!("{}X |", row.trim_end().trim_end_matches('|').trim_end());
    std::fs::write(&path, text.replace(row, &edited_row)).unwrap();

    repo.write("b.txt", &lines(5));
    let outcome = workspace.refresh(None).await.unwrap();

    let a = outcome.document.find("a.txt").unwrap();
    assert_eq!(a.description.as_deref(), Some("X"));
    assert!(outcome.document.find("b.txt").is_some());
    assert_eq!(outcome.document.records[0].path, "a.txt");
}

#[tokio::test]
async fn test_rename_is_one_record() {
    let repo = TestRepo::with_files(&[("old.txt", &lines(20))]);
    repo.rename_staged("old.txt", "new.txt");

    let workspace = repo.workspace();
    let outcome = workspace.refresh(None).await.unwrap();

    assert_eq!(outcome.document.records.len(), 1);
    let record = &outcome.document.records[0];
    assert_eq!(record.path, "new.txt");
    assert_eq!(record.prior_path.as_deref(), Some("old.txt"));
    assert_eq!(record.staged, ChangeState::Renamed);
}

#[tokio::test]
async fn test_untracked_by_rm_cached_is_one_record() {
    let repo = TestRepo::with_files(&[("a.txt", &lines(3)), ("b.txt", &lines(2))]);
    repo.untrack("a.txt");
    repo.write("b.txt", &lines(3));

    let workspace = repo.workspace();
    let outcome = workspace.refresh(None).await.unwrap();

    let a: Vec<_> = outcome
        .document
        .records
        .iter()
        .filter(|r| r.path == "a.txt")
        .collect();
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].staged, ChangeState::Deleted);
    assert_eq!(a[0].unstaged, ChangeState::Added);
    assert_eq!((a[0].lines_added, a[0].lines_removed), (3, 3));

    assert_eq!(workspace.store().load().unwrap(), Some(outcome.document));
    let again = workspace.refresh(None).await.unwrap();
    assert!(again.recovered_from.is_none());
    assert!(!again.written);
}

#[tokio::test]
async fn test_unstaged_move_is_listed_as_two_paths() {
    let repo = TestRepo::with_files(&[("old.txt", &lines(20))]);
    std::fs::rename(repo.path().join("old.txt"), repo.path().join("new.txt")).unwrap();

    let workspace = repo.workspace();
    let outcome = workspace.refresh(None).await.unwrap();

    let records = &outcome.document.records;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].path, "new.txt");
    assert_eq!(records[0].unstaged, ChangeState::Added);
    assert_eq!(records[1].path, "old.txt");
    assert_eq!(records[1].unstaged, ChangeState::Deleted);
    assert!(records.iter().all(|r| r.prior_path.is_none()));
}

#[tokio::test]
async fn test_partially_staged_file_sums_counts() {
    let repo = TestRepo::with_files(&[("a.txt", &lines(10))]);
    repo.write("a.txt", &lines(12));
    repo.stage("a.txt");
    repo.write("a.txt", &lines(15));

    let workspace = repo.workspace();
    let outcome = workspace.refresh(None).await.unwrap();

    assert_eq!(outcome.document.records.len(), 1);
    let record = &outcome.document.records[0];
    assert_eq!(record.staged, ChangeState::Modified);
    assert_eq!(record.unstaged, ChangeState::Modified);
    assert_eq!(record.lines_added, 5);
    assert_eq!(record.percent_changed.to_string(), "33.3%");
}

#[tokio::test]
async fn test_discover_from_subdirectory() {
    let repo = TestRepo::with_files(&[("nested/deep/file.txt", "x\n")]);
    let git = gw::GitCli::discover(&repo.path().join("nested").join("deep")).unwrap();
    assert_eq!(
        git.root().canonicalize().unwrap(),
        repo.path().canonicalize().unwrap()
    );
}

#[test]
fn test_discover_outside_repository_fails() {
    let dir = tempfile::tempdir().unwrap();
    git2::Repository::init_bare(dir.path()).unwrap();
    let result = gw::GitCli::discover(dir.path());
    assert!(matches!(
        result,
        Err(gw::BackendError::NotARepository { .. })
    ));
}
