use std::sync::Arc;

use index_cursor::mem::MemIndex;
use index_cursor::{CursorMark, IndexResultIterator, IterError, QuerySpec, RetryBudget};

fn letters() -> Vec<String> {
    ["A", "B", "C", "D", "E"].iter().map(|s| s.to_string()).collect()
}

async fn drain<R: Clone + Send + Sync>(it: &mut IndexResultIterator<MemIndex<R>>) -> Vec<R> {
    let mut out = Vec::new();
    while it.has_next() {
        out.push(it.next().await.unwrap());
    }
    out
}

#[tokio::test]
async fn five_rows_in_pages_of_two() {
    let index = Arc::new(MemIndex::new(letters()));
    let budget = RetryBudget::default().with_page_size(2);
    let mut it = IndexResultIterator::open(index.clone(), QuerySpec::new("dbv"), budget).await;

    let mut seen = Vec::new();
    let mut has_next_answers = Vec::new();
    for _ in 0..6 {
        has_next_answers.push(it.has_next());
        if it.has_next() {
            seen.push(it.next().await.unwrap());
        }
    }

    assert_eq!(seen, letters());
    assert_eq!(has_next_answers, vec![true, true, true, true, true, false]);

    // first page, refills after B and D, then the empty page that ends it
    assert_eq!(
        index.cursors(),
        vec![
            CursorMark::Start,
            CursorMark::from_token("2"),
            CursorMark::from_token("4"),
            CursorMark::from_token("5"),
        ]
    );
    assert_eq!(it.fetches(), 4);
    assert_eq!(it.total_count(), 5);
    assert!(it.failure().is_none());
}

#[tokio::test]
async fn has_next_stays_false_after_the_end() {
    let index = Arc::new(MemIndex::new(letters()));
    let mut it = IndexResultIterator::open(index.clone(), QuerySpec::new("dbv"), RetryBudget::default()).await;

    assert_eq!(drain(&mut it).await.len(), 5);
    let calls = index.calls();

    for _ in 0..3 {
        assert!(!it.has_next());
        assert_eq!(it.next().await, Err(IterError::Exhausted));
    }
    // no fetch after the empty page
    assert_eq!(index.calls(), calls);
}

#[tokio::test]
async fn page_size_changes_round_trips_not_rows() {
    let rows = vec![10u32, 20, 30];

    let big = Arc::new(MemIndex::new(rows.clone()));
    let mut it = IndexResultIterator::open(big.clone(), QuerySpec::new("dbv"), RetryBudget::default()).await;
    assert_eq!(drain(&mut it).await, rows);
    assert_eq!(big.calls(), 2);

    let small = Arc::new(MemIndex::new(rows.clone()));
    let budget = RetryBudget::default().with_page_size(1);
    let mut it = IndexResultIterator::open(small.clone(), QuerySpec::new("dbv"), budget).await;
    assert_eq!(drain(&mut it).await, rows);
    assert_eq!(small.calls(), 4);
}

#[tokio::test]
async fn empty_result_is_done_right_after_open() {
    let index = Arc::new(MemIndex::<String>::new(Vec::new()));
    let mut it = IndexResultIterator::open(index.clone(), QuerySpec::new("dbv"), RetryBudget::default()).await;

    assert!(!it.has_next());
    assert_eq!(it.total_count(), 0);
    assert!(it.failure().is_none());
    assert_eq!(it.next().await, Err(IterError::Exhausted));
    assert_eq!(index.calls(), 1);
}

#[tokio::test]
async fn many_pages_no_gaps_no_duplicates() {
    let rows: Vec<u32> = (0..1_037).collect();
    let index = Arc::new(MemIndex::new(rows.clone()));
    let budget = RetryBudget::default().with_page_size(100);
    let mut it = IndexResultIterator::open(index.clone(), QuerySpec::new("dbv"), budget).await;

    let got = drain(&mut it).await;
    assert_eq!(got, rows);
    // 11 pages with rows + the empty one
    assert_eq!(index.calls(), 12);
}

#[tokio::test]
async fn iterators_sharing_an_index_keep_their_own_cursor() {
    let index = Arc::new(MemIndex::new(letters()));
    let budget = RetryBudget::default().with_page_size(2);
    let mut a = IndexResultIterator::open(index.clone(), QuerySpec::new("dbv"), budget).await;
    let mut b = IndexResultIterator::open(index.clone(), QuerySpec::new("dbv"), budget).await;

    let mut from_a = Vec::new();
    let mut from_b = Vec::new();
    while a.has_next() || b.has_next() {
        if a.has_next() {
            from_a.push(a.next().await.unwrap());
        }
        if b.has_next() {
            from_b.push(b.next().await.unwrap());
        }
    }
    assert_eq!(from_a, letters());
    assert_eq!(from_b, letters());
}
