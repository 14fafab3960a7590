//! Property tests for token windowing and document chunking

use quickcheck::TestResult;
use quickcheck_macros::quickcheck;
use std::sync::Arc;

use docqa::chunking::{window_ranges, Chunker, ChunkingConfig, WhitespaceTokenizer};
use docqa::types::{Document, Section};

fn chunker(size: usize, overlap: usize) -> Chunker {
    let config = ChunkingConfig {
        chunk_size_tokens: size,
        overlap_tokens: overlap,
        ..Default::default()
    };
    Chunker::new(config, Arc::new(WhitespaceTokenizer)).unwrap()
}

fn words(n: usize) -> String {
    (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
}

#[quickcheck]
fn windows_cover_all_tokens(total: u16, size: u8, overlap: u8) -> TestResult {
    let (total, size, overlap) = (total as usize % 3000, size as usize, overlap as usize);
    if size == 0 || overlap >= size {
        return TestResult::discard();
    }

    let windows = window_ranges(total, size, overlap);
    if total == 0 {
        return TestResult::from_bool(windows.is_empty());
    }

    let first_starts_at_zero = windows[0].start == 0;
    let last_ends_at_total = windows[windows.len() - 1].end == total;
    let bounded = windows.iter().all(|w| w.start < w.end && w.len() <= size);
    TestResult::from_bool(first_starts_at_zero && last_ends_at_total && bounded)
}

#[quickcheck]
fn consecutive_windows_share_overlap(total: u16, size: u8, overlap: u8) -> TestResult {
    let (total, size, overlap) = (total as usize % 3000, size as usize, overlap as usize);
    if size == 0 || overlap >= size {
        return TestResult::discard();
    }

    let windows = window_ranges(total, size, overlap);
    let ok = windows
        .windows(2)
        .all(|pair| pair[0].len() == size && pair[1].start == pair[0].end - overlap);
    TestResult::from_bool(ok)
}

#[quickcheck]
fn chunk_texts_overlap_by_exactly_overlap_words(n: u16, size: u8, overlap: u8) -> TestResult {
    let (n, size, overlap) = (n as usize % 600, size as usize % 60, overlap as usize % 60);
    if size == 0 || overlap >= size {
        return TestResult::discard();
    }

    let pieces = chunker(size, overlap).chunk_text(&words(n)).unwrap();
    if n == 0 {
        return TestResult::from_bool(pieces.is_empty());
    }
    if n <= size {
        return TestResult::from_bool(pieces == vec![words(n)]);
    }

    let ok = pieces.windows(2).all(|pair| {
        let left: Vec<&str> = pair[0].split_whitespace().collect();
        let right: Vec<&str> = pair[1].split_whitespace().collect();
        left.len() == size && left[size - overlap..] == right[..overlap]
    });
    let last_word = format!("w{}", n - 1);
    let ends_with_last = pieces
        .last()
        .is_some_and(|p| p.split_whitespace().last() == Some(last_word.as_str()));
    TestResult::from_bool(ok && ends_with_last)
}

#[quickcheck]
fn chunk_ids_strictly_increase(section_lengths: Vec<u8>) -> bool {
    let document = Document {
        doc_name: "sql-select".to_string(),
        url: "https://www.postgresql.org/docs/16/sql-select.html".to_string(),
        sections: section_lengths
            .iter()
            .enumerate()
            .map(|(i, &len)| Section {
                title: format!("Section {}", i),
                text: words(len as usize),
            })
            .collect(),
    };

    let chunks = chunker(20, 5).chunk_document(&document).unwrap();
    let ids_sequential = chunks
        .iter()
        .enumerate()
        .all(|(i, c)| c.chunk_id == i as u64);
    let all_from_document = chunks.iter().all(|c| c.metadata.doc_name == "sql-select");
    ids_sequential && all_from_document
}

#[quickcheck]
fn chunking_is_deterministic(n: u16) -> bool {
    let text = words(n as usize % 2000);
    let c = chunker(50, 10);
    c.chunk_text(&text).unwrap() == c.chunk_text(&text).unwrap()
}

#[test]
fn default_windows_over_a_long_section() {
    // 1200 tokens at size 500, overlap 100: starts at 0, 400, 800
    let windows = window_ranges(1200, 500, 100);
    assert_eq!(windows, vec![0..500, 400..900, 800..1200]);
}
