/// Splits `items` into contiguous chunks of at most `chunk_size` elements.
///
/// The last chunk may be shorter; an empty slice gives no chunks at all. A
/// `chunk_size` of zero is treated as one.
pub fn chunk<T: Clone>(items: &[T], chunk_size: usize) -> Vec<Vec<T>> {
    items.chunks(chunk_size.max(1)).map(<[T]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_chunk_is_shorter() {
        let items: Vec<u32> = (0..250).collect();
        let chunks = chunk(&items, 100);

        let sizes: Vec<usize> = chunks.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![100, 100, 50]);
    }

    #[test]
    fn concatenation_reproduces_input() {
        let items: Vec<String> = (0..37).map(|i| format!("id-{i}")).collect();
        for size in [1, 2, 5, 36, 37, 38, 1000] {
            let chunks = chunk(&items, size);
            assert!(chunks.iter().all(|c| !c.is_empty() && c.len() <= size));
            assert_eq!(chunks.concat(), items, "chunk size {size}");
        }
    }

    #[test]
    fn empty_input_gives_no_chunks() {
        let items: Vec<String> = Vec::new();
        assert!(chunk(&items, 10).is_empty());
    }

    #[test]
    fn zero_chunk_size_does_not_panic() {
        assert_eq!(chunk(&[1, 2], 0), vec![vec![1], vec![2]]);
    }
}
