//! Sorting used by the loaders.
//!
//! [`introsort`] is an in-place, unstable sort driven by a "goes before"
//! predicate, used for the large per-key note buffers. Timelines that may hold
//! several entries on one tick go through [`stable_sort_by_tick`] instead so
//! file order survives among equal ticks.

/// Partitions smaller than this are finished with insertion sort.
const INSERTION_SORT_THRESHOLD: usize = 16;

/// Sorts `items` in place so that no element `b` after `a` satisfies `before(b, a)`.
///
/// `before` must be a strict weak ordering. Recursion depth is limited to
/// `ceil(log2(n)) + 1`; partitions that exceed it are finished with heapsort.
///
/// # Panics
///
/// The partition scans are unguarded, so a non-strict `before` (such as
/// `|a, b| a <= b`) can run them off the end of the slice.
pub(crate) fn introsort<T, F>(items: &mut [T], before: F)
where
    T: Copy,
    F: Fn(&T, &T) -> bool,
{
    if items.len() <= 1 {
        return;
    }
    let high = items.len() - 1;
    intro_sort(items, 0, high, recursion_depth(items.len()), &before);
}

/// Stable sort by a tick key. Entries sharing a tick keep their relative order.
pub fn stable_sort_by_tick<T, K>(items: &mut [T], tick: K)
where
    K: Fn(&T) -> u32,
{
    items.sort_by_key(|item| tick(item));
}

fn recursion_depth(len: usize) -> usize {
    let ceil_log2 = (usize::BITS - (len - 1).leading_zeros()) as usize;
    ceil_log2 + 1
}

fn intro_sort<T, F>(items: &mut [T], low: usize, mut high: usize, mut depth: usize, before: &F)
where
    T: Copy,
    F: Fn(&T, &T) -> bool,
{
    while high > low {
        let size = high - low + 1;
        if size < INSERTION_SORT_THRESHOLD {
            match size {
                2 => swap_if_greater(items, low, high, before),
                3 => {
                    swap_if_greater(items, low, high - 1, before);
                    swap_if_greater(items, low, high, before);
                    swap_if_greater(items, high - 1, high, before);
                }
                _ => insertion_sort(items, low, high, before),
            }
            return;
        }

        if depth == 0 {
            heap_sort(items, low, high, before);
            return;
        }
        depth -= 1;

        let pivot = pick_pivot_and_partition(items, low, high, before);
        intro_sort(items, pivot + 1, high, depth, before);
        // `pivot > low` always holds: the median-of-three leaves a sentinel at `low`.
        high = pivot - 1;
    }
}

#[inline]
fn swap_if_greater<T, F>(items: &mut [T], a: usize, b: usize, before: &F)
where
    F: Fn(&T, &T) -> bool,
{
    if a != b && before(&items[b], &items[a]) {
        items.swap(a, b);
    }
}

fn insertion_sort<T, F>(items: &mut [T], low: usize, high: usize, before: &F)
where
    T: Copy,
    F: Fn(&T, &T) -> bool,
{
    for i in low..high {
        let item = items[i + 1];
        let mut j = i + 1;
        while j > low && before(&item, &items[j - 1]) {
            items[j] = items[j - 1];
            j -= 1;
        }
        items[j] = item;
    }
}

/// Median-of-three pivot, parked in `high - 1`, then a Hoare-style partition.
/// Returns the pivot's final index.
fn pick_pivot_and_partition<T, F>(items: &mut [T], low: usize, high: usize, before: &F) -> usize
where
    T: Copy,
    F: Fn(&T, &T) -> bool,
{
    let mid = low + (high - low) / 2;
    swap_if_greater(items, low, mid, before);
    swap_if_greater(items, low, high, before);
    swap_if_greater(items, mid, high, before);

    let pivot = items[mid];
    items.swap(mid, high - 1);

    let mut left = low;
    let mut right = high - 1;
    while left < right {
        left += 1;
        while before(&items[left], &pivot) {
            left += 1;
        }
        right -= 1;
        while before(&pivot, &items[right]) {
            right -= 1;
        }
        if left >= right {
            break;
        }
        items.swap(left, right);
    }

    items.swap(left, high - 1);
    left
}

fn heap_sort<T, F>(items: &mut [T], low: usize, high: usize, before: &F)
where
    T: Copy,
    F: Fn(&T, &T) -> bool,
{
    let n = high - low + 1;
    for i in (1..=n / 2).rev() {
        down_heap(items, i, n, low, before);
    }
    for i in (2..=n).rev() {
        items.swap(low, low + i - 1);
        down_heap(items, 1, i - 1, low, before);
    }
}

/// Sifts the 1-based heap node `i` down within a heap of `n` nodes rooted at `low`.
fn down_heap<T, F>(items: &mut [T], mut i: usize, n: usize, low: usize, before: &F)
where
    T: Copy,
    F: Fn(&T, &T) -> bool,
{
    let item = items[low + i - 1];
    while i <= n / 2 {
        let mut child = 2 * i;
        if child < n && before(&items[low + child - 1], &items[low + child]) {
            child += 1;
        }
        if !before(&item, &items[low + child - 1]) {
            break;
        }
        items[low + i - 1] = items[low + child - 1];
        i = child;
    }
    items[low + i - 1] = item;
}
