/// Split `total` records evenly across `producers`.
///
/// Every producer gets `total / producers`; the remainder is dropped, so the
/// sum is `total - total % producers`. Zero producers yields an empty partition.
pub fn partition(total: u64, producers: usize) -> Vec<u64> {
    if producers == 0 {
        return Vec::new();
    }
    let share = total / producers as u64;
    vec![share; producers]
}

/// Records lost to the truncating partition
pub fn dropped_remainder(total: u64, producers: usize) -> u64 {
    if producers == 0 {
        return total;
    }
    total % producers as u64
}

/// Number of batches a producer emits for `lines` records
pub fn batch_count(lines: u64, batch_size: usize) -> u64 {
    if batch_size == 0 {
        return 0;
    }
    lines.div_ceil(batch_size as u64)
}

/// Size of the last batch a producer emits, or 0 when it emits none
pub fn last_batch_size(lines: u64, batch_size: usize) -> u64 {
    if lines == 0 || batch_size == 0 {
        return 0;
    }
    match lines % batch_size as u64 {
        0 => batch_size as u64,
        rest => rest,
    }
}
