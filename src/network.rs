//! Table-free compaction for shapes too wide to enumerate.
//!
//! Each kept lane has to move left by the number of dropped lanes in front
//! of it. That distance is applied one bit at a time, lowest first: in the
//! round for bit `k`, every lane whose distance has bit `k` set moves left
//! by `2^k`, and every other output lane either keeps its occupant or takes
//! the mover arriving from `2^k` lanes to its right. Two kept lanes never
//! land on the same slot in any round, and they never pass each other, so
//! after `log2(N)` rounds of per-lane selects the kept lanes are packed in
//! their original order.

/// Moves the lanes whose bit is set in `code` to the front, keeping order.
///
/// Lanes past the number of set bits hold unspecified (stale) values.
pub fn compact<T: Copy, const N: usize>(lanes: [T; N], code: u64) -> [T; N] {
    assert!(N <= 64, "masks cover at most 64 lanes");

    let mut values = lanes;
    let mut live = [false; N];
    let mut distance = [0usize; N];
    let mut dropped = 0;
    for lane in 0..N {
        live[lane] = (code >> lane) & 1 != 0;
        distance[lane] = dropped;
        if !live[lane] {
            dropped += 1;
        }
    }

    let mut step = 1;
    while step < N {
        let (prev_values, prev_live, prev_distance) = (values, live, distance);
        for slot in 0..N {
            let from = slot + step;
            if from < N && prev_live[from] && prev_distance[from] & step != 0 {
                values[slot] = prev_values[from];
                distance[slot] = prev_distance[from];
                live[slot] = true;
            } else if !(prev_live[slot] && prev_distance[slot] & step == 0) {
                live[slot] = false;
            }
        }
        step <<= 1;
    }
    values
}
