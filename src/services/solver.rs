//! Open-path TSP solver over a travel-duration matrix.
//!
//! Node 0 is the fixed start anchor and node n-1 the fixed end anchor
//! (both the depot); the middle nodes are the visits. Construction is
//! nearest-neighbour from the depot, improvement is 2-opt plus Or-opt
//! local search, restarted from seeded double-bridge perturbations while
//! the wall-clock budget lasts. Pure function of (matrix, budget, seed),
//! no hidden solver state.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::services::matrix::UNREACHABLE_COST;

/// A solved tour: matrix indices in visit order, depot anchors included.
#[derive(Debug, Clone)]
pub struct TspSolution {
    /// Node order, `order[0] == 0` and `order[n-1] == n-1`
    pub order: Vec<usize>,
    /// Total travel duration along the path in seconds
    pub total_duration: u64,
}

/// Solve the open path `0 → (middle nodes) → n-1`, minimizing total
/// duration. Returns `None` when fewer than 3 nodes are present or when
/// every tour crosses an unreachable leg.
///
/// The budget elapsing is not an error: the best order found so far is
/// returned. Deterministic for a fixed seed and sufficient budget.
pub fn solve_open_path(
    durations: &[Vec<u64>],
    time_budget: Duration,
    seed: u64,
) -> Option<TspSolution> {
    let n = durations.len();
    if n < 3 {
        return None;
    }

    let deadline = Instant::now() + time_budget;

    let mut order = nearest_neighbor_order(durations);
    local_search(durations, &mut order, deadline);

    let mut best = order.clone();
    let mut best_cost = path_cost(durations, &best);

    // Perturb-and-reoptimize while budget remains. The double bridge
    // needs four middle chunks to cut, so skip tiny instances where
    // local search is already exhaustive.
    if n >= 8 {
        let mut rng = StdRng::seed_from_u64(seed);
        while Instant::now() < deadline {
            double_bridge(&mut order, &mut rng);
            local_search(durations, &mut order, deadline);
            let cost = path_cost(durations, &order);
            if cost < best_cost {
                best = order.clone();
                best_cost = cost;
            } else {
                order.copy_from_slice(&best);
            }
        }
    }

    if best_cost >= UNREACHABLE_COST {
        return None;
    }

    Some(TspSolution {
        order: best,
        total_duration: best_cost,
    })
}

/// Total duration of the path in visit order
pub fn path_cost(durations: &[Vec<u64>], order: &[usize]) -> u64 {
    order
        .windows(2)
        .map(|w| durations[w[0]][w[1]])
        .fold(0u64, u64::saturating_add)
}

/// Greedy construction: repeatedly hop to the nearest unvisited node,
/// starting from the depot, closing at the end anchor.
fn nearest_neighbor_order(durations: &[Vec<u64>]) -> Vec<usize> {
    let n = durations.len();
    let mut order = Vec::with_capacity(n);
    order.push(0);

    let mut visited = vec![false; n];
    visited[0] = true;
    visited[n - 1] = true;

    let mut current = 0;
    for _ in 1..n - 1 {
        let mut next = None;
        let mut next_cost = u64::MAX;
        for candidate in 1..n - 1 {
            if !visited[candidate] && durations[current][candidate] < next_cost {
                next_cost = durations[current][candidate];
                next = Some(candidate);
            }
        }
        if let Some(candidate) = next {
            order.push(candidate);
            visited[candidate] = true;
            current = candidate;
        }
    }

    order.push(n - 1);
    order
}

/// Alternate 2-opt and Or-opt passes until neither improves or the
/// deadline passes.
fn local_search(durations: &[Vec<u64>], order: &mut Vec<usize>, deadline: Instant) {
    loop {
        let improved = two_opt_pass(durations, order) | or_opt_pass(durations, order);
        if !improved || Instant::now() >= deadline {
            break;
        }
    }
}

/// One 2-opt pass: reverse middle segments when that shortens the path.
/// The matrix may be asymmetric, so the reversed internal arcs are
/// re-costed rather than assumed equal.
fn two_opt_pass(durations: &[Vec<u64>], order: &mut [usize]) -> bool {
    let n = order.len();
    if n < 4 {
        return false;
    }

    let mut improved = false;
    for i in 1..n - 2 {
        for j in i + 1..n - 1 {
            let mut old_cost = durations[order[i - 1]][order[i]];
            let mut new_cost = durations[order[i - 1]][order[j]];
            for k in i..j {
                old_cost = old_cost.saturating_add(durations[order[k]][order[k + 1]]);
                new_cost = new_cost.saturating_add(durations[order[k + 1]][order[k]]);
            }
            old_cost = old_cost.saturating_add(durations[order[j]][order[j + 1]]);
            new_cost = new_cost.saturating_add(durations[order[i]][order[j + 1]]);

            if new_cost < old_cost {
                order[i..=j].reverse();
                improved = true;
            }
        }
    }
    improved
}

/// One Or-opt pass: relocate runs of 1–3 consecutive visits to a better
/// position.
fn or_opt_pass(durations: &[Vec<u64>], order: &mut Vec<usize>) -> bool {
    let n = order.len();
    if n < 4 {
        return false;
    }

    let mut improved = false;
    for seg_len in 1..=3usize {
        if n - 2 < seg_len + 1 {
            continue;
        }
        let mut start = 1;
        while start + seg_len <= n - 1 {
            let current_cost = path_cost(durations, order);
            let segment: Vec<usize> = order[start..start + seg_len].to_vec();

            let mut rest = order.clone();
            rest.drain(start..start + seg_len);

            let mut best_insert = None;
            let mut best_cost = current_cost;
            for pos in 1..rest.len() {
                let mut candidate = rest.clone();
                candidate.splice(pos..pos, segment.iter().copied());
                let cost = path_cost(durations, &candidate);
                if cost < best_cost {
                    best_cost = cost;
                    best_insert = Some(pos);
                }
            }

            if let Some(pos) = best_insert {
                let mut candidate = rest;
                candidate.splice(pos..pos, segment.into_iter());
                *order = candidate;
                improved = true;
            }
            start += 1;
        }
    }
    improved
}

/// Double-bridge 4-opt move over the middle nodes. The classic escape
/// from 2-opt local optima: cuts the path into four chunks and reorders
/// them without reversing any.
fn double_bridge(order: &mut [usize], rng: &mut StdRng) {
    let n = order.len();
    if n < 8 {
        return;
    }

    // Three distinct cut points strictly inside the middle section
    let mut cuts = [0usize; 3];
    cuts[0] = rng.gen_range(1..n - 3);
    cuts[1] = rng.gen_range(cuts[0] + 1..n - 2);
    cuts[2] = rng.gen_range(cuts[1] + 1..n - 1);

    let mut rebuilt = Vec::with_capacity(n);
    rebuilt.extend_from_slice(&order[..cuts[0]]);
    rebuilt.extend_from_slice(&order[cuts[1]..cuts[2]]);
    rebuilt.extend_from_slice(&order[cuts[0]..cuts[1]]);
    rebuilt.extend_from_slice(&order[cuts[2]..]);
    order.copy_from_slice(&rebuilt);
}
