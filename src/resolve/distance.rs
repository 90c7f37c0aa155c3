//! Restricted Damerau–Levenshtein (optimal string alignment) distance.
//!
//! [`bounded`] is the one used for catalog lookups: it keeps three rolling
//! rows and gives up as soon as the answer is known to exceed `max`. The
//! column minimum of the OSA matrix never decreases, so abandoning a candidate
//! once it exceeds `max` can never discard a distance that would have come back
//! down below it.

/// Distance between `a` and `b` if it is at most `max`, otherwise `None`.
pub fn bounded(a: &str, b: &str, max: usize) -> Option<usize> {
    let mut short: Vec<char> = a.chars().collect();
    let mut long: Vec<char> = b.chars().collect();
    if short.len() > long.len() {
        std::mem::swap(&mut short, &mut long);
    }
    if long.len() - short.len() > max {
        return None;
    }

    let n = short.len();
    let mut current: Vec<usize> = (0..=n).collect();
    let mut previous = vec![0; n + 1];
    let mut before_previous = vec![0; n + 1];

    for j in 1..=long.len() {
        // rotate: before_previous <- previous <- current
        std::mem::swap(&mut before_previous, &mut previous);
        std::mem::swap(&mut previous, &mut current);
        current[0] = j;
        let mut column_min = current[0];

        for i in 1..=n {
            let cost = usize::from(short[i - 1] != long[j - 1]);
            let deletion = current[i - 1] + 1;
            let insertion = previous[i] + 1;
            let substitution = previous[i - 1] + cost;
            let mut best = deletion.min(insertion).min(substitution);

            if i > 1 && j > 1 && short[i - 2] == long[j - 1] && short[i - 1] == long[j - 2] {
                best = best.min(before_previous[i - 2] + 1);
            }

            current[i] = best;
            column_min = column_min.min(best);
        }

        if column_min > max {
            return None;
        }
    }

    let distance = current[n];
    (distance <= max).then_some(distance)
}

/// Unbounded reference implementation over the full matrix.
pub fn full(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut d = vec![vec![0usize; b.len() + 1]; a.len() + 1];

    for (i, row) in d.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        d[0][j] = j;
    }

    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            d[i][j] = (d[i - 1][j] + 1)
                .min(d[i][j - 1] + 1)
                .min(d[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                d[i][j] = d[i][j].min(d[i - 2][j - 2] + 1);
            }
        }
    }

    d[a.len()][b.len()]
}
