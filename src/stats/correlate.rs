//! Pairwise pollutant correlation.
//!
//! Correlations use pairwise-complete observations: a row enters the (i, j)
//! cell only when both columns are present in that row, so a missing PM10
//! value never disturbs the PM2.5 side of the matrix.

/// Symmetric correlation matrix over named columns.
///
/// `values[i][j]` is `None` when fewer than two complete pairs exist or one
/// side has zero variance over the complete pairs.
#[derive(Debug, Clone)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.values
            .iter()
            .all(|row| row.iter().all(|v| v.is_none()))
    }
}

/// Pearson correlation over the indices where both columns are present.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    debug_assert_eq!(xs.len(), ys.len());

    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys.iter())
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in &pairs {
        let dx = x - mean_x;
        let dy = y - mean_y;
        cov += dx * dy;
        var_x += dx * dx;
        var_y += dy * dy;
    }

    if var_x <= 0.0 || var_y <= 0.0 {
        return None;
    }
    Some(cov / (var_x * var_y).sqrt())
}

/// Build the full matrix. Only the lower triangle is computed; the upper
/// triangle is mirrored, and the diagonal is exactly 1.0 for any column with
/// at least two observed values.
pub fn correlation_matrix(labels: Vec<String>, columns: &[Vec<Option<f64>>]) -> CorrelationMatrix {
    let n = columns.len();
    debug_assert_eq!(labels.len(), n);

    let mut values = vec![vec![None; n]; n];
    for i in 0..n {
        let observed = columns[i].iter().filter(|v| v.is_some()).count();
        if observed >= 2 {
            values[i][i] = Some(1.0);
        }
        for j in 0..i {
            let r = pearson(&columns[i], &columns[j]);
            values[i][j] = r;
            values[j][i] = r;
        }
    }

    CorrelationMatrix { labels, values }
}
