use std::collections::BTreeMap;

use super::error::Unavailable;
use super::model::{Indicator, Series};

// ---------------------------------------------------------------------------
// Joins
// ---------------------------------------------------------------------------

/// One year present in both joined series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinedRow {
    pub year: i32,
    pub left: f64,
    pub right: f64,
}

/// Inner join on Year. Both inputs are sorted, so this is a merge walk.
pub fn inner_join(left: &Series, right: &Series) -> Vec<JoinedRow> {
    let (mut i, mut j) = (0, 0);
    let mut out = Vec::new();
    while i < left.points.len() && j < right.points.len() {
        let (a, b) = (left.points[i], right.points[j]);
        match a.year.cmp(&b.year) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(JoinedRow {
                    year: a.year,
                    left: a.value,
                    right: b.value,
                });
                i += 1;
                j += 1;
            }
        }
    }
    out
}

fn join_or_unavailable(left: &Series, right: &Series) -> Result<Vec<JoinedRow>, Unavailable> {
    let rows = inner_join(left, right);
    if rows.is_empty() {
        return Err(Unavailable::NoOverlap {
            left: left.indicator.to_string(),
            right: right.indicator.to_string(),
        });
    }
    Ok(rows)
}

/// Per-year outer join of several series, for the data table view.
pub fn year_table(series: &[&Series]) -> Vec<(i32, Vec<Option<f64>>)> {
    let mut table: BTreeMap<i32, Vec<Option<f64>>> = BTreeMap::new();
    for (col, s) in series.iter().enumerate() {
        for p in &s.points {
            table.entry(p.year).or_insert_with(|| vec![None; series.len()])[col] = Some(p.value);
        }
    }
    table.into_iter().collect()
}

// ---------------------------------------------------------------------------
// Ratio
// ---------------------------------------------------------------------------

/// `part / total * 100` for every year in both series. Years missing from
/// either side, or with a zero total, produce no row.
pub fn share_of_total(part: &Series, total: &Series) -> Result<Series, Unavailable> {
    let rows = join_or_unavailable(part, total)?;
    Ok(Series::from_pairs(
        Indicator::Co2Share,
        rows.into_iter().filter_map(|r| {
            let pct = r.left / r.right * 100.0;
            pct.is_finite().then_some((r.year, pct))
        }),
    ))
}

// ---------------------------------------------------------------------------
// Correlation and trend line
// ---------------------------------------------------------------------------

/// Pearson correlation with its two-sided p-value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correlation {
    pub r: f64,
    pub p_value: f64,
    pub n: usize,
}

/// Ordinary least-squares fit `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendLine {
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

struct Moments {
    n: usize,
    mean_x: f64,
    mean_y: f64,
    sxx: f64,
    syy: f64,
    sxy: f64,
}

fn moments(left: &Series, right: &Series) -> Result<Moments, Unavailable> {
    let rows = join_or_unavailable(left, right)?;
    let n = rows.len();
    if n < 2 {
        return Err(Unavailable::TooFewPoints {
            left: left.indicator.to_string(),
            right: right.indicator.to_string(),
            found: n,
        });
    }
    let mean_x = rows.iter().map(|r| r.left).sum::<f64>() / n as f64;
    let mean_y = rows.iter().map(|r| r.right).sum::<f64>() / n as f64;
    let (mut sxx, mut syy, mut sxy) = (0.0, 0.0, 0.0);
    for r in &rows {
        let (dx, dy) = (r.left - mean_x, r.right - mean_y);
        sxx += dx * dx;
        syy += dy * dy;
        sxy += dx * dy;
    }
    if sxx == 0.0 {
        return Err(Unavailable::Constant(left.indicator.to_string()));
    }
    if syy == 0.0 {
        return Err(Unavailable::Constant(right.indicator.to_string()));
    }
    Ok(Moments {
        n,
        mean_x,
        mean_y,
        sxx,
        syy,
        sxy,
    })
}

/// Pearson's r over the years both series share.
///
/// Needs at least two shared years and non-constant values on both sides.
/// With exactly two points r is ±1 and the p-value is 1.
pub fn pearson(left: &Series, right: &Series) -> Result<Correlation, Unavailable> {
    let m = moments(left, right)?;
    let r = (m.sxy / (m.sxx * m.syy).sqrt()).clamp(-1.0, 1.0);
    Ok(Correlation {
        r,
        p_value: two_sided_p(r, m.n),
        n: m.n,
    })
}

/// Least-squares trend of `right` against `left` over their shared years.
pub fn linear_trend(left: &Series, right: &Series) -> Result<TrendLine, Unavailable> {
    let m = moments(left, right)?;
    let slope = m.sxy / m.sxx;
    Ok(TrendLine {
        slope,
        intercept: m.mean_y - slope * m.mean_x,
    })
}

/// Two-sided p-value of r under H0: ρ = 0, via Student's t with n − 2 df.
fn two_sided_p(r: f64, n: usize) -> f64 {
    if n <= 2 {
        return 1.0;
    }
    let df = (n - 2) as f64;
    let r2 = r * r;
    if r2 >= 1.0 {
        return 0.0;
    }
    let t2 = r2 * df / (1.0 - r2);
    incomplete_beta(df / 2.0, 0.5, df / (df + t2))
}

// -- Special functions --

/// ln Γ(x) for x > 0 (Lanczos approximation).
fn ln_gamma(x: f64) -> f64 {
    const COF: [f64; 6] = [
        76.180_091_729_471_46,
        -86.505_320_329_416_77,
        24.014_098_240_830_91,
        -1.231_739_572_450_155,
        0.120_865_097_386_617_9e-2,
        -0.539_523_938_495_3e-5,
    ];
    let mut y = x;
    let tmp = x + 5.5;
    let tmp = tmp - (x + 0.5) * tmp.ln();
    let mut ser = 1.000_000_000_190_015;
    for c in COF {
        y += 1.0;
        ser += c / y;
    }
    -tmp + (2.506_628_274_631_000_5 * ser / x).ln()
}

/// Regularised incomplete beta function I_x(a, b).
fn incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let front =
        (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(a, b, x) / a
    } else {
        1.0 - front * beta_continued_fraction(b, a, 1.0 - x) / b
    }
}

/// Continued fraction for I_x(a, b), modified Lentz's method.
fn beta_continued_fraction(a: f64, b: f64, x: f64) -> f64 {
    const MAX_ITER: u32 = 300;
    const EPS: f64 = 3e-16;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let (qab, qap, qam) = (a + b, a + 1.0, a - 1.0);
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;
    for m in 1..=MAX_ITER {
        let m = f64::from(m);
        let m2 = 2.0 * m;

        let aa = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        h *= d * c;

        let aa = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + aa * d);
        c = guard(1.0 + aa / c);
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(indicator: Indicator, pairs: &[(i32, f64)]) -> Series {
        Series::from_pairs(indicator, pairs.iter().copied())
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn inner_join_keeps_shared_years_only() {
        let a = series(Indicator::Co2, &[(2000, 1.0), (2001, 2.0), (2003, 4.0)]);
        let b = series(Indicator::Temperature, &[(2001, 10.0), (2002, 11.0), (2003, 12.0)]);
        let joined = inner_join(&a, &b);
        assert_eq!(
            joined,
            vec![
                JoinedRow { year: 2001, left: 2.0, right: 10.0 },
                JoinedRow { year: 2003, left: 4.0, right: 12.0 },
            ]
        );
    }

    #[test]
    fn share_matches_definition_and_skips_gaps() {
        let cn = series(Indicator::Co2, &[(2019, 10.0), (2020, 11.0), (2021, 12.0)]);
        let world = series(Indicator::WorldCo2, &[(2019, 100.0), (2020, 106.0), (2022, 120.0)]);
        let share = share_of_total(&cn, &world).unwrap();
        assert_eq!(share.indicator, Indicator::Co2Share);
        assert_eq!(share.len(), 2);
        assert!(close(share.value_at(2019).unwrap(), 10.0, 1e-12));
        assert!(close(share.value_at(2020).unwrap(), 11.0 / 106.0 * 100.0, 1e-12));
        assert!(close(share.value_at(2020).unwrap(), 10.377, 1e-3));
        assert_eq!(share.value_at(2021), None);
    }

    #[test]
    fn share_drops_zero_totals() {
        let cn = series(Indicator::Co2, &[(2000, 1.0), (2001, 1.0)]);
        let world = series(Indicator::WorldCo2, &[(2000, 0.0), (2001, 4.0)]);
        let share = share_of_total(&cn, &world).unwrap();
        assert_eq!(share.points.len(), 1);
        assert!(share.points.iter().all(|p| p.value.is_finite()));
    }

    #[test]
    fn share_without_overlap_is_unavailable() {
        let cn = series(Indicator::Co2, &[(2000, 1.0)]);
        let world = series(Indicator::WorldCo2, &[(2001, 4.0)]);
        assert!(matches!(
            share_of_total(&cn, &world),
            Err(Unavailable::NoOverlap { .. })
        ));
    }

    #[test]
    fn pearson_known_values() {
        // df = 1: t is Cauchy, r = 0.5 gives p = 2/3.
        let x = series(Indicator::Co2, &[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let y = series(Indicator::Temperature, &[(1, 1.0), (2, 3.0), (3, 2.0)]);
        let c = pearson(&x, &y).unwrap();
        assert!(close(c.r, 0.5, 1e-12));
        assert!(close(c.p_value, 2.0 / 3.0, 1e-6), "p = {}", c.p_value);
        assert_eq!(c.n, 3);

        // df = 2: p = 1 - |r| exactly.
        let x = series(Indicator::Co2, &[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0)]);
        let y = series(Indicator::Temperature, &[(1, 1.0), (2, 3.0), (3, 2.0), (4, 4.0)]);
        let c = pearson(&x, &y).unwrap();
        assert!(close(c.r, 0.8, 1e-12));
        assert!(close(c.p_value, 0.2, 1e-6), "p = {}", c.p_value);

        let x = series(Indicator::Co2, &[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0), (5, 5.0)]);
        let y = series(Indicator::Temperature, &[(1, 2.0), (2, 4.0), (3, 5.0), (4, 4.0), (5, 5.0)]);
        let c = pearson(&x, &y).unwrap();
        assert!(close(c.r, 0.774_596_669_241_483_4, 1e-12));
        assert!(close(c.p_value, 0.124_027_062_657_549_7, 1e-6), "p = {}", c.p_value);
    }

    #[test]
    fn pearson_two_points_and_perfect_fit() {
        let x = series(Indicator::Co2, &[(1, 1.0), (2, 2.0)]);
        let y = series(Indicator::Temperature, &[(1, 5.0), (2, 3.0)]);
        let c = pearson(&x, &y).unwrap();
        assert!(close(c.r, -1.0, 1e-12));
        assert_eq!(c.p_value, 1.0);

        let x = series(Indicator::Co2, &[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let y = series(Indicator::Temperature, &[(1, 2.0), (2, 4.0), (3, 6.0)]);
        assert_eq!(pearson(&x, &y).unwrap().p_value, 0.0);
    }

    #[test]
    fn pearson_unavailable_cases() {
        let one = series(Indicator::Co2, &[(2000, 1.0)]);
        let other = series(Indicator::Temperature, &[(2000, 1.0), (2001, 2.0)]);
        assert_eq!(
            pearson(&one, &other),
            Err(Unavailable::TooFewPoints {
                left: Indicator::Co2.to_string(),
                right: Indicator::Temperature.to_string(),
                found: 1,
            })
        );

        let flat = series(Indicator::Co2, &[(2000, 3.0), (2001, 3.0)]);
        assert_eq!(
            pearson(&flat, &other),
            Err(Unavailable::Constant(Indicator::Co2.to_string()))
        );

        let empty = Series::empty(Indicator::Co2);
        assert!(matches!(pearson(&empty, &other), Err(Unavailable::NoOverlap { .. })));
    }

    #[test]
    fn trend_line_fits_least_squares() {
        let x = series(Indicator::Co2, &[(1, 1.0), (2, 2.0), (3, 3.0), (4, 4.0), (5, 5.0)]);
        let y = series(Indicator::Temperature, &[(1, 2.0), (2, 4.0), (3, 5.0), (4, 4.0), (5, 5.0)]);
        let t = linear_trend(&x, &y).unwrap();
        assert!(close(t.slope, 0.6, 1e-12));
        assert!(close(t.intercept, 2.2, 1e-12));
        assert!(close(t.at(3.0), 4.0, 1e-12));
    }

    #[test]
    fn year_table_is_outer_join() {
        let a = series(Indicator::Co2, &[(2000, 1.0), (2001, 2.0)]);
        let b = series(Indicator::Energy, &[(2001, 5.0), (2002, 6.0)]);
        let table = year_table(&[&a, &b]);
        assert_eq!(
            table,
            vec![
                (2000, vec![Some(1.0), None]),
                (2001, vec![Some(2.0), Some(5.0)]),
                (2002, vec![None, Some(6.0)]),
            ]
        );
    }

    #[test]
    fn incomplete_beta_edges() {
        assert_eq!(incomplete_beta(2.0, 0.5, 0.0), 0.0);
        assert_eq!(incomplete_beta(2.0, 0.5, 1.0), 1.0);
        // I_x(1, 1) = x
        assert!(close(incomplete_beta(1.0, 1.0, 0.3), 0.3, 1e-9));
    }
}
