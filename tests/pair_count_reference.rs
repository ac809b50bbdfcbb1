//! Pair counting against an O(n²) reference on random inputs
//!
//! Every pair `(i, j)` with `i < j` is binned directly: it lands in bin `k`
//! when `d_j >= d_i + e_k` and `d_j < d_i + e_{k+1}`. Both strategies of the
//! counter must agree with the reference exactly, including ties in the
//! distance array and duplicated edges.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use twolocus::data::genetic_map::DistanceBins;
use twolocus::data::genotype::{Dosage, GenotypeVector};
use twolocus::model::bounds::{PairThreshold, Window, WindowSpec};
use twolocus::model::heterozygosity::joint_heterozygosity;
use twolocus::model::pair_count::{PairCounter, Strategy};

const STRATEGIES: [Strategy; 2] = [Strategy::Batched, Strategy::Streaming];

struct Sites {
    positions: Vec<u32>,
    distances: Vec<f64>,
}

/// Strictly increasing positions and non-decreasing distances with ties
fn random_sites(rng: &mut StdRng, n: usize) -> Sites {
    let mut positions = Vec::with_capacity(n);
    let mut distances = Vec::with_capacity(n);
    let mut pos = rng.random_range(1..100u32);
    let mut d = 0.0;
    for _ in 0..n {
        positions.push(pos);
        distances.push(d);
        pos += rng.random_range(1..30u32);
        if !rng.random_bool(0.2) {
            d += rng.random_range(1..8u32) as f64 * 0.05;
        }
    }
    Sites {
        positions,
        distances,
    }
}

/// Non-decreasing edges, occasionally repeated
fn random_edges(rng: &mut StdRng) -> Vec<f64> {
    let n_edges = rng.random_range(2..7usize);
    let mut edges = vec![0.0];
    while edges.len() < n_edges {
        let last = edges[edges.len() - 1];
        if rng.random_bool(0.15) {
            edges.push(last);
        } else {
            edges.push(last + rng.random_range(1..10u32) as f64 * 0.1);
        }
    }
    edges
}

fn random_genotypes(rng: &mut StdRng, n: usize) -> GenotypeVector {
    let codes: Vec<i8> = (0..n).map(|_| rng.random_range(-1..=2i8)).collect();
    GenotypeVector::from_codes(&codes).expect("valid codes")
}

/// Bin of pair `(i, j)`, if any
fn reference_bin(distances: &[f64], edges: &[f64], i: usize, j: usize) -> Option<usize> {
    (0..edges.len() - 1).find(|&k| {
        !(distances[j] < distances[i] + edges[k]) && distances[j] < distances[i] + edges[k + 1]
    })
}

/// Reference weighted counts over left loci `left` and right loci `j < r_stop`
fn reference_counts<F>(
    sites: &Sites,
    edges: &[f64],
    left: std::ops::Range<usize>,
    r_stop: usize,
    bp_thresh: u32,
    weight: F,
) -> Vec<f64>
where
    F: Fn(usize, usize) -> f64,
{
    let mut counts = vec![0.0; edges.len() - 1];
    for i in left {
        for j in i + 1..r_stop {
            if bp_thresh > 0 && sites.positions[j] <= sites.positions[i] + bp_thresh {
                continue;
            }
            if let Some(k) = reference_bin(&sites.distances, edges, i, j) {
                counts[k] += weight(i, j);
            }
        }
    }
    counts
}

fn as_f64(counts: &[u64]) -> Vec<f64> {
    counts.iter().map(|&c| c as f64).collect()
}

#[test]
fn test_site_pairs_match_reference() {
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let n = rng.random_range(0..50usize);
        let sites = random_sites(&mut rng, n);
        let edges = random_edges(&mut rng);
        let bins = DistanceBins::from_distance_edges(edges.clone()).expect("valid edges");
        let expected = reference_counts(&sites, &edges, 0..n, n, 0, |_, _| 1.0);

        for strategy in STRATEGIES {
            let counts = PairCounter::new(&bins)
                .strategy(strategy)
                .count_site_pairs(&sites.distances, None)
                .expect("valid input");
            assert_eq!(as_f64(&counts), expected, "{:?} edges {:?}", strategy, edges);
        }
    }
}

#[test]
fn test_counts_are_monotone_in_edges() {
    // Raising edge k never lowers the number of pairs below it
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let n = rng.random_range(2..50usize);
        let sites = random_sites(&mut rng, n);
        let edges = random_edges(&mut rng);
        let k = rng.random_range(1..edges.len());
        let mut raised = edges.clone();
        raised[k] = match edges.get(k + 1) {
            Some(&next) => {
                let step = (next - edges[k]) * rng.random_range(0..=4u32) as f64 / 4.0;
                (edges[k] + step).min(next)
            }
            None => edges[k] + rng.random_range(1..10u32) as f64 * 0.1,
        };

        let bins = DistanceBins::from_distance_edges(edges.clone()).expect("valid edges");
        let raised_bins = DistanceBins::from_distance_edges(raised.clone()).expect("valid edges");
        let before = PairCounter::new(&bins)
            .count_site_pairs(&sites.distances, None)
            .expect("valid input");
        let after = PairCounter::new(&raised_bins)
            .count_site_pairs(&sites.distances, None)
            .expect("valid input");

        let below = |counts: &[u64]| counts[..k].iter().sum::<u64>();
        assert!(
            below(&after) >= below(&before),
            "edge {} raised: {:?} -> {:?}",
            k,
            edges,
            raised
        );
        // bins that do not touch edge k are unchanged
        assert_eq!(before[..k - 1], after[..k - 1]);
        assert_eq!(before.get(k + 1..), after.get(k + 1..));
    }
}

#[test]
fn test_window_with_extension_matches_whole_array() {
    let mut rng = StdRng::seed_from_u64(13);
    for _ in 0..200 {
        let n = rng.random_range(1..50usize);
        let sites = random_sites(&mut rng, n);
        let edges = random_edges(&mut rng);
        let bins = DistanceBins::from_distance_edges(edges.clone()).expect("valid edges");

        let a = sites.positions[rng.random_range(0..n)];
        let b = sites.positions[rng.random_range(0..n)];
        let window = Window::new(a.min(b), a.max(b));
        let l_start = sites.positions.partition_point(|&p| p < window.start);
        let l_stop = sites.positions.partition_point(|&p| p <= window.stop);

        for truncate_right in [false, true] {
            let r_stop = if truncate_right { l_stop } else { n };
            let expected =
                reference_counts(&sites, &edges, l_start..l_stop, r_stop, 0, |_, _| 1.0);
            for strategy in STRATEGIES {
                let counts = PairCounter::new(&bins)
                    .window(WindowSpec::Windowed {
                        bounds: window,
                        truncate_right,
                    })
                    .strategy(strategy)
                    .count_site_pairs(&sites.distances, Some(&sites.positions))
                    .expect("valid input");
                if l_stop - l_start <= 1 {
                    assert!(counts.iter().all(|&c| c == 0));
                } else {
                    assert_eq!(
                        as_f64(&counts),
                        expected,
                        "{:?} window {:?} truncate {}",
                        strategy,
                        window,
                        truncate_right
                    );
                }
            }
        }
    }
}

#[test]
fn test_bp_thresh_matches_reference() {
    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..200 {
        let n = rng.random_range(0..50usize);
        let sites = random_sites(&mut rng, n);
        let edges = random_edges(&mut rng);
        let bins = DistanceBins::from_distance_edges(edges.clone()).expect("valid edges");
        let bp = rng.random_range(1..60u32);
        let expected = reference_counts(&sites, &edges, 0..n, n, bp, |_, _| 1.0);

        for strategy in STRATEGIES {
            let counts = PairCounter::new(&bins)
                .threshold(PairThreshold::PhysicalThreshold(bp))
                .strategy(strategy)
                .count_site_pairs(&sites.distances, Some(&sites.positions))
                .expect("valid input");
            assert_eq!(as_f64(&counts), expected, "{:?} bp {}", strategy, bp);
        }
    }
}

#[test]
fn test_h2_matches_reference() {
    let mut rng = StdRng::seed_from_u64(19);
    for _ in 0..100 {
        let n = rng.random_range(0..50usize);
        let sites = random_sites(&mut rng, n);
        let edges = random_edges(&mut rng);
        let bins = DistanceBins::from_distance_edges(edges.clone()).expect("valid edges");
        let genotypes = random_genotypes(&mut rng, n);
        let het = |i: usize| genotypes.as_slice()[i] == Dosage::Het;
        let expected = reference_counts(&sites, &edges, 0..n, n, 0, |i, j| {
            if het(i) && het(j) {
                1.0
            } else {
                0.0
            }
        });

        for strategy in STRATEGIES {
            let counts = PairCounter::new(&bins)
                .strategy(strategy)
                .count_h2(&genotypes, &sites.distances, None)
                .expect("valid input");
            assert_eq!(as_f64(&counts), expected, "{:?}", strategy);
        }
    }
}

#[test]
fn test_h2xy_matches_joint_heterozygosity() {
    let mut rng = StdRng::seed_from_u64(23);
    for _ in 0..100 {
        let n = rng.random_range(0..50usize);
        let sites = random_sites(&mut rng, n);
        let edges = random_edges(&mut rng);
        let bins = DistanceBins::from_distance_edges(edges.clone()).expect("valid edges");
        let x = random_genotypes(&mut rng, n);
        let y = random_genotypes(&mut rng, n);
        let bp = if rng.random_bool(0.5) { 0 } else { rng.random_range(1..40u32) };
        let expected = reference_counts(&sites, &edges, 0..n, n, bp, |i, j| {
            joint_heterozygosity(
                [x.as_slice()[i], x.as_slice()[j]],
                [y.as_slice()[i], y.as_slice()[j]],
            )
        });

        for strategy in STRATEGIES {
            let counts = PairCounter::new(&bins)
                .threshold(PairThreshold::from_bp(bp))
                .strategy(strategy)
                .count_h2xy(&x, &y, &sites.distances, Some(&sites.positions))
                .expect("valid input");
            for (c, e) in counts.iter().zip(&expected) {
                assert!((c - e).abs() < 1e-9, "{:?}: {:?} vs {:?}", strategy, counts, expected);
            }
        }
    }
}

#[test]
fn test_strategies_agree_exactly_on_weights() {
    let mut rng = StdRng::seed_from_u64(29);
    for _ in 0..50 {
        let n = rng.random_range(2..50usize);
        let sites = random_sites(&mut rng, n);
        let edges = random_edges(&mut rng);
        let bins = DistanceBins::from_distance_edges(edges).expect("valid edges");
        let x = random_genotypes(&mut rng, n);
        let y = random_genotypes(&mut rng, n);

        let batched = PairCounter::new(&bins)
            .strategy(Strategy::Batched)
            .count_h2xy(&x, &y, &sites.distances, None)
            .expect("valid input");
        let streaming = PairCounter::new(&bins)
            .strategy(Strategy::Streaming)
            .count_h2xy(&x, &y, &sites.distances, None)
            .expect("valid input");
        assert_eq!(batched, streaming);
    }
}

#[test]
fn test_windowed_heterozygosity_matches_reference() {
    let mut rng = StdRng::seed_from_u64(31);
    for _ in 0..500 {
        let n = rng.random_range(1..40usize);
        let sites = random_sites(&mut rng, n);
        let edges = random_edges(&mut rng);
        let bins = DistanceBins::from_distance_edges(edges.clone()).expect("valid edges");
        let x = random_genotypes(&mut rng, n);
        let y = random_genotypes(&mut rng, n);

        let a = sites.positions[rng.random_range(0..n)];
        let b = sites.positions[rng.random_range(0..n)];
        let window = Window::new(a.min(b), a.max(b));
        let truncate_right = rng.random_bool(0.5);
        let bp = rng.random_range(0..30u32);
        let l_start = sites.positions.partition_point(|&p| p < window.start);
        let l_stop = sites.positions.partition_point(|&p| p <= window.stop);
        let r_stop = if truncate_right { l_stop } else { n };

        let het = |i: usize| x.as_slice()[i] == Dosage::Het;
        let n_het_left = (l_start..l_stop).filter(|&i| het(i)).count();
        let expected_h2 = if n_het_left <= 1 {
            vec![0.0; edges.len() - 1]
        } else {
            reference_counts(&sites, &edges, l_start..l_stop, r_stop, bp, |i, j| {
                if het(i) && het(j) {
                    1.0
                } else {
                    0.0
                }
            })
        };
        let expected_h2xy = if l_stop - l_start <= 1 {
            vec![0.0; edges.len() - 1]
        } else {
            reference_counts(&sites, &edges, l_start..l_stop, r_stop, bp, |i, j| {
                joint_heterozygosity(
                    [x.as_slice()[i], x.as_slice()[j]],
                    [y.as_slice()[i], y.as_slice()[j]],
                )
            })
        };

        let mut h2xy_by_strategy = Vec::new();
        for strategy in STRATEGIES {
            let counter = PairCounter::new(&bins)
                .window(WindowSpec::Windowed {
                    bounds: window,
                    truncate_right,
                })
                .threshold(PairThreshold::from_bp(bp))
                .strategy(strategy);

            let h2 = counter
                .count_h2(&x, &sites.distances, Some(&sites.positions))
                .expect("valid input");
            assert_eq!(
                as_f64(&h2),
                expected_h2,
                "{:?} window {:?} truncate {} bp {}",
                strategy,
                window,
                truncate_right,
                bp
            );

            let h2xy = counter
                .count_h2xy(&x, &y, &sites.distances, Some(&sites.positions))
                .expect("valid input");
            for (c, e) in h2xy.iter().zip(&expected_h2xy) {
                assert!(
                    (c - e).abs() < 1e-9,
                    "{:?} window {:?} truncate {} bp {}: {:?} vs {:?}",
                    strategy,
                    window,
                    truncate_right,
                    bp,
                    h2xy,
                    expected_h2xy
                );
            }
            h2xy_by_strategy.push(h2xy);
        }
        assert_eq!(h2xy_by_strategy[0], h2xy_by_strategy[1]);
    }
}
