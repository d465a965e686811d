use crate::mesh::builder::DatasetBuilder;
use crate::mesh::{Cell, Dataset};
use glam::DVec3;
use std::collections::VecDeque;

// cells using each point
fn point_cells(dataset: &Dataset) -> Vec<Vec<usize>> {
    let mut links = vec![Vec::new(); dataset.num_points()];
    for (c, cell) in dataset.cells().iter().enumerate() {
        for &p in &cell.points {
            if links[p].last() != Some(&c) {
                links[p].push(c);
            }
        }
    }
    links
}

fn flood(dataset: &Dataset, links: &[Vec<usize>], seed: usize, label: usize, labels: &mut [Option<usize>]) {
    let mut queue = VecDeque::from([seed]);
    labels[seed] = Some(label);
    while let Some(cell) = queue.pop_front() {
        for &p in &dataset.cells()[cell].points {
            for &next in &links[p] {
                if labels[next].is_none() {
                    labels[next] = Some(label);
                    queue.push_back(next);
                }
            }
        }
    }
}

/// Region id of every cell. Cells sharing a point belong to the same region;
/// regions are numbered in order of their lowest cell index.
pub fn label_regions(dataset: &Dataset) -> Vec<usize> {
    let links = point_cells(dataset);
    let mut labels = vec![None; dataset.num_cells()];
    let mut next = 0;
    for seed in 0..dataset.num_cells() {
        if labels[seed].is_none() {
            flood(dataset, &links, seed, next, &mut labels);
            next += 1;
        }
    }
    labels.into_iter().map(|l| l.unwrap_or_default()).collect()
}

/// Keep only the connected region containing the point nearest to
/// `reference`.
///
/// The search covers every point used by a cell; on ties the lowest point
/// index wins. Points of the result are renumbered in order of first use.
pub fn extract_closest_point_region(dataset: &Dataset, reference: DVec3) -> Dataset {
    let links = point_cells(dataset);
    let closest = links
        .iter()
        .enumerate()
        .filter(|(_, cells)| !cells.is_empty())
        .map(|(p, _)| (p, dataset.point(p).distance_squared(reference)))
        .fold(None, |best: Option<(usize, f64)>, (p, d)| match best {
            Some((_, bd)) if bd <= d => best,
            _ => Some((p, d)),
        });

    let mut builder = DatasetBuilder::new(dataset);
    if let Some((point, _)) = closest {
        let mut labels = vec![None; dataset.num_cells()];
        flood(dataset, &links, links[point][0], 0, &mut labels);
        for (cell, label) in dataset.cells().iter().zip(&labels) {
            if label.is_some() {
                let ids = cell.points.iter().map(|&p| builder.vertex(p)).collect();
                builder.push_cell(Cell::new(cell.kind, ids));
            }
        }
        log::debug!(
            "closest point region: seed point {point}, {} of {} cells kept",
            labels.iter().filter(|l| l.is_some()).count(),
            dataset.num_cells()
        );
    }
    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::test_support::two_squares;

    #[test]
    fn labels_two_components() {
        let ds = two_squares(0.5);
        assert_eq!(label_regions(&ds), vec![0, 0, 1, 1]);
    }

    #[test]
    fn keeps_only_the_region_around_the_reference() {
        let ds = two_squares(0.5);
        let region = extract_closest_point_region(&ds, DVec3::new(2.0, 0.5, 0.0));
        assert_eq!(region.num_cells(), 2);
        assert_eq!(region.num_points(), 4);
        assert!(region.points().iter().all(|p| p.x >= 1.5));
        let f = region.scalars("f").unwrap();
        for (p, v) in region.points().iter().zip(f) {
            assert_eq!(p.x, *v);
        }
    }

    #[test]
    fn equidistant_reference_picks_lowest_point_index() {
        let ds = two_squares(1.0);
        // x = 1.5 is halfway between the squares' facing edges
        let region = extract_closest_point_region(&ds, DVec3::new(1.5, 0.0, 0.0));
        assert!(region.points().iter().all(|p| p.x <= 1.0));
    }

    #[test]
    fn empty_input_gives_empty_output() {
        let region = extract_closest_point_region(&Dataset::default(), DVec3::ZERO);
        assert!(region.is_empty());
    }
}
