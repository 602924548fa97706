use common::shapes::{BoundingRect, Point};
use grid::grid::CellCoord;
use grid::{GridConfig, GridError};
use serialization::*;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;

fn random_sources(count: usize, seed: u64) -> Vec<SpatialUnit> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let bound = BoundingRect::from_center_size(
                rng.gen_range(0.0..1000.0),
                rng.gen_range(0.0..1000.0),
                rng.gen_range(1.0..40.0),
                rng.gen_range(1.0..40.0),
            );
            SpatialUnit::new(format!("unit-{}", i), bound).with_priority(rng.gen_range(-3..4))
        })
        .collect()
}

fn query_rects() -> Vec<BoundingRect> {
    let mut rng = StdRng::seed_from_u64(99);
    let world = BoundingRect::new(-50.0, -50.0, 1050.0, 1050.0);
    let mut rects: Vec<BoundingRect> = (0..64)
        .map(|_| world.get_random_rect_inside(300.0, 300.0, &mut rng))
        .collect();
    rects.push(world);
    rects.push(BoundingRect::new(2000.0, 2000.0, 2100.0, 2100.0));
    rects
}

fn query_keys(partition: &SpatialPartition, rect: &BoundingRect) -> HashSet<String> {
    let mut scratch = partition.scratch();
    let mut results = Vec::new();
    partition.query_rect(rect, &mut scratch, &mut results);
    results.iter().map(|unit| unit.key.clone()).collect()
}

fn assert_same_queries(left: &SpatialPartition, right: &SpatialPartition) {
    for rect in query_rects() {
        assert_eq!(query_keys(left, &rect), query_keys(right, &rect), "query {}", rect);
    }
}

fn built_partition() -> (SpatialPartition, Vec<SpatialUnit>) {
    let sources = random_sources(300, 7);
    let partition = SpatialPartition::build(&sources, GridConfig::default(), false).unwrap();
    (partition, sources)
}

#[test]
fn test_build_matches_brute_force() {
    let (partition, sources) = built_partition();
    assert_eq!(partition.len(), sources.len());
    assert_eq!(
        Some(partition.world_rect()),
        SpatialPartition::world_rect_of(&sources, false)
    );
    for rect in query_rects() {
        let expected: HashSet<String> = sources
            .iter()
            .filter(|unit| unit.bound.overlaps(&rect))
            .map(|unit| unit.key.clone())
            .collect();
        assert_eq!(query_keys(&partition, &rect), expected, "query {}", rect);
    }
}

#[test]
fn test_json_round_trip() {
    let (partition, _) = built_partition();
    let json = partition.record().to_json().unwrap();
    let record = PartitionRecord::from_json(&json).unwrap();
    let restored = SpatialPartition::from_record(&record).unwrap();
    assert_eq!(restored.len(), partition.len());
    assert_same_queries(&partition, &restored);
}

#[test]
fn test_binary_round_trip() {
    let (partition, _) = built_partition();
    let bytes = partition.record().to_bytes().unwrap();
    let restored = SpatialPartition::from_record(&PartitionRecord::from_bytes(&bytes).unwrap()).unwrap();
    assert_same_queries(&partition, &restored);
}

#[test]
fn test_save_and_load() {
    let (partition, _) = built_partition();
    let path = std::env::temp_dir().join(format!("partition-{}.bin", std::process::id()));
    let record = partition.record();
    record.save(&path).unwrap();
    let loaded = PartitionRecord::load(&path);
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded.unwrap(), record);
}

#[test]
fn test_record_is_stable_across_restore() {
    let (mut partition, sources) = built_partition();
    partition.remove_element(&sources[0], partition.locate_detail_cell(sources[0].world_pos)).unwrap();

    let record = partition.record();
    let again = SpatialPartition::from_record(&record).unwrap().record();
    assert_eq!(again, record);
    let cells: Vec<(String, CellCoord)> = record
        .sources
        .iter()
        .map(|unit| (unit.key.clone(), unit.cell))
        .collect();
    let cells_again: Vec<(String, CellCoord)> = again
        .sources
        .iter()
        .map(|unit| (unit.key.clone(), unit.cell))
        .collect();
    assert_eq!(cells, cells_again);
}

#[test]
fn test_record_layout() {
    let (partition, _) = built_partition();
    let record = partition.record();
    let config = GridConfig::default();
    assert_eq!(record.grid_params, GridParams::from(&config));
    assert_eq!(
        record.detail_cells_rect.len(),
        (config.detail_rows().unwrap() * config.detail_cols().unwrap()) as usize
    );
    assert_eq!(
        record.coarse_cell_element_headers.len(),
        (config.coarse_rows * config.coarse_cols) as usize
    );
    assert_eq!(record.coarse_cell_element_headers[0], 0);
    assert!(record
        .coarse_cell_element_headers
        .windows(2)
        .all(|pair| pair[0] <= pair[1]));
    assert_eq!(
        record.coarse_cell_elements.len(),
        partition.index().coarse().member_count()
    );
    assert!(record.sources.iter().all(|unit| unit.is_assigned()));
}

#[test]
fn test_restore_rejects_bad_layout() {
    let (partition, _) = built_partition();

    let mut record = partition.record();
    record.detail_cells_rect.pop();
    assert!(matches!(
        record.restore(),
        Err(PartitionError::LayoutMismatch {
            field: "detail_cells_rect",
            expected: 256,
            found: 255,
        })
    ));

    let mut record = partition.record();
    record.coarse_cell_element_headers.push(0);
    assert!(matches!(
        record.restore(),
        Err(PartitionError::LayoutMismatch {
            field: "coarse_cell_element_headers",
            ..
        })
    ));

    let mut record = partition.record();
    record.coarse_cell_element_headers[1] = record.coarse_cell_elements.len() as u32 + 5;
    assert!(matches!(
        record.restore(),
        Err(PartitionError::HeaderOutOfOrder { cell: 1 })
    ));

    assert!(matches!(
        PartitionRecord::from_json("{\"world_rect\": 3}"),
        Err(PartitionError::Json(_))
    ));
    assert!(matches!(
        PartitionRecord::from_bytes(&[1, 2, 3]),
        Err(PartitionError::Binary(_))
    ));
}

#[test]
fn test_restore_skips_sources_outside_the_grid() {
    let (partition, sources) = built_partition();
    let mut record = partition.record();
    record.sources[0].cell = CellCoord::new(-1, 3);
    record.sources[1].cell = CellCoord::new(16, 0);
    let index = record.restore().unwrap();
    assert_eq!(index.len(), sources.len() - 2);
}

#[test]
fn test_capture_leaves_far_sources_unassigned() {
    let a = SpatialUnit::new("a", BoundingRect::new(0.0, 0.0, 10.0, 10.0));
    let b = SpatialUnit::new("b", BoundingRect::new(10.0, 10.0, 10.0, 10.0));
    let partition =
        SpatialPartition::build(&[a.clone(), b.clone()], GridConfig::default(), false).unwrap();
    // A source centered on the max corner lands in the last cell.
    assert_eq!(partition.len(), 2);
    assert_eq!(partition.locate_detail_cell(b.world_pos), CellCoord::new(15, 15));

    let far = SpatialUnit::new("far", BoundingRect::new(50.0, 50.0, 60.0, 60.0));
    let record = PartitionRecord::capture(partition.index(), &[a, b, far]);
    assert!(record.sources[0].is_assigned());
    assert_eq!(record.sources[1].cell, CellCoord::new(15, 15));
    assert!(!record.sources[2].is_assigned());

    let record = PartitionRecord::from_bytes(&record.to_bytes().unwrap()).unwrap();
    let index = record.restore().unwrap();
    assert_eq!(index.len(), 2);
    let mut scratch = index.scratch();
    let mut results = Vec::new();
    index.query(&BoundingRect::new(0.0, 0.0, 100.0, 100.0), &mut scratch, &mut results);
    let keys: HashSet<&str> = results.iter().map(|unit| unit.key.as_str()).collect();
    assert_eq!(keys, ["a", "b"].into_iter().collect());
}

#[test]
fn test_restore_checks_dimensions_before_allocating() {
    let (partition, _) = built_partition();

    let mut record = partition.record();
    record.grid_params.coarse_rows = 1 << 16;
    record.grid_params.detail_row_multiplier = 1 << 16;
    assert!(matches!(
        record.restore(),
        Err(PartitionError::Grid(GridError::InvalidDimensions { .. }))
    ));

    // Valid but huge: the short arrays are rejected without building the grids.
    let mut record = partition.record();
    record.grid_params = GridParams {
        coarse_rows: 1 << 10,
        coarse_cols: 1 << 10,
        detail_row_multiplier: 1 << 5,
        detail_col_multiplier: 1 << 5,
    };
    assert!(matches!(
        record.restore(),
        Err(PartitionError::LayoutMismatch {
            field: "detail_cells_rect",
            expected: 1_073_741_824,
            found: 256,
        })
    ));

    let mut record = partition.record();
    record.grid_params.coarse_cols = 0;
    assert!(matches!(
        record.restore(),
        Err(PartitionError::Grid(GridError::InvalidDimensions { .. }))
    ));

    let config = GridConfig {
        coarse_rows: 1 << 16,
        detail_row_multiplier: 1 << 16,
        ..GridConfig::default()
    };
    assert!(matches!(
        SpatialPartition::build(&random_sources(4, 1), config, false),
        Err(PartitionError::Grid(GridError::InvalidDimensions { .. }))
    ));
}

#[test]
fn test_restore_with_custom_reconstruct() {
    let (partition, sources) = built_partition();
    let record = partition.record();
    let index = record
        .restore_with(|index, units| {
            for unit in units.iter().filter(|unit| unit.priority > 0) {
                index.insert_into_fine_cell(unit.clone(), unit.cell)?;
            }
            Ok(())
        })
        .unwrap();

    let expected = sources.iter().filter(|unit| unit.priority > 0).count();
    assert_eq!(index.len(), expected);

    let mut scratch = index.scratch();
    let mut results = Vec::new();
    index.query(&partition.world_rect(), &mut scratch, &mut results);
    assert_eq!(results.len(), expected);
    assert!(results.iter().all(|unit| unit.priority > 0));
}

#[test]
fn test_build_without_sources_fails() {
    assert!(SpatialPartition::world_rect_of(&[], false).is_none());
    assert!(matches!(
        SpatialPartition::build(&[], GridConfig::default(), false),
        Err(PartitionError::Grid(GridError::InvalidRect { .. }))
    ));
}

#[test]
fn test_square_world() {
    let sources = vec![
        SpatialUnit::new("a", BoundingRect::new(0.0, 0.0, 10.0, 2.0)),
        SpatialUnit::new("b", BoundingRect::new(0.0, 2.0, 4.0, 4.0)),
    ];
    assert_eq!(
        SpatialPartition::world_rect_of(&sources, true),
        Some(BoundingRect::new(0.0, -3.0, 10.0, 7.0))
    );
    let partition = SpatialPartition::build(&sources, GridConfig::default(), true).unwrap();
    assert_eq!(partition.len(), 2);
    assert_eq!(
        partition.coarse_cell_bound(0, 0).unwrap(),
        BoundingRect::new(0.0, -3.0, 2.5, -0.5)
    );
    assert!(partition.coarse_cell_bound(4, 0).is_err());
}

#[test]
fn test_partition_edits() {
    let sources = vec![
        SpatialUnit::new("a", BoundingRect::new(0.0, 0.0, 10.0, 10.0)),
        SpatialUnit::new("b", BoundingRect::new(90.0, 90.0, 100.0, 100.0)),
    ];
    let config = GridConfig {
        coarse_rows: 2,
        coarse_cols: 2,
        detail_row_multiplier: 2,
        detail_col_multiplier: 2,
        ..GridConfig::default()
    };
    let mut partition = SpatialPartition::build(&sources, config, false).unwrap();
    assert_eq!(partition.locate_coarse_cell(Point::new(60.0, 10.0)), CellCoord::new(0, 1));
    assert_eq!(partition.locate_detail_cell(Point::new(60.0, 10.0)), CellCoord::new(0, 2));
    let range = partition.find_contact_coarse_cells(&BoundingRect::new(10.0, 10.0, 60.0, 20.0));
    assert_eq!(range.count(), 2);

    let c = SpatialUnit::new("c", BoundingRect::new(30.0, 30.0, 40.0, 40.0));
    let cell = partition.add_element(c.clone()).unwrap();
    assert_eq!(cell, CellCoord::new(1, 1));
    assert!(query_keys(&partition, &BoundingRect::new(35.0, 35.0, 36.0, 36.0)).contains("c"));

    // Large growth re-registers the cell so the new reach is queryable.
    let grown = BoundingRect::new(30.0, 30.0, 80.0, 40.0);
    assert!(partition.fast_update_element_bounds(&c, grown, cell).unwrap());
    assert_eq!(partition.detail_cell_bound(1, 1).unwrap(), grown);
    assert!(query_keys(&partition, &BoundingRect::new(70.0, 35.0, 75.0, 36.0)).contains("c"));
    assert!(!partition
        .fast_update_element_bounds(&c, grown, CellCoord::new(-1, -1))
        .unwrap());

    let d = SpatialUnit::new("d", BoundingRect::new(5.0, 60.0, 8.0, 62.0));
    partition
        .add_element_to_detail_cell(d.clone(), CellCoord::new(2, 0))
        .unwrap();
    let e = SpatialUnit::new("e", BoundingRect::new(10.0, 60.0, 12.0, 70.0));
    partition
        .add_element_to_detail_cell_with_bound(e.clone(), &e.bound, CellCoord::new(2, 0))
        .unwrap();
    assert_eq!(partition.detail_cell_bound(2, 0).unwrap(), e.bound);
    assert!(partition
        .add_element_to_detail_cell(d.clone(), CellCoord::new(4, 0))
        .is_err());

    let mut results = Vec::new();
    partition.fetch_coarse_cell(1, 0, &mut results, false).unwrap();
    let keys: HashSet<&str> = results.iter().map(|unit| unit.key.as_str()).collect();
    assert_eq!(keys, ["d", "e"].into_iter().collect());

    assert!(partition.remove_element(&c, cell).unwrap());
    assert!(!partition.remove_element(&c, cell).unwrap());
    assert_eq!(partition.len(), 4);
}
