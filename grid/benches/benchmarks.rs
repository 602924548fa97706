use criterion::{black_box, criterion_group, criterion_main, Criterion};
use grid::grid::{CellCoord, HierarchicalIndex, Spatial2D};
use grid::shapes::BoundingRect;
use grid::GridConfig;
use rand::prelude::*;

#[derive(Clone, Copy, Debug)]
struct Entity {
    id: u32,
    bound: BoundingRect,
}

impl PartialEq for Entity {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Spatial2D for Entity {
    fn priority(&self) -> i32 {
        0
    }

    fn rect_bound(&self) -> BoundingRect {
        self.bound
    }

    fn set_rect_bound(&mut self, bound: BoundingRect) {
        self.bound = bound;
    }
}

fn world() -> BoundingRect {
    BoundingRect::new(0.0, 0.0, 100.0, 100.0)
}

fn new_index() -> HierarchicalIndex<Entity> {
    HierarchicalIndex::new(world(), GridConfig::default()).unwrap()
}

fn random_entity(rng: &mut ThreadRng, id: u32) -> Entity {
    Entity {
        id,
        bound: BoundingRect::from_center_size(
            rng.gen_range(0.0..100.0),
            rng.gen_range(0.0..100.0),
            5.0,
            5.0,
        ),
    }
}

fn filled_index(rng: &mut ThreadRng) -> (HierarchicalIndex<Entity>, Vec<(Entity, CellCoord)>) {
    let mut index = new_index();
    let mut items = Vec::new();
    for id in 0..1000 {
        let entity = random_entity(rng, id);
        let cell = index.insert(entity, &entity.bound).unwrap();
        items.push((entity, cell));
    }
    (index, items)
}

fn insert_benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let mut index = new_index();
    let mut id = 0;

    c.bench_function("grid_insert", |b| {
        b.iter(|| {
            let entity = random_entity(&mut rng, id);
            id += 1;
            let _ = index.insert(black_box(entity), &entity.bound);
        })
    });
}

fn remove_benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let (mut index, mut items) = filled_index(&mut rng);

    c.bench_function("grid_remove_reinsert", |b| {
        b.iter(|| {
            let slot = rng.gen_range(0..items.len());
            let (entity, cell) = items[slot];
            let _ = index.remove(black_box(&entity), cell.row, cell.col);
            if let Ok(cell) = index.insert(entity, &entity.bound) {
                items[slot].1 = cell;
            }
        })
    });
}

fn update_benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let (mut index, items) = filled_index(&mut rng);

    c.bench_function("grid_update_bound", |b| {
        b.iter(|| {
            let (entity, cell) = items[rng.gen_range(0..items.len())];
            let grown = BoundingRect::from_center_size(
                entity.bound.center().x,
                entity.bound.center().y,
                rng.gen_range(1.0..6.0),
                rng.gen_range(1.0..6.0),
            );
            let _ = index.update_element_bound(&entity, black_box(grown), cell.row, cell.col);
        })
    });
}

fn query_benchmark(c: &mut Criterion) {
    let mut rng = rand::thread_rng();
    let (index, _) = filled_index(&mut rng);
    let query_rect = BoundingRect::new(40.0, 40.0, 60.0, 60.0);
    let mut scratch = index.scratch();

    c.bench_function("grid_query", |b| {
        b.iter(|| {
            let mut results = Vec::new();
            index.query(black_box(&query_rect), &mut scratch, &mut results);
            results.len()
        })
    });
}

criterion_group!(
    grid_benchmarks,
    insert_benchmark,
    remove_benchmark,
    update_benchmark,
    query_benchmark
);
criterion_main!(grid_benchmarks);
