// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Size;
use trellis_tree::{LocalRect, NodeId};
use trellis_ui::Scene;
use trellis_ui::layout::{GridLayoutGroup, HorizontalOrVerticalLayoutGroup, ManualLayoutElement};

/// A column of `rows` rows, each holding `cols` fixed-size leaves.
fn build_rows(rows: usize, cols: usize) -> (Scene, NodeId) {
    let mut scene = Scene::default();
    let root = scene.create_node(None, LocalRect::sized(1000.0, 1000.0));
    scene.add_component(root, HorizontalOrVerticalLayoutGroup::vertical());
    for _ in 0..rows {
        let row = scene.create_node(Some(root), LocalRect::default());
        let mut group = HorizontalOrVerticalLayoutGroup::horizontal();
        group.spacing = 2.0;
        group.child_force_expand_width = false;
        scene.add_component(row, group);
        for _ in 0..cols {
            let leaf = scene.create_node(Some(row), LocalRect::default());
            scene.add_component(leaf, ManualLayoutElement::new().with_preferred(10.0, 8.0));
        }
    }
    scene.update();
    (scene, root)
}

fn bench_rows(c: &mut Criterion) {
    let mut group = c.benchmark_group("rows");
    for &n in &[8usize, 32, 64] {
        let (mut scene, root) = build_rows(n, n);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("force_rebuild_n{n}"), |b| {
            b.iter(|| {
                scene.force_rebuild_layout_immediate(root);
                black_box(scene.tree().size(root));
            });
        });
        let mut wide = false;
        group.bench_function(format!("resize_update_n{n}"), |b| {
            b.iter(|| {
                wide = !wide;
                let width = if wide { 1200.0 } else { 1000.0 };
                scene.set_size(root, Size::new(width, 1000.0));
                scene.update();
            });
        });
    }
    group.finish();
}

fn bench_grid(c: &mut Criterion) {
    let mut group = c.benchmark_group("grid");
    for &n in &[64usize, 256, 1024] {
        let mut scene = Scene::default();
        let root = scene.create_node(None, LocalRect::sized(800.0, 600.0));
        let mut grid = GridLayoutGroup::new();
        grid.cell_size = Size::new(20.0, 20.0);
        scene.add_component(root, grid);
        for _ in 0..n {
            scene.create_node(Some(root), LocalRect::default());
        }
        scene.update();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("force_rebuild_n{n}"), |b| {
            b.iter(|| {
                scene.force_rebuild_layout_immediate(root);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_rows, bench_grid);
criterion_main!(benches);
