// Copyright 2025 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::{Point, Size};
use trellis_tree::{LocalRect, NodeId};
use trellis_ui::clip::{ClipTarget, RectMask2D};
use trellis_ui::{Canvas, Scene};

/// `masks` side-by-side rect masks, each over `per_mask` targets of which
/// roughly half fall outside the mask.
fn build(masks: usize, per_mask: usize) -> (Scene, Vec<NodeId>) {
    let mut scene = Scene::default();
    let root = scene.create_node(None, LocalRect::sized(4000.0, 4000.0));
    scene.add_component(root, Canvas::new());
    let mut mask_nodes = Vec::with_capacity(masks);
    for m in 0..masks {
        let mask = scene.create_node(
            Some(root),
            LocalRect::new(Point::new(m as f64 * 60.0, 0.0), Size::new(50.0, 50.0)),
        );
        scene.add_component(mask, RectMask2D::new());
        for t in 0..per_mask {
            let target = scene.create_node(
                Some(mask),
                LocalRect::new(Point::new(0.0, t as f64 * 5.0), Size::new(10.0, 4.0)),
            );
            scene.add_component(target, ClipTarget::new());
        }
        mask_nodes.push(mask);
    }
    scene.update();
    (scene, mask_nodes)
}

fn bench_cull(c: &mut Criterion) {
    let mut group = c.benchmark_group("cull");
    for &(masks, per_mask) in &[(16usize, 16usize), (64, 32), (128, 64)] {
        let (mut scene, mask_nodes) = build(masks, per_mask);
        group.throughput(Throughput::Elements((masks * per_mask) as u64));
        group.bench_function(format!("steady_m{masks}_t{per_mask}"), |b| {
            b.iter(|| {
                scene.update();
                black_box(scene.clipper_registry().len());
            });
        });
        let mut shifted = false;
        group.bench_function(format!("moving_masks_m{masks}_t{per_mask}"), |b| {
            b.iter(|| {
                shifted = !shifted;
                let dy = if shifted { 7.0 } else { 0.0 };
                for (m, &mask) in mask_nodes.iter().enumerate() {
                    scene.set_position(mask, Point::new(m as f64 * 60.0, dy));
                }
                scene.update();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_cull);
criterion_main!(benches);
