use std::collections::VecDeque;

use glam::*;
use wide_bvh_stream::*;

const GRID: usize = 64;
const WIDTH: usize = 256;
const HEIGHT: usize = 256;
const FRAMES: usize = 20;

/// Grid of small triangles on the z = 10 plane, one triangle per leaf.
fn build_scene() -> Result<(WideBVH<4>, TriangleMesh), HierarchyError> {
    let mut mesh = TriangleMesh::default();
    let mut level = Vec::with_capacity(GRID * GRID);
    for x in 0..GRID {
        for y in 0..GRID {
            let p = Vec3::new(x as f32 - GRID as f32 * 0.5, y as f32 - GRID as f32 * 0.5, 10.0);
            let leaf = mesh.push_leaf(&[Triangle::new(&p, &(p + Vec3::X * 0.9), &(p + Vec3::Y * 0.9))]);
            level.push((NodeRef::from(leaf), mesh.bounds(leaf)));
        }
    }

    let mut bvh = WideBVH::<4>::new();
    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len() / 4 + 1);
        for group in level.chunks(4) {
            let mut bounds = AABB::default();
            for (_, child_bounds) in group {
                bounds.grow_aabb(child_bounds);
            }
            next.push((bvh.add_node(group)?, bounds));
        }
        level = next;
    }
    bvh.set_root(level[0].0)?;

    Ok((bvh, mesh))
}

fn main() {
    let (bvh, mesh) = match build_scene() {
        Ok(scene) => scene,
        Err(err) => {
            eprintln!("failed to assemble scene: {}", err);
            return;
        }
    };
    let intersector = StreamIntersector::new(&bvh, &mesh);

    let mut last_dts = VecDeque::new();
    for _ in 0..FRAMES {
        let mut rays = Vec::with_capacity(WIDTH * HEIGHT);
        for y in 0..HEIGHT {
            for x in 0..WIDTH {
                let uv = Vec2::new(x as f32 / WIDTH as f32, y as f32 / HEIGHT as f32) * 2.0 - 1.0;
                rays.push(Ray::new(&Vec3::ZERO, &Vec3::new(uv.x * 3.0, uv.y * 3.0, 1.0).normalize()));
            }
        }

        let timer = Timer::new();
        let stats = intersector.par_intersect_stream(&mut rays, TraversalFlags::Coherent);
        let dt = timer.elapsed() as f32;

        if last_dts.len() >= 10 { last_dts.pop_front(); }
        last_dts.push_back(dt);
        let avg = last_dts.iter().sum::<f32>() / last_dts.len() as f32;

        let hits = rays.iter().filter(|ray| ray.intersection.hit()).count();
        println!("ms: {:.2}, hits: {}, nodes: {}, leaves: {}", avg * 1000.0, hits, stats.nodes_visited, stats.leaves_visited);
    }
}
