//! End-to-end traversal scenarios against hand-assembled hierarchies.

mod common;

use common::*;
use glam::*;
use wide_bvh_stream::*;

// ============================================================================
// Scenes
// ============================================================================

struct TargetScene {
    bvh: WideBVH<4>,
    mesh: TriangleMesh,
    target: LeafRange,
    decoy: LeafRange
}

/// Two-level 4-wide hierarchy: target at z = 5 inside an internal child of the
/// root, decoy at z = 10 directly under the root, plus off-axis filler.
fn target_scene() -> TargetScene {
    let mut mesh = TriangleMesh::default();
    let target = mesh.push_leaf(&[triangle_at(Vec2::ZERO, 5.0, 1.0)]);
    let filler_a = mesh.push_leaf(&[triangle_at(Vec2::new(6.0, 6.0), 5.0, 1.0)]);
    let decoy = mesh.push_leaf(&[triangle_at(Vec2::ZERO, 10.0, 1.0)]);
    let filler_b = mesh.push_leaf(&[triangle_at(Vec2::new(-6.0, 4.0), 2.0, 1.0)]);

    let mut bvh = WideBVH::<4>::new();
    let inner = bvh.add_node(&[
        (target.into(), mesh.bounds(target)),
        (filler_a.into(), mesh.bounds(filler_a))
    ]).unwrap();
    let mut inner_bounds = mesh.bounds(target);
    inner_bounds.grow_aabb(&mesh.bounds(filler_a));

    let root = bvh.add_node(&[
        (inner, inner_bounds),
        (decoy.into(), mesh.bounds(decoy)),
        (filler_b.into(), mesh.bounds(filler_b))
    ]).unwrap();
    bvh.set_root(root).unwrap();

    TargetScene {
        bvh,
        mesh,
        target,
        decoy
    }
}

/// Root with a blocker at z = 3 in slot 0 and farther geometry behind it.
fn blocker_scene() -> (WideBVH<4>, TriangleMesh) {
    let mut mesh = TriangleMesh::default();
    let blocker = mesh.push_leaf(&[triangle_at(Vec2::ZERO, 3.0, 1.0)]);
    let far_a = mesh.push_leaf(&[triangle_at(Vec2::ZERO, 6.0, 1.0)]);
    let far_b = mesh.push_leaf(&[triangle_at(Vec2::ZERO, 8.0, 1.0)]);
    let far_c = mesh.push_leaf(&[triangle_at(Vec2::ZERO, 9.0, 1.0)]);

    let mut bvh = WideBVH::<4>::new();
    let nested = bvh.add_node(&[(far_c.into(), mesh.bounds(far_c))]).unwrap();
    let root = bvh.add_node(&[
        (blocker.into(), mesh.bounds(blocker)),
        (far_a.into(), mesh.bounds(far_a)),
        (far_b.into(), mesh.bounds(far_b)),
        (nested, mesh.bounds(far_c))
    ]).unwrap();
    bvh.set_root(root).unwrap();
    (bvh, mesh)
}

// ============================================================================
// Leaf reachability
// ============================================================================

#[test]
fn closest_hit_reaches_target_and_ignores_decoy() {
    init_logging();
    let scene = target_scene();
    let recorder = RecordingIntersector::new(&scene.mesh);
    let intersector = StreamIntersector::new(&scene.bvh, &recorder);

    let mut ray = Ray::new(&Vec3::ZERO, &Vec3::Z);
    let stats = intersector.intersect(&mut [&mut ray], TraversalFlags::none());

    assert!(ray.intersection.hit());
    assert_eq!(ray.intersection.prim, scene.target.first);
    assert_ne!(ray.intersection.prim, scene.decoy.first);
    assert!((ray.intersection.t - 5.0).abs() < 1e-5);
    assert!((ray.tfar - 5.0).abs() < 1e-5);
    assert_eq!(stats.nodes_visited, 2);
    assert_eq!(ray.intersection.heat, 2);

    // the target leaf is where the hit came from
    let entries = recorder.entries();
    assert_eq!(entries[0], (RayMask::single(0), RayMask::single(0)));
    assert!(entries[1..].iter().all(|(_, improved)| improved.is_empty()));
}

#[test]
fn single_ray_culls_farther_subtrees() {
    let scene = target_scene();
    let recorder = RecordingIntersector::new(&scene.mesh);
    let intersector = StreamIntersector::new(&scene.bvh, &recorder);

    let mut ray = Ray::new(&Vec3::ZERO, &Vec3::Z);
    intersector.intersect_single(&mut ray, TraversalFlags::none());

    assert_eq!(ray.intersection.prim, scene.target.first);
    assert!((ray.intersection.t - 5.0).abs() < 1e-5);
    assert_eq!(recorder.calls(), 1, "decoy entry lies beyond the hit and is skipped");
}

// ============================================================================
// Occlusion
// ============================================================================

#[test]
fn occlusion_stops_after_first_blocker() {
    let (bvh, mesh) = blocker_scene();
    let recorder = RecordingIntersector::new(&mesh);
    let intersector = StreamIntersector::new(&bvh, &recorder);

    let mut ray = Ray::new(&Vec3::ZERO, &Vec3::Z);
    intersector.occluded(&mut [&mut ray], TraversalFlags::none());

    assert!(ray.occluded);
    assert_eq!(recorder.calls(), 1);
}

#[test]
fn single_ray_occlusion_stops_after_first_blocker() {
    let (bvh, mesh) = blocker_scene();
    let recorder = RecordingIntersector::new(&mesh);
    let intersector = StreamIntersector::new(&bvh, &recorder);

    let mut ray = Ray::new(&Vec3::ZERO, &Vec3::Z);
    intersector.occluded_single(&mut ray, TraversalFlags::none());

    assert!(ray.occluded);
    assert_eq!(recorder.calls(), 1);
}

#[test]
fn occlusion_respects_tfar() {
    let (bvh, mesh) = blocker_scene();
    let intersector = StreamIntersector::new(&bvh, &mesh);

    let mut short = Ray::with_bounds(&Vec3::ZERO, &Vec3::Z, 0.0, 2.5);
    let mut long = Ray::with_bounds(&Vec3::ZERO, &Vec3::Z, 0.0, 3.5);
    intersector.occluded(&mut [&mut short, &mut long], TraversalFlags::none());

    assert!(!short.occluded);
    assert!(long.occluded);
}

#[test]
fn occluded_rays_never_reappear_in_later_masks() {
    let mut rng = seeded(11);
    let triangles = random_triangles(&mut rng, 160);
    let mut mesh = TriangleMesh::default();
    let bvh = assemble::<4>(&mut mesh, &triangles);
    let recorder = RecordingIntersector::new(&mesh);
    let intersector = StreamIntersector::new(&bvh, &recorder);

    let mut rays = random_rays(&mut rng, 64);
    let mut refs: Vec<&mut Ray> = rays.iter_mut().collect();
    intersector.occluded(&mut refs, TraversalFlags::none());

    let mut terminated = RayMask::EMPTY;
    for (active, blocked) in recorder.entries() {
        assert!(!active.is_empty());
        assert!((active & terminated).is_empty(), "terminated ray was tested again");
        assert_eq!(blocked & !active, RayMask::EMPTY);
        terminated |= blocked;
    }
    for (i, ray) in rays.iter().enumerate() {
        assert_eq!(ray.occluded, terminated.contains(i));
        assert_eq!(ray.occluded, brute_force_occluded(&triangles, ray));
    }
}

// ============================================================================
// Idempotence and no-op paths
// ============================================================================

#[test]
fn repeated_queries_give_identical_results() {
    let mut rng = seeded(5);
    let triangles = random_triangles(&mut rng, 120);
    let mut mesh = TriangleMesh::default();
    let bvh = assemble::<8>(&mut mesh, &triangles);
    let intersector = StreamIntersector::new(&bvh, &mesh);
    let rays = random_rays(&mut rng, 48);

    let mut first = rays.clone();
    let mut second = rays.clone();
    let stats_first = intersector.intersect(&mut first.iter_mut().collect::<Vec<_>>(), TraversalFlags::none());
    let stats_second = intersector.intersect(&mut second.iter_mut().collect::<Vec<_>>(), TraversalFlags::none());

    assert_eq!(stats_first, stats_second);
    for (a, b) in first.iter().zip(&second) {
        assert_eq!(a.intersection, b.intersection);
        assert_eq!(a.tfar.to_bits(), b.tfar.to_bits());
    }
}

#[test]
fn empty_and_terminated_streams_do_nothing() {
    let scene = target_scene();
    let recorder = RecordingIntersector::new(&scene.mesh);
    let intersector = StreamIntersector::new(&scene.bvh, &recorder);

    assert_eq!(intersector.intersect(&mut [], TraversalFlags::none()), TraversalStats::default());

    let mut done = Ray::with_bounds(&Vec3::ZERO, &Vec3::Z, 4.0, 1.0);
    let mut broken = Ray::new(&Vec3::new(f32::NAN, 0.0, 0.0), &Vec3::Z);
    let stats = intersector.intersect(&mut [&mut done, &mut broken], TraversalFlags::none());
    assert_eq!(stats, TraversalStats::default());
    let stats = intersector.occluded(&mut [&mut done, &mut broken], TraversalFlags::none());
    assert_eq!(stats, TraversalStats::default());
    assert_eq!(recorder.calls(), 0);
    assert!(!done.intersection.hit() && !done.occluded);
}

#[test]
fn empty_hierarchy_and_leaf_root() {
    let mesh = TriangleMesh::new(vec![triangle_at(Vec2::ZERO, 4.0, 1.0)]);

    let empty = WideBVH::<4>::new();
    let mut ray = Ray::new(&Vec3::ZERO, &Vec3::Z);
    StreamIntersector::new(&empty, &mesh).intersect(&mut [&mut ray], TraversalFlags::none());
    assert!(!ray.intersection.hit());

    let leaf_only = WideBVH::<4>::from_leaf(NodeRef::leaf(0, 1));
    let intersector = StreamIntersector::new(&leaf_only, &mesh);
    intersector.intersect(&mut [&mut ray], TraversalFlags::none());
    assert!((ray.intersection.t - 4.0).abs() < 1e-5);

    let mut single = Ray::new(&Vec3::ZERO, &Vec3::Z);
    intersector.intersect_single(&mut single, TraversalFlags::none());
    assert_eq!(single.intersection.prim, 0);
}

// ============================================================================
// Degenerate directions
// ============================================================================

#[test]
fn zero_direction_component_still_hits() {
    let mut mesh = TriangleMesh::default();
    let near = mesh.push_leaf(&[triangle_at(Vec2::new(0.0, 2.0), 5.0, 1.5)]);
    let side = mesh.push_leaf(&[triangle_at(Vec2::new(8.0, 2.0), 5.0, 1.5)]);
    let mut bvh = WideBVH::<4>::new();
    let root = bvh.add_node(&[(near.into(), mesh.bounds(near)), (side.into(), mesh.bounds(side))]).unwrap();
    bvh.set_root(root).unwrap();
    let intersector = StreamIntersector::new(&bvh, &mesh);

    let direction = Vec3::new(0.0, 2.0, 5.0).normalize();
    let mut positive_zero = Ray::new(&Vec3::ZERO, &direction);
    let mut negative_zero = Ray::new(&Vec3::ZERO, &Vec3::new(-0.0, direction.y, direction.z));
    let mut outside = Ray::new(&Vec3::new(4.0, 0.0, 0.0), &direction);
    intersector.intersect(&mut [&mut positive_zero, &mut negative_zero, &mut outside], TraversalFlags::none());

    let expected = Vec3::new(0.0, 2.0, 5.0).length();
    for ray in [&positive_zero, &negative_zero] {
        assert_eq!(ray.intersection.prim, near.first);
        assert!((ray.intersection.t - expected).abs() < 1e-4);
        assert!(ray.intersection.t.is_finite());
    }
    assert!(!outside.intersection.hit(), "parallel to the x slab and outside it");
}

// ============================================================================
// Flags
// ============================================================================

#[test]
fn cull_flag_reaches_the_primitive_intersector() {
    let mut mesh = TriangleMesh::default();
    let triangle = triangle_at(Vec2::ZERO, 5.0, 1.0);
    let leaf = mesh.push_leaf(&[Triangle::new(&triangle.p0, &triangle.p2, &triangle.p1)]);
    let bvh = WideBVH::<4>::from_leaf(leaf.into());
    let intersector = StreamIntersector::new(&bvh, &mesh);

    let mut culled = Ray::new(&Vec3::ZERO, &Vec3::Z);
    let mut kept = Ray::new(&Vec3::ZERO, &Vec3::Z);
    intersector.intersect(&mut [&mut culled], TraversalFlags::CullBackfaces);
    intersector.intersect(&mut [&mut kept], TraversalFlags::none());

    assert!(!culled.intersection.hit());
    assert!(kept.intersection.hit());
}
