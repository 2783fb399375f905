//! End-to-end collision scenarios against small hand-built worlds.

use approx::assert_relative_eq;
use blockworld_core::{BlockType, VoxelCoord};
use blockworld_physics::{
    BlockSolidityTable, CollisionDetector, CollisionResolver, OtherPlayer, PhysicsConfig,
    CONTACT_SKIN,
};
use blockworld_world::World;
use glam::Vec3;

fn build(
    config: &PhysicsConfig,
    blocks: &[(VoxelCoord, BlockType)],
) -> (CollisionDetector, CollisionResolver) {
    let table = BlockSolidityTable::from_config(config);
    let mut world = World::new();
    for &(coord, block_type) in blocks {
        world.insert(coord, table.create_block_data(block_type, None, None));
    }
    (
        CollisionDetector::new(world.into_shared(), config),
        CollisionResolver::new(config),
    )
}

fn water_plane(config: &PhysicsConfig) -> (CollisionDetector, CollisionResolver) {
    let table = BlockSolidityTable::from_config(config);
    let mut world = World::new();
    world.fill(
        VoxelCoord::new(0, 15, 0),
        VoxelCoord::new(30, 15, 30),
        &table.create_block_data(BlockType::Water, Some("lake".into()), None),
    );
    (
        CollisionDetector::new(world.into_shared(), config),
        CollisionResolver::new(config),
    )
}

#[test]
fn standing_above_a_stone_block() {
    let config = PhysicsConfig::default();
    let (detector, _) = build(&config, &[(VoxelCoord::new(10, 10, 10), BlockType::Stone)]);

    assert!(!detector.check_block_collision(Vec3::new(10.0, 10.9, 10.0)));
    assert!(detector.check_block_collision(Vec3::new(10.0, 10.5, 10.0)));
}

#[test]
fn air_block_is_never_solid() {
    let config = PhysicsConfig::default();
    let (detector, resolver) = build(&config, &[(VoxelCoord::new(10, 10, 10), BlockType::Air)]);

    for y in [8.4, 9.0, 9.5, 10.0, 10.5] {
        assert!(!detector.check_collision(Vec3::new(10.0, y, 10.0), None));
    }
    let old = Vec3::new(10.0, 12.0, 10.0);
    let new = Vec3::new(10.0, 9.0, 10.0);
    assert_eq!(resolver.resolve_collision(&detector, old, new).0, new);
}

#[test]
fn world_edge_clamp_with_wide_body() {
    let config = PhysicsConfig::default()
        .with_world_dimensions(128, 64)
        .with_player_size(1.0, 1.8);
    let (detector, resolver) = build(&config, &[]);

    let (resolved, info) = resolver.resolve_collision(
        &detector,
        Vec3::new(64.0, 50.0, 64.0),
        Vec3::new(130.0, 50.0, 64.0),
    );
    assert_relative_eq!(resolved.x, 127.5);
    assert_eq!(resolved.y, 50.0);
    assert_eq!(resolved.z, 64.0);
    assert!(info.x);
}

#[test]
fn water_passable_when_policy_disabled() {
    let config = PhysicsConfig::default().with_water_collision(false);
    let (detector, resolver) = water_plane(&config);

    let old = Vec3::new(10.0, 20.0, 10.0);
    let new = Vec3::new(10.0, 12.0, 10.0);
    let (resolved, info) = resolver.resolve_collision(&detector, old, new);
    assert_eq!(resolved.y, 12.0);
    assert!(!info.y);

    let (resolved, info) = resolver.resolve_movement(&detector, old, new, &[]);
    assert_eq!(resolved.y, 12.0);
    assert!(!info.y);
}

#[test]
fn water_stops_fall_when_policy_enabled() {
    let config = PhysicsConfig::default().with_water_collision(true);
    let (detector, resolver) = water_plane(&config);

    let old = Vec3::new(10.0, 20.0, 10.0);
    let new = Vec3::new(10.0, 12.0, 10.0);
    let (resolved, info) = resolver.resolve_movement(&detector, old, new, &[]);
    assert!(info.y);
    assert_relative_eq!(resolved.y, 15.5 + CONTACT_SKIN, epsilon = 1e-4);
    assert!(!detector.check_block_collision(resolved));

    // The plain resolver keeps the old height instead of settling.
    let (resolved, info) = resolver.resolve_collision(&detector, old, new);
    assert!(info.y);
    assert_eq!(resolved, old);
}

#[test]
fn water_policy_change_applies_to_existing_world() {
    let config = PhysicsConfig::default().with_water_collision(true);
    let (detector, resolver) = water_plane(&config);
    let old = Vec3::new(10.0, 20.0, 10.0);
    let new = Vec3::new(10.0, 12.0, 10.0);

    let mut table = BlockSolidityTable::from_config(&config);
    table.set_water_collision(false);
    let changed = table.apply_to(&mut detector.world().write());
    assert_eq!(changed, 31 * 31);

    let (resolved, info) = resolver.resolve_collision(&detector, old, new);
    assert_eq!(resolved, new);
    assert!(!info.y);
}

#[test]
fn player_overlap_by_distance() {
    let config = PhysicsConfig::default().with_player_size(0.8, 1.8);
    let (detector, _) = build(&config, &[]);
    let me = Vec3::new(10.0, 10.0, 10.0);

    let near = OtherPlayer::new(Vec3::new(10.5, 10.0, 10.0), 0.4, 1.8);
    let far = OtherPlayer::new(Vec3::new(20.0, 10.0, 10.0), 0.4, 1.8);
    assert!(detector.check_player_collision(me, &[near]));
    assert!(!detector.check_player_collision(me, &[far]));
    assert!(detector.check_collision(me, Some(&[far, near])));
}

#[test]
fn block_placed_between_queries_is_seen() {
    let config = PhysicsConfig::default();
    let (detector, resolver) = build(&config, &[]);
    let old = Vec3::new(5.0, 5.0, 5.0);
    let new = Vec3::new(7.0, 5.0, 5.0);
    assert_eq!(resolver.resolve_collision(&detector, old, new).0, new);

    let table = BlockSolidityTable::from_config(&config);
    detector
        .world()
        .write()
        .insert(
            VoxelCoord::new(6, 5, 5),
            table.create_block_data(BlockType::Dirt, None, None),
        );

    let (resolved, info) = resolver.resolve_collision(&detector, old, new);
    assert!(info.x);
    assert_eq!(resolved, old);
}
