//! Example demonstrating a `PoolRegistry` serving projectiles for a game loop.
//!
//! Shows placement on acquire, feature queries and bulk release at a level boundary.

use std::any::Any;

use keyed_pool::{
    ConstructionError, Features, Place, PlacementError, PoolConfig, PoolError, PoolRegistry,
};

#[derive(Debug, Default)]
struct Projectile {
    position: (f32, f32),
    heading: f32,
    damage: u32,
}

impl Place<((f32, f32), f32)> for Projectile {
    fn place(&mut self, (position, heading): ((f32, f32), f32)) -> Result<(), PlacementError> {
        if !heading.is_finite() {
            return Err(PlacementError::new("heading must be finite"));
        }

        self.position = position;
        self.heading = heading;
        Ok(())
    }
}

impl Features for Projectile {
    fn feature(&self, id: &str) -> Option<&dyn Any> {
        match id {
            "damage" => Some(&self.damage),
            _ => None,
        }
    }

    fn feature_mut(&mut self, id: &str) -> Option<&mut dyn Any> {
        match id {
            "damage" => Some(&mut self.damage),
            _ => None,
        }
    }
}

fn new_projectile(key: &&'static str) -> Result<Projectile, ConstructionError> {
    let damage = match *key {
        "bullet" => 5,
        "rocket" => 50,
        _ => return Err(ConstructionError::new(format!("no projectile type {key}"))),
    };

    Ok(Projectile {
        damage,
        ..Projectile::default()
    })
}

fn main() {
    println!("=== PoolRegistry: projectiles ===");

    let registry = PoolRegistry::initialize([
        PoolConfig::new("bullet", 8, new_projectile),
        PoolConfig::new("rocket", 0, new_projectile),
    ])
    .expect("projectile pools are valid");

    // Fire a burst of bullets from the origin.
    let burst = (0_u8..10)
        .map(|i| {
            registry
                .acquire_at("bullet", ((0.0, 0.0), f32::from(i) * 36.0))
                .expect("bullets are always available")
        })
        .collect::<Vec<_>>();

    let stats = registry.stats("bullet").expect("bullet pool exists");
    println!(
        "Bullets: {} slots, {} in use, grew {} times",
        stats.slots(),
        stats.in_use(),
        stats.growth_events()
    );

    // The rocket pool starts empty and builds its first instance on demand.
    let rocket = registry
        .acquire_at("rocket", ((5.0, 5.0), 90.0))
        .expect("rockets are always available");

    let (position, heading) = registry
        .with_instance(&rocket, |rocket| (rocket.position, rocket.heading))
        .expect("rocket handle is valid");
    println!("Rocket launched at {position:?} heading {heading}");

    let damage = registry
        .with_feature(&rocket, "damage", |damage| {
            damage.downcast_ref::<u32>().copied()
        })
        .expect("rockets have damage");
    println!("Rocket damage: {damage:?}");

    match registry.with_feature(&rocket, "shield", |_| ()) {
        Err(PoolError::FeatureNotFound { feature }) => {
            println!("Rockets have no feature named '{feature}'");
        }
        other => println!("Unexpected result: {other:?}"),
    }

    // A bullet hits something and is returned to the pool.
    if let Some(hit) = burst.first() {
        registry.release(hit).expect("bullet handle is valid");
    }

    // Level transition: everything goes back to the pools.
    registry.release_all("bullet").expect("bullet pool exists");
    registry.release_all("rocket").expect("rocket pool exists");

    for key in registry.keys() {
        let stats = registry.stats(key).expect("registered key");
        println!("{key}: {} of {} slots free", stats.free(), stats.slots());
    }

    println!(
        "Old rocket handle still valid after reset: {}",
        registry.is_valid(&rocket)
    );
}
