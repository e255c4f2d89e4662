// recycle_pool demo binary
// Pools particle effects the way a game loop would.
//
// Run with: RUST_LOG=recycle_pool=trace cargo run --features demo

use recycle_pool::{ObjectPool, PoolConfiguration, PoolResult};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Particle {
    visible: bool,
    position: (f32, f32),
    ttl: u32,
}

fn main() -> PoolResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== recycle_pool demo ===");

    let config = PoolConfiguration::new().with_name("particles").with_preload(4);
    let mut pool = ObjectPool::builder()
        .config(config)
        .factory(Particle::default)
        .on_acquire(|p: &mut Particle| p.visible = true)
        .on_release(|p: &mut Particle| *p = Particle::default())
        .build()?;

    let mut live = Vec::new();
    for frame in 0..6u32 {
        let handle = pool.acquire()?;
        if let Some(particle) = pool.get_mut(handle) {
            particle.position = (frame as f32, 0.0);
            particle.ttl = 2;
        }
        live.push(handle);

        let mut expired = Vec::new();
        live.retain(|&h| {
            let done = pool.get_mut(h).map(|p| {
                p.ttl -= 1;
                p.ttl == 0
            });
            if done == Some(true) {
                expired.push(h);
                false
            } else {
                true
            }
        });
        for handle in expired {
            pool.release(handle)?;
        }

        println!(
            "  frame {frame}: active={} idle={} size={}",
            pool.active_count(),
            pool.idle_count(),
            pool.pool_size()
        );
    }

    let released = pool.release_all_active()?;
    println!("  released {released} at shutdown");

    for (key, value) in pool.metrics().export() {
        println!("  {key}: {value}");
    }
    Ok(())
}
