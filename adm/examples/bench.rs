use adm::{compute_adm_with_arena, AdmParams, Plane, ScratchArena};
use std::time::Instant;

fn main() {
    let width = 1920;
    let height = 1080;

    // Gradient reference with a small periodic distortion
    let reference = Plane::from_fn(width, height, |x, y| {
        (x as f32 / width as f32) * 200.0 + ((x * 7 + y * 3) % 23) as f32
    });
    let distorted = Plane::from_fn(width, height, |x, y| {
        reference.get(x, y) + ((x * y) % 10) as f32 * 0.5
    });

    let params = AdmParams::default();
    let mut arena = match ScratchArena::new(width, height) {
        Ok(arena) => arena,
        Err(e) => {
            eprintln!("failed to allocate arena: {e}");
            return;
        }
    };
    println!(
        "arena: {:.1} MiB",
        arena.layout().total_bytes() as f64 / (1024.0 * 1024.0)
    );

    // Warmup
    let _ = compute_adm_with_arena(reference.as_view(), distorted.as_view(), &params, &mut arena);

    // Benchmark
    let iterations = 10;
    let start = Instant::now();
    let mut score = 0.0;
    for _ in 0..iterations {
        if let Ok(result) =
            compute_adm_with_arena(reference.as_view(), distorted.as_view(), &params, &mut arena)
        {
            score = result.score;
        }
    }
    let elapsed = start.elapsed();

    println!(
        "{}x{} frame: {:.2}ms per iteration ({} iterations, total {:.2}s, score {:.4})",
        width,
        height,
        elapsed.as_secs_f64() * 1000.0 / iterations as f64,
        iterations,
        elapsed.as_secs_f64(),
        score
    );
}
