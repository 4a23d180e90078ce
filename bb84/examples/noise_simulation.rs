use bb84::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("BB84 Protocol with Noise Simulation");

    let metrics = collect_metrics_thread_rng(200, 64)?;

    println!("  {:>10}  {:>10}", "Noise (%)", "Mean QBER");
    for (level, qber) in metrics.noise.levels.iter().zip(&metrics.noise.mean_qber) {
        let marker = if *qber > QBER_THRESHOLD { "  above threshold" } else { "" };
        println!("  {:>10.2}  {:>10.4}{}", level * 100.0, qber, marker);
    }
    Ok(())
}
