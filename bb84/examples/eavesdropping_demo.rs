use bb84::prelude::*;
use rand::thread_rng;

fn main() {
    println!("BB84 Eavesdropping Sweep");

    let mut rng = thread_rng();
    let range = SweepRange::new(0.0, 1.0, 11);
    let series = sweep_eavesdropper(&range, 200, 64, &ProtocolConfig::default(), &mut rng);
    let rates = series.mean_detection_rate.unwrap_or_default();

    println!("  {:>10}  {:>10}  {:>14}", "Eve (%)", "Mean QBER", "Detection rate");
    for ((level, qber), rate) in series.levels.iter().zip(&series.mean_qber).zip(&rates) {
        println!("  {:>10.1}  {:>10.4}  {:>14.2}", level * 100.0, qber, rate);
    }
}
