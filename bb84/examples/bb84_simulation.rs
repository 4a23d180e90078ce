use bb84::prelude::*;

fn bits(key: &[Bit]) -> String {
    key.iter().map(|b| b.to_string()).collect()
}

fn main() {
    let params = RunParameters::new(32, 0.02, 0.1);

    println!("BB84 Protocol Simulation");
    println!(
        "Qubits: {}, noise: {}, eavesdropper: {}",
        params.qubit_count, params.noise_probability, params.eavesdropper_probability
    );
    println!(
        "Effective flip probability: {:.3}",
        effective_flip_probability(&params, &ProtocolConfig::default())
    );

    let result = simulate_thread_rng(&params);

    println!("Alice's sifted key: {}", bits(&result.sender_sifted_key));
    println!("Bob's sifted key:   {}", bits(&result.receiver_sifted_key));
    println!("Sifted length: {}", result.sifted_length);
    println!("Estimated QBER: {:.4}", result.qber);
    println!("Eavesdropping detected: {}", result.eavesdropper_detected);

    if result.key_length == 0 {
        println!("Key not established");
    } else {
        println!("Final key ({} bits): {}", result.key_length, bits(&result.sender_final_key));
    }
}
