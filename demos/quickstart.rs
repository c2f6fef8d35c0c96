//! Quickstart example: a poisoned round, defended and undefended.

use aegis_fl::{fedavg, multi_krum};

fn main() {
    env_logger::init();
    println!("Aegis-FL Quickstart Demo\n");

    println!("Simulating 10 clients (8 honest, 2 poisoned)...\n");

    // 8 honest clients with similar updates
    let mut updates = vec![vec![1.0, 2.0, 3.0]; 8];

    // 2 poisoned clients with extreme values
    updates.push(vec![100.0, 200.0, 300.0]);
    updates.push(vec![100.0, 200.0, 300.0]);

    let weights = vec![1.0f32; 10];

    let naive = fedavg(&updates, Some(&weights)).unwrap();
    println!("FedAvg (no defense):   {:?}", naive);

    let robust = multi_krum(&updates, &weights, 2, 7).unwrap();
    println!("Multi-Krum (f=2, k=7): {:?}", robust.params);
    println!("Kept clients:          {:?}", robust.kept);

    println!("\nExpected (honest mean): [1.0, 2.0, 3.0]");
    println!("Poisoned clients successfully excluded by Krum!");
}
