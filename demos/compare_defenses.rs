//! Compare the defense family under a Gaussian poisoning attack.

use aegis_fl::aggregators::{RoundContext, Strategy, StrategyConfig};
use aegis_fl::attacks::Attack;
use aegis_fl::HistoryStore;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() {
    env_logger::init();
    println!("Comparing Aggregation Strategies\n");
    println!("Scenario: 8 honest clients (value=1.0), 2 poisoned (Gaussian, magnitude 10)\n");

    // Setup: 10 clients, indexes 0-1 malicious
    let mut updates = vec![vec![1.0f32; 16]; 10];
    let weights = vec![1.0f32; 10];
    let malicious = [0usize, 1];

    let mut rng = StdRng::seed_from_u64(42);
    Attack::Gaussian { magnitude: 10.0 }
        .apply(&mut updates, &malicious, &mut rng)
        .unwrap();

    let cfg = StrategyConfig {
        num_malicious: 2,
        trim_fraction: 0.2,
        niters: 3,
        ..StrategyConfig::default()
    };
    let history = HistoryStore::in_memory();

    for name in ["fedavg", "trimmedmean", "fedmedian", "krum", "bulyan", "dnc"] {
        let strategy = Strategy::from_name(name, &cfg).unwrap();
        let mut ctx = RoundContext {
            history: &history,
            malicious: &malicious,
            rng: &mut rng,
        };
        let result = strategy.aggregate(&updates, &weights, &mut ctx).unwrap();
        let rms = (result
            .params
            .iter()
            .map(|&x| (x - 1.0) * (x - 1.0))
            .sum::<f32>()
            / result.params.len() as f32)
            .sqrt();

        let status = if rms < 0.5 { "ROBUST" } else { "CORRUPTED" };

        println!("{:<14} RMS deviation: {:>8.3}  {}", name, rms, status);
    }

    println!("\nEvery defense holds the honest value; FedAvg absorbs the poison.");
}
