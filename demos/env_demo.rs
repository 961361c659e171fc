// Demonstration: run the deployment environment and evaluate a baseline policy.
//
// Run from the repo root:
//   cargo run --example env_demo -- --policy least_loaded --episodes 50

use std::env;

use deploy_ppo::env::{DeploymentEnv, EnvConfig};
use deploy_ppo::metrics::EvaluationMetrics;
use deploy_ppo::policy::{LeastLoadedPolicy, Policy, RandomPolicy};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().collect();
    let policy_name = arg_value(&args, "--policy").unwrap_or("least_loaded");
    let episodes: usize = arg_value(&args, "--episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(25);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let config = EnvConfig::default();
    let mut env = match DeploymentEnv::new(config.clone(), seed) {
        Ok(env) => env,
        Err(e) => {
            eprintln!("Invalid environment configuration: {}", e);
            std::process::exit(2);
        }
    };

    let mut policy: Box<dyn Policy> = match policy_name {
        "random" => Box::new(RandomPolicy::new(config.action_dim(), seed)),
        "least_loaded" => Box::new(LeastLoadedPolicy::new(config.num_nodes)),
        other => {
            eprintln!(
                "Unknown --policy '{}'; expected 'least_loaded' or 'random'.",
                other
            );
            std::process::exit(2);
        }
    };

    match EvaluationMetrics::evaluate(&mut env, policy.as_mut(), episodes) {
        Ok(metrics) => {
            println!("Policy: {}", policy.name());
            println!("{}", metrics);
        }
        Err(e) => {
            eprintln!("Evaluation failed: {}", e);
            std::process::exit(1);
        }
    }
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
