// Demonstration: train a PPO policy, then compare it against the baselines.
//
// Run from the repo root:
//   RUST_LOG=info cargo run --release --example train_demo -- --timesteps 20000 --checkpoint-dir checkpoints

use std::env;
use std::path::PathBuf;

use deploy_ppo::env::{DeploymentEnv, EnvConfig};
use deploy_ppo::metrics::EvaluationMetrics;
use deploy_ppo::policy::{ActorCritic, LeastLoadedPolicy, NeuralPolicy, PolicyConfig, RandomPolicy};
use deploy_ppo::training::{PpoTrainer, Runner, RunnerConfig, TrainingConfig, TrainingError};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Training failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), TrainingError> {
    let args: Vec<String> = env::args().collect();
    let timesteps: usize = arg_value(&args, "--timesteps")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20_000);
    let seed: u64 = arg_value(&args, "--seed")
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);
    let eval_episodes: usize = arg_value(&args, "--eval-episodes")
        .and_then(|s| s.parse().ok())
        .unwrap_or(20);
    let checkpoint_dir = arg_value(&args, "--checkpoint-dir").map(PathBuf::from);

    let env_config = EnvConfig::default();
    let env = DeploymentEnv::new(env_config.clone(), seed)?;
    let policy = ActorCritic::new(
        env_config.observation_dim(),
        env_config.action_dim(),
        &PolicyConfig::default(),
        seed,
    )?;
    println!(
        "Observation dim: {}, action dim: {}, parameters: {}",
        policy.obs_dim(),
        policy.action_dim(),
        policy.num_parameters()
    );

    let trainer = PpoTrainer::new(policy, TrainingConfig::default(), seed)?;
    let runner_config = RunnerConfig {
        total_timesteps: timesteps,
        checkpoint_dir,
        ..RunnerConfig::default()
    };
    let mut runner = Runner::new(env, trainer, runner_config, seed)?;
    let report = runner.train()?;

    println!(
        "Trained for {} steps: {} episodes, {} updates",
        report.total_steps, report.episodes, report.updates
    );
    if let Some(mean) = report.recent_mean_reward(100) {
        println!("Average reward (last 100 episodes): {:.2}", mean);
    }

    // Evaluate against the baselines on a separate environment
    let trained = runner.into_trainer().into_policy();
    let mut eval_env = DeploymentEnv::new(env_config.clone(), seed.wrapping_add(1_000))?;

    let mut neural = NeuralPolicy::greedy(&trained);
    let mut random = RandomPolicy::new(env_config.action_dim(), seed);
    let mut heuristic = LeastLoadedPolicy::new(env_config.num_nodes);

    for (name, metrics) in [
        ("ppo (greedy)", EvaluationMetrics::evaluate(&mut eval_env, &mut neural, eval_episodes)?),
        ("random", EvaluationMetrics::evaluate(&mut eval_env, &mut random, eval_episodes)?),
        (
            "least_loaded",
            EvaluationMetrics::evaluate(&mut eval_env, &mut heuristic, eval_episodes)?,
        ),
    ] {
        println!("\nPolicy: {}", name);
        println!("{}", metrics);
    }
    Ok(())
}

fn arg_value<'a>(args: &'a [String], key: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == key)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}
