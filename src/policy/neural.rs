//! [`Policy`] adapter over a trained [`ActorCritic`].

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::error::PolicyError;
use super::network::ActorCritic;
use super::trait_::Policy;
use crate::env::Observation;

/// Drives an environment with an actor-critic network.
///
/// In greedy mode the most probable action is taken; otherwise actions are
/// sampled from the actor's distribution using the policy's own RNG.
pub struct NeuralPolicy<'a> {
    network: &'a ActorCritic,
    greedy: bool,
    rng: StdRng,
}

impl<'a> NeuralPolicy<'a> {
    /// Creates a sampling policy.
    pub fn sampling(network: &'a ActorCritic, seed: u64) -> Self {
        Self {
            network,
            greedy: false,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Creates a policy that always takes the most probable action.
    pub fn greedy(network: &'a ActorCritic) -> Self {
        Self {
            network,
            greedy: true,
            rng: StdRng::seed_from_u64(0),
        }
    }

    pub fn is_greedy(&self) -> bool {
        self.greedy
    }
}

impl Policy for NeuralPolicy<'_> {
    fn select_action(&mut self, observation: &Observation) -> Result<usize, PolicyError> {
        if self.greedy {
            self.network.act_greedy(observation)
        } else {
            Ok(self.network.act(observation, &mut self.rng)?.action)
        }
    }

    fn name(&self) -> &str {
        if self.greedy {
            "neural_greedy"
        } else {
            "neural"
        }
    }
}
