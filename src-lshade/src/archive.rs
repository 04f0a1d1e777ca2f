//! Bounded pool of displaced parents.
//!
//! Parents beaten by their trial are copied here and serve as extra donors
//! for the second difference vector of current-to-pbest mutation.

use ndarray::{Array1, ArrayView1};
use rand::Rng;
use rand::seq::index;

#[derive(Debug, Clone, Default)]
pub struct Archive {
    members: Vec<Array1<f64>>,
}

impl Archive {
    pub fn new() -> Self {
        Self { members: Vec::new() }
    }

    /// Append a copy of a displaced parent.
    pub fn record_displaced(&mut self, individual: ArrayView1<'_, f64>) {
        self.members.push(individual.to_owned());
    }

    /// Keep at most `capacity` members, chosen uniformly without replacement.
    pub fn enforce_capacity<R: Rng + ?Sized>(&mut self, capacity: usize, rng: &mut R) {
        if self.members.len() <= capacity {
            return;
        }
        let mut current = std::mem::take(&mut self.members);
        let picked = index::sample(rng, current.len(), capacity);
        self.members = picked.into_iter().map(|i| std::mem::take(&mut current[i])).collect();
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn members(&self) -> &[Array1<f64>] {
        &self.members
    }
}
