use std::collections::VecDeque;

use rand::Rng;

#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub state: Vec<f32>,
    pub action: Vec<f32>,
    pub reward: f32,
    pub next_state: Vec<f32>,
    /// 真正的终止（非截断）
    pub done: bool,
}

/// Minibatch flattened row by row, ready to be turned into tensors.
#[derive(Debug, Default)]
pub struct Batch {
    pub states: Vec<f32>,
    pub actions: Vec<f32>,
    pub rewards: Vec<f32>,
    pub next_states: Vec<f32>,
    /// 1.0 - done
    pub not_dones: Vec<f32>,
    pub len: usize,
}

/// FIFO buffer: the oldest transition is dropped once `capacity` is reached.
pub struct ReplayBuffer {
    memory: VecDeque<Transition>,
    capacity: usize,
}

impl ReplayBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            memory: VecDeque::with_capacity(capacity.min(1 << 16)),
            capacity: capacity.max(1),
        }
    }

    pub fn push(&mut self, transition: Transition) {
        if self.memory.len() >= self.capacity {
            self.memory.pop_front();
        }
        self.memory.push_back(transition);
    }

    pub fn len(&self) -> usize {
        self.memory.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// 有放回的均匀采样
    pub fn sample<R: Rng>(&self, batch_size: usize, rng: &mut R) -> Batch {
        let mut batch = Batch::default();
        if self.memory.is_empty() {
            return batch;
        }
        for _ in 0..batch_size {
            let t = &self.memory[rng.random_range(0..self.memory.len())];
            batch.states.extend_from_slice(&t.state);
            batch.actions.extend_from_slice(&t.action);
            batch.rewards.push(t.reward);
            batch.next_states.extend_from_slice(&t.next_state);
            batch.not_dones.push(if t.done { 0.0 } else { 1.0 });
        }
        batch.len = batch_size;
        batch
    }
}
