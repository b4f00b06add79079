use crate::bank::{Channel, ChannelSelector, TestBank};
use std::collections::{BTreeMap, VecDeque};
use tracing::debug;

/// Per-channel FIFO queues of banks awaiting execution.
///
/// Channels iterate in ascending id order, so draining every channel yields
/// the same sequence for the same queued state.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    queues: BTreeMap<Channel, VecDeque<TestBank>>,
}

impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `bank` behind any banks already waiting on its channel
    pub fn enqueue(&mut self, bank: TestBank) {
        debug!(
            context = %bank.context(),
            channel = %bank.channel(),
            tests = bank.count(),
            "Bank enqueued"
        );
        self.queues.entry(bank.channel()).or_default().push_back(bank);
    }

    /// Remove and return every bank queued on the selected channel(s), in
    /// enqueue order. Unknown channels drain to an empty list.
    pub fn drain(&mut self, selector: impl Into<ChannelSelector>) -> Vec<TestBank> {
        match selector.into() {
            ChannelSelector::Only(channel) => self
                .queues
                .remove(&channel)
                .map(Vec::from)
                .unwrap_or_default(),
            ChannelSelector::All => std::mem::take(&mut self.queues)
                .into_values()
                .flatten()
                .collect(),
        }
    }

    /// Discard the selected channel(s) without running them
    pub fn clear(&mut self, selector: impl Into<ChannelSelector>) {
        match selector.into() {
            ChannelSelector::Only(channel) => {
                self.queues.remove(&channel);
            }
            ChannelSelector::All => self.queues.clear(),
        }
    }

    /// Number of banks waiting on the selected channel(s)
    pub fn pending(&self, selector: impl Into<ChannelSelector>) -> usize {
        let selector = selector.into();
        self.queues
            .iter()
            .filter(|(channel, _)| selector.matches(**channel))
            .map(|(_, queue)| queue.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.values().all(VecDeque::is_empty)
    }

    /// Channels that currently have at least one bank queued
    pub fn channels(&self) -> Vec<Channel> {
        self.queues
            .iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(channel, _)| *channel)
            .collect()
    }
}
