//! # Test Banks and Channels
//!
//! A [`TestBank`] is an ordered group of test cases sharing one [`Channel`].
//! Insertion order is execution order. Banks are queued per channel in the
//! [`ChannelRegistry`](crate::registry::ChannelRegistry) and a run selects
//! channels with a [`ChannelSelector`].

use crate::constants;
use crate::error::{Result, TestbedError};
use crate::state_machine::TestStatus;
use crate::test_case::{TestCase, TestResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Partition id used to group banks for selective execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub struct Channel(i32);

impl Channel {
    pub const DEFAULT: Channel = Channel(constants::DEFAULT_CHANNEL);

    /// Any id except the all-channels sentinel
    pub fn new(id: i32) -> Result<Self> {
        if id == constants::ALL_CHANNELS {
            return Err(TestbedError::InvalidChannel(id));
        }
        Ok(Self(id))
    }

    pub fn id(&self) -> i32 {
        self.0
    }
}

impl Default for Channel {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<i32> for Channel {
    type Error = TestbedError;

    fn try_from(id: i32) -> Result<Self> {
        Self::new(id)
    }
}

impl From<Channel> for i32 {
    fn from(channel: Channel) -> Self {
        channel.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which channels a drain, clear or run applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelSelector {
    All,
    Only(Channel),
}

impl ChannelSelector {
    pub fn matches(&self, channel: Channel) -> bool {
        match self {
            Self::All => true,
            Self::Only(only) => *only == channel,
        }
    }
}

impl From<i32> for ChannelSelector {
    fn from(id: i32) -> Self {
        if id == constants::ALL_CHANNELS {
            Self::All
        } else {
            Self::Only(Channel(id))
        }
    }
}

impl From<Channel> for ChannelSelector {
    fn from(channel: Channel) -> Self {
        Self::Only(channel)
    }
}

impl fmt::Display for ChannelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Only(channel) => write!(f, "{channel}"),
        }
    }
}

/// Ordered sequence of test cases sharing a channel
#[derive(Debug)]
pub struct TestBank {
    context: String,
    channel: Channel,
    tests: Vec<TestCase>,
}

impl TestBank {
    pub fn new(context: impl Into<String>, channel: Channel) -> Self {
        Self {
            context: context.into(),
            channel,
            tests: Vec::new(),
        }
    }

    /// Bind `test` to `receiver`/`callable` and append it.
    ///
    /// The case must be on this bank's channel and must be `Pending`; a case
    /// that already ran has to be reset before it joins another bank.
    pub fn add_test<R, F>(&mut self, receiver: Arc<R>, callable: F, mut test: TestCase) -> Result<()>
    where
        R: Send + Sync + 'static,
        F: Fn(&R, &TestCase) -> TestResult + Send + Sync + 'static,
    {
        self.check_admissible(&test)?;
        test.setup(receiver, callable)?;
        self.tests.push(test);
        Ok(())
    }

    /// Append a case whose callable is already bound
    pub fn push(&mut self, test: TestCase) -> Result<()> {
        if !test.is_bound() {
            return Err(TestbedError::NotBound(test.name()));
        }
        self.check_admissible(&test)?;
        self.tests.push(test);
        Ok(())
    }

    fn check_admissible(&self, test: &TestCase) -> Result<()> {
        if test.channel() != self.channel.id() {
            return Err(TestbedError::ChannelMismatch {
                test: test.name(),
                test_channel: test.channel(),
                bank_channel: self.channel.id(),
            });
        }

        let status = test.status();
        if status != TestStatus::Pending {
            return Err(TestbedError::NotReset {
                name: test.name(),
                status: status.to_string(),
            });
        }

        Ok(())
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn count(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TestCase> {
        self.tests.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TestCase> {
        self.tests.iter()
    }
}

impl<'a> IntoIterator for &'a TestBank {
    type Item = &'a TestCase;
    type IntoIter = std::slice::Iter<'a, TestCase>;

    fn into_iter(self) -> Self::IntoIter {
        self.tests.iter()
    }
}
