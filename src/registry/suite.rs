//! Explicit test registration.
//!
//! A suite type lists its tests as [`TestDeclaration`]s; [`discover`] and
//! [`BankBuilder`] turn those declarations into banks, one per channel, in
//! declaration order.

use crate::bank::{Channel, ChannelSelector, TestBank};
use crate::error::Result;
use crate::test_case::{short_type_name, TestCase, TestConfig, TestResult};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

type SuiteFn<R> = Arc<dyn Fn(&R, &TestCase) -> TestResult + Send + Sync>;

/// One declared test: display name, optional settings and the method to call
pub struct TestDeclaration<R> {
    name: String,
    config: Option<TestConfig>,
    callable: SuiteFn<R>,
}

impl<R: Send + Sync + 'static> TestDeclaration<R> {
    pub fn new<F>(name: impl Into<String>, callable: F) -> Self
    where
        F: Fn(&R, &TestCase) -> TestResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            config: None,
            callable: Arc::new(callable),
        }
    }

    /// Use `config` instead of the builder defaults
    pub fn with_config(mut self, config: TestConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn resolved_config(&self, defaults: &TestConfig) -> TestConfig {
        self.config.unwrap_or(*defaults)
    }
}

impl<R> Clone for TestDeclaration<R> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            config: self.config,
            callable: Arc::clone(&self.callable),
        }
    }
}

impl<R> fmt::Debug for TestDeclaration<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDeclaration")
            .field("name", &self.name)
            .field("config", &self.config)
            .finish()
    }
}

/// A receiver type that declares its own tests
pub trait TestSuite: Send + Sync + Sized + 'static {
    /// Label attached to the banks built from this suite
    fn context(&self) -> String {
        short_type_name(std::any::type_name::<Self>()).to_string()
    }

    fn declarations() -> Vec<TestDeclaration<Self>>;
}

/// Build the banks for `receiver`'s declared tests on the selected channel(s)
pub fn discover<S: TestSuite>(
    receiver: Arc<S>,
    selector: ChannelSelector,
    defaults: &TestConfig,
) -> Result<Vec<TestBank>> {
    let context = receiver.context();
    let mut builder = BankBuilder::new(context, receiver).with_defaults(*defaults);
    for declaration in S::declarations() {
        builder = builder.declare(declaration);
    }
    builder.build_for(selector)
}

/// Collects declarations for one receiver and builds banks from them
pub struct BankBuilder<R> {
    context: String,
    receiver: Arc<R>,
    defaults: TestConfig,
    declarations: Vec<TestDeclaration<R>>,
}

impl<R: Send + Sync + 'static> BankBuilder<R> {
    pub fn new(context: impl Into<String>, receiver: Arc<R>) -> Self {
        Self {
            context: context.into(),
            receiver,
            defaults: TestConfig::default(),
            declarations: Vec::new(),
        }
    }

    /// Settings for declarations that do not carry their own
    pub fn with_defaults(mut self, defaults: TestConfig) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn test<F>(self, name: impl Into<String>, callable: F) -> Self
    where
        F: Fn(&R, &TestCase) -> TestResult + Send + Sync + 'static,
    {
        self.declare(TestDeclaration::new(name, callable))
    }

    pub fn test_with<F>(self, name: impl Into<String>, config: TestConfig, callable: F) -> Self
    where
        F: Fn(&R, &TestCase) -> TestResult + Send + Sync + 'static,
    {
        self.declare(TestDeclaration::new(name, callable).with_config(config))
    }

    pub fn declare(mut self, declaration: TestDeclaration<R>) -> Self {
        self.declarations.push(declaration);
        self
    }

    /// Build a single bank; every declaration must share one channel
    pub fn build(self) -> Result<TestBank> {
        let channel = match self.declarations.first() {
            Some(first) => first.resolved_config(&self.defaults).channel,
            None => self.defaults.channel,
        };
        let mut bank = TestBank::new(self.context.clone(), Channel::new(channel)?);

        for declaration in &self.declarations {
            self.bind_into(&mut bank, declaration)?;
        }
        Ok(bank)
    }

    /// Build one bank per channel, ordered by each channel's first declaration
    pub fn build_for(self, selector: ChannelSelector) -> Result<Vec<TestBank>> {
        let mut banks: Vec<TestBank> = Vec::new();

        for declaration in &self.declarations {
            let channel = Channel::new(declaration.resolved_config(&self.defaults).channel)?;
            if !selector.matches(channel) {
                continue;
            }

            let index = match banks.iter().position(|bank| bank.channel() == channel) {
                Some(index) => index,
                None => {
                    banks.push(TestBank::new(self.context.clone(), channel));
                    banks.len() - 1
                }
            };
            self.bind_into(&mut banks[index], declaration)?;
        }

        debug!(
            context = %self.context,
            selector = %selector,
            banks = banks.len(),
            declared = self.declarations.len(),
            "Declarations grouped into banks"
        );
        Ok(banks)
    }

    fn bind_into(&self, bank: &mut TestBank, declaration: &TestDeclaration<R>) -> Result<()> {
        let config = declaration.resolved_config(&self.defaults);
        let callable = Arc::clone(&declaration.callable);
        bank.add_test(
            Arc::clone(&self.receiver),
            move |receiver: &R, case: &TestCase| callable(receiver, case),
            TestCase::new(declaration.name.clone(), config),
        )
    }
}
