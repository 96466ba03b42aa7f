//! Runs one verb from parsed arguments to a finished transaction.
//!
//! ```text
//! Idle -> VerbSelected -> ConfigResolved -> ClientReady -> TransactionIssued -> Done
//!           \______________\_______________\______________________________/
//!                                  any failure: Done(Failure)
//! ```

use std::fmt;

use dgacl_client::ClientBuilder;
use dgacl_core::{ConfigFile, EnvSource, ProcessEnv, Resolver};
use tracing::{debug, error};

use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::handlers::{self, Report};
use crate::verb::{EffectiveConfig, Verb, VerbParams, parent_spec};

/// How an invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The verb completed.
    Success,
    /// The verb failed; the process exits 1.
    Failure,
}

/// Dispatcher progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing selected yet.
    Idle,
    /// A verb was chosen.
    VerbSelected(Verb),
    /// Settings merged into an [`EffectiveConfig`].
    ConfigResolved,
    /// Every endpoint connected.
    ClientReady,
    /// The verb's transaction is in flight.
    TransactionIssued,
    /// Finished.
    Done(Outcome),
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => f.write_str("idle"),
            Stage::VerbSelected(verb) => write!(f, "verb-selected({verb})"),
            Stage::ConfigResolved => f.write_str("config-resolved"),
            Stage::ClientReady => f.write_str("client-ready"),
            Stage::TransactionIssued => f.write_str("transaction-issued"),
            Stage::Done(Outcome::Success) => f.write_str("done(success)"),
            Stage::Done(Outcome::Failure) => f.write_str("done(failure)"),
        }
    }
}

/// Routes a parsed command line to its handler.
#[derive(Debug)]
pub struct Dispatcher<E = ProcessEnv> {
    env: E,
    builder: ClientBuilder,
    stage: Stage,
}

impl Dispatcher<ProcessEnv> {
    /// Read settings from the process environment.
    pub fn from_process_env() -> Self {
        Self::new(ProcessEnv)
    }
}

impl<E: EnvSource> Dispatcher<E> {
    /// Read settings from `env`.
    pub fn new(env: E) -> Self {
        Self {
            env,
            builder: ClientBuilder::new(),
            stage: Stage::Idle,
        }
    }

    /// Use a custom client builder.
    pub fn with_builder(mut self, builder: ClientBuilder) -> Self {
        self.builder = builder;
        self
    }

    /// Current stage.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Run the verb selected by `cli`.
    ///
    /// The client is closed on every path once built. A failure is logged
    /// once, with the verb and any resolved parameters, before being
    /// returned.
    pub async fn dispatch(&mut self, cli: &Cli) -> Result<Report> {
        let verb = cli.verb();
        self.advance(Stage::VerbSelected(verb));

        let config = match self.resolve(verb, cli) {
            Ok(config) => config,
            Err(e) => return Err(self.fail(verb, None, e)),
        };
        self.advance(Stage::ConfigResolved);
        debug!(%verb, config = ?config, "Resolved configuration");

        match self.run(verb, &config).await {
            Ok(report) => {
                self.advance(Stage::Done(Outcome::Success));
                Ok(report)
            }
            Err(e) => Err(self.fail(verb, Some(&config.params), e)),
        }
    }

    /// Merge flags, environment, config file and defaults for `verb`.
    pub fn resolve(&self, verb: Verb, cli: &Cli) -> Result<EffectiveConfig> {
        let file = ConfigFile::load(cli.global.config.as_deref())?;
        let parent = parent_spec();
        let spec = verb.spec();
        let settings =
            Resolver::new(&parent, &spec).resolve(&cli.explicit_flags(), &self.env, &file)?;
        Ok(EffectiveConfig::from_resolved(verb, &settings)?)
    }

    async fn run(&mut self, verb: Verb, config: &EffectiveConfig) -> Result<Report> {
        let mut client = self
            .builder
            .build_endpoints(&config.base.endpoints, &config.base.tls)
            .await?;
        self.advance(Stage::ClientReady);

        self.advance(Stage::TransactionIssued);
        let result = handlers::execute(&mut client, &config.params).await;
        client.close().await;

        result.map_err(|source| Error::Handler { verb, source })
    }

    fn fail(&mut self, verb: Verb, params: Option<&VerbParams>, e: Error) -> Error {
        error!(
            %verb,
            params = ?params,
            config = e.is_config(),
            remote = e.is_remote(),
            error = %e,
            "Command failed"
        );
        self.advance(Stage::Done(Outcome::Failure));
        e
    }

    fn advance(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "Dispatcher transition");
        self.stage = next;
    }
}
