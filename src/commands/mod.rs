//! Command implementations
//!
//! Each command module takes parsed CLI args and runs the operation
//! against the database through a [`Session`].

pub mod actions;
pub mod config;
pub mod course;
pub mod db;
pub mod tasks;

use crate::auth::StaticAuthorization;
use crate::bulk::{BulkExecutor, BulkSettings, Services};
use crate::config::MassactConfig;
use crate::db::Database;
use crate::events::{EventSink, FanoutSink, TracingSink};
use crate::hooks::{HookRegistry, register_config_policy};

static TRACING_SINK: TracingSink = TracingSink;

/// Everything a bulk command needs: the store, policies and output flags
pub struct Session<'a> {
    pub db: &'a Database,
    pub hooks: HookRegistry,
    pub authorization: StaticAuthorization,
    pub settings: BulkSettings,
    pub quiet: bool,
    pub json: bool,
    events: FanoutSink<'a>,
}

impl<'a> Session<'a> {
    /// Build a session from the loaded configuration
    #[must_use]
    pub fn new(db: &'a Database, config: &MassactConfig, quiet: bool, json: bool) -> Self {
        let mut hooks = HookRegistry::new();
        register_config_policy(&mut hooks, &config.policy);
        Self {
            db,
            hooks,
            authorization: config.authorization(),
            settings: config.bulk_settings(),
            quiet,
            json,
            events: FanoutSink::new(vec![db as &dyn EventSink, &TRACING_SINK]),
        }
    }

    /// Executor wired to the database, logging events to the store and tracing
    #[must_use]
    pub fn executor(&self) -> BulkExecutor<'_> {
        let services = Services::from_store(self.db, &self.authorization, &self.hooks, &self.events);
        BulkExecutor::new(services, self.settings)
    }
}
