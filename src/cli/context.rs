//! Shared state for one CLI invocation

use crate::audit::{AuditCompiler, AuditContext, AuditLogger};
use crate::config::{ChroniclePaths, Settings};
use crate::error::ChronicleResult;
use crate::interceptor::CommitInterceptor;
use crate::models::ActorId;
use crate::persistence::{Database, RecordStore};

/// Options every command accepts
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub actor: Option<u64>,
    pub source: Option<String>,
    pub comment: Option<String>,
}

/// Database, audit compiler and request details for one command
pub struct CommandContext {
    pub paths: ChroniclePaths,
    pub settings: Settings,
    pub db: Database,
    pub audit: AuditCompiler<AuditLogger>,
    pub request: AuditContext,
    pub source: String,
}

impl CommandContext {
    /// Load the record store and wire up the commit interceptor
    pub fn open(
        paths: ChroniclePaths,
        settings: Settings,
        options: RequestOptions,
    ) -> ChronicleResult<Self> {
        let mut store = RecordStore::with_file(paths.records_file());
        store.load()?;

        let db = Database::new(store).with_hook(CommitInterceptor::new());
        let audit = AuditCompiler::new(AuditLogger::new(paths.audit_log()))
            .with_system_actor(settings.system_actor);

        let mut request = AuditContext::new()
            .with_user_agent(format!("chronicle-cli/{}", env!("CARGO_PKG_VERSION")));
        request.current_actor = options.actor.map(ActorId::new);
        request.comment = options.comment;

        let source = options
            .source
            .unwrap_or_else(|| settings.default_source.clone());

        Ok(Self {
            paths,
            settings,
            db,
            audit,
            request,
            source,
        })
    }

    /// Actor commits are attributed to
    pub fn actor(&self) -> ActorId {
        self.request
            .current_actor
            .unwrap_or(self.settings.system_actor)
    }
}
