//! The Shared Context Engine (C2): versioned content trees with access
//! control, subscribe/notify, fork, merge, revert, and diff.
//!
//! No persistence or transport logic lives here beyond what the injected
//! `accord_storage` repositories and sinks provide — this module is the
//! business logic the spec describes in §4.2, nothing more.

use std::collections::HashMap;
use std::sync::Arc;

use accord_core::{
    AccessLevel, AgentId, ChangeOperation, Clock, ContextAccess, ContextChange, ContextConfig,
    ContextId, ContextVersion, SharedClock, SharedContext, Value, VersionId,
};
use accord_storage::{
    ArchivalSink, CompressionSink, ContextChangedEvent, ContextRepository,
    ContextVersionRepository, NotificationDispatcher, NotificationSink,
};
use chrono::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::diff::{ContextDiff, ModifiedLeaf, VersionMeta};
use crate::error::{Error, Result};
use crate::merge::{merge_values, MergeResolution};

/// Bound on retrying a failed archival push before giving up; archival
/// failures are logged and never propagate to the caller's write, per
/// §4.2's archival hook contract.
const ARCHIVAL_MAX_RETRIES: u32 = 3;

/// The Shared Context Engine. Cheaply cloneable: every field is an `Arc`
/// or a repository that is itself backed by one, the same shape the
/// teacher's storage-layer services use.
#[derive(Clone)]
pub struct ContextEngine {
    contexts: ContextRepository,
    versions: ContextVersionRepository,
    config: ContextConfig,
    clock: SharedClock,
    dispatcher: Arc<NotificationDispatcher>,
    archival: Arc<dyn ArchivalSink>,
    compression: Arc<dyn CompressionSink>,
}

impl std::fmt::Debug for ContextEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextEngine")
            .field("config", &self.config)
            .finish()
    }
}

impl ContextEngine {
    pub fn new(
        contexts: ContextRepository,
        versions: ContextVersionRepository,
        config: ContextConfig,
        clock: SharedClock,
        notification_sink: Arc<dyn NotificationSink>,
        archival: Arc<dyn ArchivalSink>,
        compression: Arc<dyn CompressionSink>,
    ) -> Self {
        let dispatcher = Arc::new(NotificationDispatcher::new(
            notification_sink,
            config.notification_queue_capacity,
        ));
        Self {
            contexts,
            versions,
            config,
            clock,
            dispatcher,
            archival,
            compression,
        }
    }

    pub fn dispatcher(&self) -> Arc<NotificationDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    // -- access control --------------------------------------------------

    fn require_read(&self, ctx: &SharedContext, agent_id: AgentId) -> Result<()> {
        if ctx.can_read(agent_id, self.clock.now()) {
            Ok(())
        } else {
            Err(Error::permission_denied(format!(
                "agent {agent_id} lacks READ access to context {}",
                ctx.id
            )))
        }
    }

    fn require_write(&self, ctx: &SharedContext, agent_id: AgentId) -> Result<()> {
        if ctx.can_write(agent_id, self.clock.now()) {
            Ok(())
        } else {
            Err(Error::permission_denied(format!(
                "agent {agent_id} lacks READ_WRITE access to context {}",
                ctx.id
            )))
        }
    }

    fn require_admin(&self, ctx: &SharedContext, agent_id: AgentId) -> Result<()> {
        if ctx.can_admin(agent_id, self.clock.now()) {
            Ok(())
        } else {
            Err(Error::permission_denied(format!(
                "agent {agent_id} lacks ADMIN access to context {}",
                ctx.id
            )))
        }
    }

    // -- create / read ----------------------------------------------------

    /// `CreateContext(name, type, ownerId, initialContent, initialACL?)`.
    pub async fn create_context(
        &self,
        name: impl Into<String>,
        context_type: impl Into<String>,
        owner_id: AgentId,
        initial_content: Value,
        initial_acl: Vec<ContextAccess>,
    ) -> Result<SharedContext> {
        let name = name.into();
        let context_type = context_type.into();
        info!(owner_id = %owner_id, %name, "creating context");

        let version_id = Uuid::new_v4();
        let mut context = SharedContext::new(name, context_type, owner_id, version_id, initial_content.clone());
        context.access_control = initial_acl;

        let create_change = ContextChange {
            operation: ChangeOperation::Create,
            path: "/".to_string(),
            old_value: None,
            new_value: Some(initial_content),
            agent_id: owner_id,
            timestamp: self.clock.now(),
            metadata: HashMap::new(),
        };
        let mut version = ContextVersion::new(owner_id, None, vec![create_change], HashMap::new());
        version.version_id = version_id;
        self.versions.append(context.id, version);

        self.contexts.save_versioned(context.clone(), 0)?;
        Ok(context)
    }

    /// `GetContext(contextId, agentId)`.
    pub fn get_context(&self, context_id: ContextId, agent_id: AgentId) -> Result<SharedContext> {
        let ctx = self.contexts.get(context_id)?;
        self.require_read(&ctx, agent_id)?;
        Ok(ctx)
    }

    // -- update / merge / fork / revert ------------------------------------

    /// `UpdateContext(contextId, agentId, updates, metadata?)`.
    pub async fn update_context(
        &self,
        context_id: ContextId,
        agent_id: AgentId,
        updates: Vec<(String, Value)>,
        metadata: HashMap<String, String>,
    ) -> Result<SharedContext> {
        let mut ctx = self.contexts.get(context_id)?;
        self.require_write(&ctx, agent_id)?;
        if updates.is_empty() {
            return Err(Error::invalid_argument("updates must not be empty"));
        }

        let now = self.clock.now();
        let mut changes = Vec::with_capacity(updates.len());
        for (path, value) in updates {
            if !path.starts_with('/') {
                return Err(Error::invalid_argument(format!("path must start with '/': {path}")));
            }
            let old_value = ctx.content.get_path(&path).cloned();
            ctx.content.set_path(&path, value.clone());
            changes.push(ContextChange {
                operation: ChangeOperation::Update,
                path,
                old_value,
                new_value: Some(value),
                agent_id,
                timestamp: now,
                metadata: metadata.clone(),
            });
        }

        self.commit_version(&mut ctx, agent_id, changes, metadata).await?;
        debug!(context_id = %context_id, "context updated");
        Ok(ctx)
    }

    /// `MergeContexts(targetId, sourceId, agentId, resolution)`.
    pub async fn merge_contexts(
        &self,
        target_id: ContextId,
        source_id: ContextId,
        agent_id: AgentId,
        resolution: &str,
    ) -> Result<SharedContext> {
        let resolution = MergeResolution::parse(resolution).ok_or_else(|| {
            Error::invalid_argument(format!("unknown merge resolution: {resolution}"))
        })?;

        let mut target = self.contexts.get(target_id)?;
        self.require_write(&target, agent_id)?;
        let source = self.contexts.get(source_id)?;
        self.require_read(&source, agent_id)?;

        let old_value = target.content.clone();
        let merged = merge_values(&target.content, &source.content, resolution);
        target.content = merged.clone();

        let now = self.clock.now();
        let change = ContextChange {
            operation: ChangeOperation::Merge,
            path: "/".to_string(),
            old_value: Some(old_value),
            new_value: Some(merged),
            agent_id,
            timestamp: now,
            metadata: HashMap::new(),
        };
        self.commit_version(&mut target, agent_id, vec![change], HashMap::new())
            .await?;
        info!(target_id = %target_id, source_id = %source_id, "merged contexts");
        Ok(target)
    }

    /// `ForkContext(contextId, agentId, newName?)`.
    pub async fn fork_context(
        &self,
        context_id: ContextId,
        agent_id: AgentId,
        new_name: Option<String>,
    ) -> Result<SharedContext> {
        let original = self.contexts.get(context_id)?;
        self.require_read(&original, agent_id)?;

        let name = new_name.unwrap_or_else(|| format!("{} (fork)", original.name));
        let mut forked = self
            .create_context(
                name,
                original.context_type.clone(),
                agent_id,
                original.content.clone(),
                Vec::new(),
            )
            .await?;
        forked.metadata.insert(
            "forkedFrom".to_string(),
            Value::string(original.id.to_string()),
        );
        forked.metadata.insert(
            "forkTime".to_string(),
            Value::string(self.clock.now().to_rfc3339()),
        );
        self.contexts.save_versioned(forked.clone(), forked.version_counter)?;
        info!(source = %context_id, fork = %forked.id, "forked context");
        Ok(forked)
    }

    /// `RevertToVersion(contextId, versionId, agentId)`.
    pub async fn revert_to_version(
        &self,
        context_id: ContextId,
        version_id: VersionId,
        agent_id: AgentId,
    ) -> Result<SharedContext> {
        let mut ctx = self.contexts.get(context_id)?;
        self.require_write(&ctx, agent_id)?;

        let reconstructed = self.reconstruct_at(context_id, version_id)?;
        let old_value = ctx.content.clone();
        ctx.content = reconstructed.clone();

        let now = self.clock.now();
        let change = ContextChange {
            operation: ChangeOperation::Update,
            path: "/".to_string(),
            old_value: Some(old_value),
            new_value: Some(reconstructed),
            agent_id,
            timestamp: now,
            metadata: HashMap::new(),
        };
        self.commit_version(&mut ctx, agent_id, vec![change], HashMap::new())
            .await?;
        info!(context_id = %context_id, reverted_to = %version_id, "reverted context");
        Ok(ctx)
    }

    // -- access control management -----------------------------------------

    /// `GrantAccess(contextId, granter, grantee, level, expiresIn?)`.
    pub fn grant_access(
        &self,
        context_id: ContextId,
        granter: AgentId,
        grantee: AgentId,
        level: AccessLevel,
        expires_in: Option<Duration>,
    ) -> Result<SharedContext> {
        let mut ctx = self.contexts.get(context_id)?;
        self.require_admin(&ctx, granter)?;

        let now = self.clock.now();
        let mut access = ContextAccess::new(grantee, level, granter);
        access.granted_at = now;
        if let Some(duration) = expires_in {
            access.expires_at = Some(now + duration);
        }
        ctx.access_control.retain(|a| a.agent_id != grantee);
        ctx.access_control.push(access);
        ctx.updated_at = now;
        self.contexts.save_versioned(ctx.clone(), ctx.version_counter)?;
        debug!(context_id = %context_id, grantee = %grantee, "granted access");
        Ok(ctx)
    }

    /// `RevokeAccess(contextId, revoker, target)`.
    pub fn revoke_access(
        &self,
        context_id: ContextId,
        revoker: AgentId,
        target: AgentId,
    ) -> Result<SharedContext> {
        let mut ctx = self.contexts.get(context_id)?;
        self.require_admin(&ctx, revoker)?;
        if target == ctx.owner_id {
            return Err(Error::invalid_state("cannot revoke the context owner's access"));
        }
        ctx.access_control.retain(|a| a.agent_id != target);
        ctx.updated_at = self.clock.now();
        self.contexts.save_versioned(ctx.clone(), ctx.version_counter)?;
        debug!(context_id = %context_id, target = %target, "revoked access");
        Ok(ctx)
    }

    /// `Subscribe(contextId, agentId)`. Requires READ.
    pub fn subscribe(&self, context_id: ContextId, agent_id: AgentId) -> Result<SharedContext> {
        let mut ctx = self.contexts.get(context_id)?;
        self.require_read(&ctx, agent_id)?;
        ctx.subscribers.insert(agent_id);
        self.contexts.save_versioned(ctx.clone(), ctx.version_counter)?;
        Ok(ctx)
    }

    /// `Unsubscribe(contextId, agentId)`. Always permitted for the agent
    /// unsubscribing themselves.
    pub fn unsubscribe(&self, context_id: ContextId, agent_id: AgentId) -> Result<SharedContext> {
        let mut ctx = self.contexts.get(context_id)?;
        ctx.subscribers.remove(&agent_id);
        self.contexts.save_versioned(ctx.clone(), ctx.version_counter)?;
        Ok(ctx)
    }

    // -- versions / diff / search -------------------------------------------

    /// `GetContextVersion(contextId, versionId, agentId)`.
    pub fn get_context_version(
        &self,
        context_id: ContextId,
        version_id: VersionId,
        agent_id: AgentId,
    ) -> Result<Value> {
        let ctx = self.contexts.get(context_id)?;
        self.require_read(&ctx, agent_id)?;
        self.reconstruct_at(context_id, version_id)
    }

    /// `CompareVersions(contextId, v1, v2, agentId)`.
    pub fn compare_versions(
        &self,
        context_id: ContextId,
        v1: VersionId,
        v2: VersionId,
        agent_id: AgentId,
    ) -> Result<ContextDiff> {
        let ctx = self.contexts.get(context_id)?;
        self.require_read(&ctx, agent_id)?;

        let chain = self.versions.chain(context_id);
        let v1_version = chain
            .iter()
            .find(|v| v.version_id == v1)
            .ok_or_else(|| Error::not_found("ContextVersion", v1.to_string()))?
            .clone();
        let v2_version = chain
            .iter()
            .find(|v| v.version_id == v2)
            .ok_or_else(|| Error::not_found("ContextVersion", v2.to_string()))?
            .clone();

        let content1 = self.reconstruct_at(context_id, v1)?;
        let content2 = self.reconstruct_at(context_id, v2)?;

        let leaves1: HashMap<String, Value> = content1.flatten_leaves().into_iter().collect();
        let leaves2: HashMap<String, Value> = content2.flatten_leaves().into_iter().collect();

        let mut added = Vec::new();
        let mut removed = Vec::new();
        let mut modified = Vec::new();

        for (path, value) in &leaves2 {
            match leaves1.get(path) {
                None => added.push((path.clone(), value.clone())),
                Some(old) if old != value => modified.push((
                    path.clone(),
                    ModifiedLeaf {
                        from: old.clone(),
                        to: value.clone(),
                    },
                )),
                _ => {}
            }
        }
        for (path, value) in &leaves1 {
            if !leaves2.contains_key(path) {
                removed.push((path.clone(), value.clone()));
            }
        }
        added.sort_by(|a, b| a.0.cmp(&b.0));
        removed.sort_by(|a, b| a.0.cmp(&b.0));
        modified.sort_by(|a, b| a.0.cmp(&b.0));

        Ok(ContextDiff {
            added,
            removed,
            modified,
            v1_meta: VersionMeta {
                version_id: v1_version.version_id,
                timestamp: v1_version.timestamp,
                agent_id: v1_version.agent_id,
            },
            v2_meta: VersionMeta {
                version_id: v2_version.version_id,
                timestamp: v2_version.timestamp,
                agent_id: v2_version.agent_id,
            },
        })
    }

    /// `SearchContexts(query, contextType?, agentId?)`.
    pub fn search_contexts(
        &self,
        query: &str,
        context_type: Option<&str>,
        agent_id: Option<AgentId>,
    ) -> Vec<SharedContext> {
        let now = self.clock.now();
        self.contexts
            .search_by_name(query, context_type)
            .into_iter()
            .filter(|ctx| agent_id.map(|a| ctx.can_read(a, now)).unwrap_or(true))
            .collect()
    }

    // -- internals ----------------------------------------------------------

    fn reconstruct_at(&self, context_id: ContextId, version_id: VersionId) -> Result<Value> {
        let chain = self.versions.chain(context_id);
        if chain.is_empty() {
            return Err(Error::not_found("Context", context_id.to_string()));
        }
        let by_id: HashMap<VersionId, &ContextVersion> =
            chain.iter().map(|v| (v.version_id, v)).collect();
        let target = by_id
            .get(&version_id)
            .copied()
            .ok_or_else(|| Error::not_found("ContextVersion", version_id.to_string()))?;

        let mut ordered = Vec::new();
        let mut current = Some(target);
        while let Some(version) = current {
            ordered.push(version);
            current = version.parent_version_id.and_then(|p| by_id.get(&p).copied());
        }
        ordered.reverse();

        let mut content = Value::tree();
        for version in ordered {
            Self::apply_changes(&mut content, &version.changes);
        }
        Ok(content)
    }

    fn apply_changes(content: &mut Value, changes: &[ContextChange]) {
        for change in changes {
            match change.operation {
                ChangeOperation::Create | ChangeOperation::Update | ChangeOperation::Merge => {
                    if let Some(new_value) = change.new_value.clone() {
                        content.set_path(&change.path, new_value);
                    }
                }
                ChangeOperation::Delete => {
                    content.delete_path(&change.path);
                }
            }
        }
    }

    /// Commit a batch of changes as one new `ContextVersion`, persist the
    /// context row, then fire the non-blocking notification/archival/
    /// compression hooks. Shared by every mutating operation so the
    /// version-chain + hook contract only needs implementing once.
    async fn commit_version(
        &self,
        ctx: &mut SharedContext,
        agent_id: AgentId,
        changes: Vec<ContextChange>,
        metadata: HashMap<String, String>,
    ) -> Result<()> {
        let now = self.clock.now();
        let parent = Some(ctx.current_version_id);
        let version = ContextVersion::new(agent_id, parent, changes.clone(), metadata);
        let new_version_id = version.version_id;
        self.versions.append(ctx.id, version);

        ctx.current_version_id = new_version_id;
        ctx.updated_at = now;

        self.maybe_compress(ctx).await;

        let expected = ctx.version_counter;
        self.contexts.save_versioned(ctx.clone(), expected)?;
        // re-read to reflect the bumped counter in the value we hand back
        *ctx = self.contexts.get(ctx.id)?;

        self.notify_subscribers(ctx, agent_id, changes.clone(), new_version_id);
        self.maybe_archive(ctx.id, new_version_id, ctx.content.clone(), now).await;

        Ok(())
    }

    fn notify_subscribers(
        &self,
        ctx: &SharedContext,
        mutator: AgentId,
        changes: Vec<ContextChange>,
        new_version_id: VersionId,
    ) {
        for subscriber in &ctx.subscribers {
            if *subscriber == mutator {
                continue;
            }
            self.dispatcher.enqueue(
                *subscriber,
                ContextChangedEvent {
                    context_id: ctx.id,
                    changes: changes.clone(),
                    new_version_id,
                },
            );
        }
    }

    /// Compression hook (§4.2). The engine always keeps the authoritative
    /// tree in `ctx.content` so reads are correct regardless of whether
    /// compression succeeded — `CompressionSink` in this workspace has no
    /// inverse operation (the spec's external interface table doesn't
    /// define one), so `is_compressed` records that a compression pass was
    /// attempted rather than gating what a read returns. See DESIGN.md.
    async fn maybe_compress(&self, ctx: &mut SharedContext) {
        if !self.config.memory_integration_enabled {
            return;
        }
        let estimated_size = serde_json::to_vec(&ctx.content).map(|b| b.len()).unwrap_or(0) as u64;
        if estimated_size <= self.config.compression_threshold_bytes {
            return;
        }
        match self.compression.compress(ctx.id, &ctx.content).await {
            Ok(_compressed) => {
                ctx.is_compressed = true;
                debug!(context_id = %ctx.id, estimated_size, "context compressed");
            }
            Err(error) => {
                warn!(context_id = %ctx.id, %error, "compression service unavailable, continuing uncompressed");
            }
        }
    }

    /// Archival hook (§4.2): every `archive_every_n_versions` committed
    /// versions, push a snapshot to the archival sink. Bounded retries;
    /// failure is logged and never surfaces to the caller.
    async fn maybe_archive(
        &self,
        context_id: ContextId,
        version_id: VersionId,
        content: Value,
        timestamp: chrono::DateTime<chrono::Utc>,
    ) {
        let chain_len = self.versions.chain(context_id).len() as u32;
        if chain_len == 0 || chain_len % self.config.archive_every_n_versions != 0 {
            return;
        }
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .archival
                .archive(context_id, version_id, content.clone(), timestamp)
                .await
            {
                Ok(()) => {
                    debug!(context_id = %context_id, version_id = %version_id, "archived context snapshot");
                    return;
                }
                Err(error) if attempt < ARCHIVAL_MAX_RETRIES => {
                    warn!(context_id = %context_id, attempt, %error, "archival failed, retrying");
                }
                Err(error) => {
                    warn!(context_id = %context_id, attempt, %error, "archival failed, giving up");
                    return;
                }
            }
        }
    }
}
