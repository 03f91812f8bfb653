//! Lifecycle orchestrator for auxiliary deployments.
//!
//! Drives Create / Update / Delete / Start / Stop / Restart (and their
//! batch variants) across the state store and the container engine. The
//! two systems fail independently, so every multi-step operation keeps
//! them consistent with compensating actions instead of a distributed
//! transaction: hard guarantees up to the store commit, best-effort
//! logged-only cleanup after it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{info, warn};

use berth_core::labels;
use berth_core::module::{AuxServiceDef, ModuleDefinition};
use berth_core::types::{CreateAuxRequest, ParentDeployment, UpdateAuxRequest};
use berth_engine::{Engine, EngineError, EngineResult, VolumeSpec};
use berth_state::{AuxDeployment, AuxFilter, ContainerRecord, NewAuxDeployment, StateStore};

use crate::compensate::{Compensation, Compensations};
use crate::config::OrchestratorConfig;
use crate::error::{AuxError, AuxResult};
use crate::image;
use crate::jobs;
use crate::locks::KeyedLocks;
use crate::resources;
use crate::voldiff::{self, DesiredVolume};

/// Post-commit steps of an Update. Failures here are logged, never
/// surfaced; the authoritative record is already committed.
struct UpdateTail {
    start_new: Option<String>,
    remove_old: Option<String>,
    remove_volumes: Vec<String>,
}

/// Orchestrates auxiliary-service lifecycle operations.
///
/// The orchestrator holds no state of its own beyond the keyed lock map;
/// desired state lives in the store, physical state in the engine.
pub struct Orchestrator {
    state: StateStore,
    engine: Arc<dyn Engine>,
    config: OrchestratorConfig,
    locks: KeyedLocks,
}

impl Orchestrator {
    pub fn new(state: StateStore, engine: Arc<dyn Engine>, config: OrchestratorConfig) -> Self {
        Self::with_locks(state, engine, config, KeyedLocks::new())
    }

    /// Construct with a shared lock map, for callers that coordinate
    /// several orchestrators.
    pub fn with_locks(
        state: StateStore,
        engine: Arc<dyn Engine>,
        config: OrchestratorConfig,
        locks: KeyedLocks,
    ) -> Self {
        Self {
            state,
            engine,
            config,
            locks,
        }
    }

    // ── Reads ──────────────────────────────────────────────────────

    /// Read one record, with its container attached.
    pub async fn get(&self, deployment_id: &str, aux_id: &str) -> AuxResult<AuxDeployment> {
        let aux = self
            .state
            .get_aux(aux_id, true)?
            .ok_or_else(|| AuxError::NotFound(aux_id.to_string()))?;
        authorize(deployment_id, &aux)?;
        Ok(aux)
    }

    /// List records of one parent deployment matching the filter.
    pub async fn list(
        &self,
        deployment_id: &str,
        mut filter: AuxFilter,
    ) -> AuxResult<Vec<AuxDeployment>> {
        filter.deployment_id = Some(deployment_id.to_string());
        Ok(self.state.list_aux(&filter)?)
    }

    // ── Create ─────────────────────────────────────────────────────

    /// Create an auxiliary deployment: record, volumes, and container.
    ///
    /// The record lands disabled; the first Start transitions it to
    /// running. On any failure, including a failed commit, all physical
    /// resources created so far are rolled back.
    pub async fn create(
        &self,
        cancel: watch::Receiver<bool>,
        module: &ModuleDefinition,
        parent: &ParentDeployment,
        request: CreateAuxRequest,
    ) -> AuxResult<AuxDeployment> {
        let svc = module.aux_services.get(&request.service_ref).ok_or_else(|| {
            AuxError::InvalidInput(format!(
                "unknown auxiliary service {:?}",
                request.service_ref
            ))
        })?;
        image::validate_image(&module.image_patterns, &request.image)?;
        self.ensure_image(cancel, &request.image, request.force_pull)
            .await?;

        let mut comps = Compensations::new();
        match self
            .create_physical(module, svc, parent, &request, &mut comps)
            .await
        {
            Ok(aux) => {
                info!(aux_id = %aux.id, deployment_id = %parent.id, service = %aux.service_ref, "auxiliary created");
                Ok(aux)
            }
            Err(e) => {
                warn!(deployment_id = %parent.id, error = %e, "create failed, rolling back");
                comps.unwind(self.engine.as_ref()).await;
                Err(e)
            }
        }
    }

    async fn create_physical(
        &self,
        module: &ModuleDefinition,
        svc: &AuxServiceDef,
        parent: &ParentDeployment,
        request: &CreateAuxRequest,
        comps: &mut Compensations,
    ) -> AuxResult<AuxDeployment> {
        let mut txn = self.state.begin()?;
        let mut aux = self.state.create_aux(
            Some(&mut txn),
            NewAuxDeployment {
                deployment_id: parent.id.clone(),
                service_ref: request.service_ref.clone(),
                name: request
                    .name
                    .clone()
                    .unwrap_or_else(|| svc.name.clone()),
                image: request.image.clone(),
                labels: request.labels.clone(),
                configs: request.configs.clone(),
                volumes: request.volumes.clone(),
                run_config: request.run_config.clone(),
                enabled: false,
            },
        )?;

        let desired = resources::desired_volumes(module, svc, &parent.id, &aux);
        self.create_volumes(&desired, &parent.id, &aux.id, comps)
            .await?;

        let spec = resources::build_container_spec(
            module,
            svc,
            parent,
            &aux,
            &desired,
            &self.config.core_id,
            &self.config.manager_id,
        )?;
        let container_id = self
            .engine_bounded(self.engine.create_container(&spec))
            .await
            .map_err(AuxError::from)?;
        comps.push(Compensation::RemoveContainer {
            container_id: container_id.clone(),
        });

        let record = ContainerRecord {
            container_id,
            alias: spec.alias,
        };
        self.state.put_container(Some(&mut txn), &aux.id, &record)?;
        // The commit is inside the compensated region: a failed commit
        // unwinds the container and volumes like any other step.
        txn.commit()?;
        aux.container = Some(record);
        Ok(aux)
    }

    // ── Update ─────────────────────────────────────────────────────

    /// Replace a record's image, configs, volumes, run-config, and
    /// container as a unit. `enabled` is never changed here.
    pub async fn update(
        &self,
        cancel: watch::Receiver<bool>,
        module: &ModuleDefinition,
        parent: &ParentDeployment,
        aux_id: &str,
        request: UpdateAuxRequest,
    ) -> AuxResult<AuxDeployment> {
        let _guard = self.locks.acquire(aux_id).await;

        let old = self
            .state
            .get_aux(aux_id, true)?
            .ok_or_else(|| AuxError::NotFound(aux_id.to_string()))?;
        authorize(&parent.id, &old)?;
        let svc = module.aux_services.get(&old.service_ref).ok_or_else(|| {
            AuxError::InvalidInput(format!("unknown auxiliary service {:?}", old.service_ref))
        })?;

        let new_base = resolve_update(&old, module, &request)?;

        let mut comps = Compensations::new();
        // If anything below fails after the old container was stopped,
        // bring it back up (best-effort).
        if old.enabled {
            if let Some(container) = &old.container {
                comps.push(Compensation::RestartContainer {
                    container_id: container.container_id.clone(),
                });
            }
        }

        match self
            .update_physical(cancel, module, svc, parent, &old, new_base, &request, &mut comps)
            .await
        {
            Ok((aux, tail)) => {
                info!(aux_id = %aux.id, image = %aux.image, "auxiliary updated");
                self.run_update_tail(tail).await;
                Ok(aux)
            }
            Err(e) => {
                warn!(%aux_id, error = %e, "update failed, rolling back");
                comps.unwind(self.engine.as_ref()).await;
                Err(e)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn update_physical(
        &self,
        cancel: watch::Receiver<bool>,
        module: &ModuleDefinition,
        svc: &AuxServiceDef,
        parent: &ParentDeployment,
        old: &AuxDeployment,
        mut new_base: AuxDeployment,
        request: &UpdateAuxRequest,
        comps: &mut Compensations,
    ) -> AuxResult<(AuxDeployment, UpdateTail)> {
        if new_base.image != old.image || request.force_pull {
            self.ensure_image(cancel.clone(), &new_base.image, request.force_pull)
                .await?;
        }

        // Stop the old container before the swap.
        if let Some(container) = &old.container {
            let job_id = self
                .engine_bounded(self.engine.stop_container(&container.container_id))
                .await
                .map_err(AuxError::from)?;
            jobs::await_job(
                self.engine.as_ref(),
                cancel.clone(),
                &job_id,
                self.config.job_wait,
            )
            .await?;
        }

        let mut txn = self.state.begin()?;
        if old.container.is_some() {
            self.state.delete_container(Some(&mut txn), &old.id)?;
        }
        new_base = self.state.update_aux(Some(&mut txn), &new_base)?;

        // Reconcile volumes: create what is missing, keep what matches,
        // and leave orphans for the post-commit tail.
        let desired = resources::desired_volumes(module, svc, &parent.id, &new_base);
        let existing = self
            .engine_bounded(self.engine.get_volumes(&self.aux_scope(&parent.id, &new_base.id)))
            .await
            .map_err(AuxError::from)?;
        let plan = voldiff::diff(&desired, &existing);
        self.create_volumes(&plan.new, &parent.id, &new_base.id, comps)
            .await?;

        let spec = resources::build_container_spec(
            module,
            svc,
            parent,
            &new_base,
            &desired,
            &self.config.core_id,
            &self.config.manager_id,
        )?;
        let container_id = self
            .engine_bounded(self.engine.create_container(&spec))
            .await
            .map_err(AuxError::from)?;
        comps.push(Compensation::RemoveContainer {
            container_id: container_id.clone(),
        });

        let record = ContainerRecord {
            container_id: container_id.clone(),
            alias: spec.alias,
        };
        self.state.put_container(Some(&mut txn), &new_base.id, &record)?;
        txn.commit()?;
        new_base.container = Some(record);

        let tail = UpdateTail {
            start_new: old.enabled.then_some(container_id),
            remove_old: old.container.as_ref().map(|c| c.container_id.clone()),
            remove_volumes: plan.orphaned,
        };
        Ok((new_base, tail))
    }

    /// Best-effort tail after a committed update. Every failure is
    /// logged and swallowed.
    async fn run_update_tail(&self, tail: UpdateTail) {
        if let Some(container_id) = tail.start_new {
            if let Err(e) = self
                .engine_bounded(self.engine.start_container(&container_id))
                .await
            {
                warn!(%container_id, error = %e, "failed to start replacement container");
            }
        }
        if let Some(container_id) = tail.remove_old {
            match self
                .engine_bounded(self.engine.remove_container(&container_id))
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(%container_id, error = %e, "failed to remove replaced container"),
            }
        }
        for name in tail.remove_volumes {
            match self.engine_bounded(self.engine.remove_volume(&name)).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(volume = %name, error = %e, "failed to remove orphaned volume"),
            }
        }
    }

    // ── Start / Stop / Restart ─────────────────────────────────────

    /// Start the container and persist `enabled=true` if it was off.
    pub async fn start(&self, deployment_id: &str, aux_id: &str) -> AuxResult<()> {
        let _guard = self.locks.acquire(aux_id).await;
        self.start_locked(deployment_id, aux_id).await
    }

    async fn start_locked(&self, deployment_id: &str, aux_id: &str) -> AuxResult<()> {
        let mut aux = self
            .state
            .get_aux(aux_id, true)?
            .ok_or_else(|| AuxError::NotFound(aux_id.to_string()))?;
        authorize(deployment_id, &aux)?;
        let container = aux.container.as_ref().ok_or_else(|| {
            AuxError::Internal(format!("auxiliary {aux_id} has no container"))
        })?;
        self.engine_bounded(self.engine.start_container(&container.container_id))
            .await
            .map_err(AuxError::from)?;
        if !aux.enabled {
            aux.enabled = true;
            self.state.update_aux(None, &aux)?;
        }
        info!(%aux_id, "auxiliary started");
        Ok(())
    }

    /// Stop the container and, unless `no_store`, persist
    /// `enabled=false`. Any stop failure (including an engine
    /// not-found) surfaces as `Internal`.
    pub async fn stop(
        &self,
        cancel: watch::Receiver<bool>,
        deployment_id: &str,
        aux_id: &str,
        no_store: bool,
    ) -> AuxResult<()> {
        let _guard = self.locks.acquire(aux_id).await;
        let mut aux = self
            .state
            .get_aux(aux_id, true)?
            .ok_or_else(|| AuxError::NotFound(aux_id.to_string()))?;
        authorize(deployment_id, &aux)?;

        self.halt_container(cancel, &aux)
            .await
            .map_err(AuxError::into_internal)?;

        if !no_store && aux.enabled {
            aux.enabled = false;
            self.state.update_aux(None, &aux)?;
        }
        info!(%aux_id, no_store, "auxiliary stopped");
        Ok(())
    }

    /// Stop then start. The stop step's errors propagate un-wrapped.
    pub async fn restart(
        &self,
        cancel: watch::Receiver<bool>,
        deployment_id: &str,
        aux_id: &str,
    ) -> AuxResult<()> {
        let _guard = self.locks.acquire(aux_id).await;
        let aux = self
            .state
            .get_aux(aux_id, true)?
            .ok_or_else(|| AuxError::NotFound(aux_id.to_string()))?;
        authorize(deployment_id, &aux)?;

        self.halt_container(cancel, &aux).await?;
        self.start_locked(deployment_id, aux_id).await
    }

    /// Issue the engine stop and await its job.
    async fn halt_container(
        &self,
        cancel: watch::Receiver<bool>,
        aux: &AuxDeployment,
    ) -> AuxResult<()> {
        let container = aux.container.as_ref().ok_or_else(|| {
            AuxError::Internal(format!("auxiliary {} has no container", aux.id))
        })?;
        let job_id = self
            .engine_bounded(self.engine.stop_container(&container.container_id))
            .await
            .map_err(AuxError::from)?;
        jobs::await_job(self.engine.as_ref(), cancel, &job_id, self.config.job_wait).await?;
        Ok(())
    }

    // ── Delete ─────────────────────────────────────────────────────

    /// Remove physical resources, then the record; the record's
    /// existence is what labels and owns the physical resources.
    pub async fn delete(&self, deployment_id: &str, aux_id: &str) -> AuxResult<()> {
        let _guard = self.locks.acquire(aux_id).await;
        let aux = self
            .state
            .get_aux(aux_id, true)?
            .ok_or_else(|| AuxError::NotFound(aux_id.to_string()))?;
        authorize(deployment_id, &aux)?;

        if let Some(container) = &aux.container {
            match self
                .engine_bounded(self.engine.remove_container(&container.container_id))
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }

        // Rediscover volumes by label rather than recomputed name, to
        // tolerate historical naming-scheme drift.
        let volumes = self
            .engine_bounded(self.engine.get_volumes(&self.aux_scope(deployment_id, aux_id)))
            .await
            .map_err(AuxError::from)?;
        for volume in volumes {
            match self
                .engine_bounded(self.engine.remove_volume(&volume.name))
                .await
            {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => warn!(volume = %volume.name, error = %e, "failed to remove volume"),
            }
        }

        // Final authoritative step; no transaction needed.
        self.state.delete_aux(None, aux_id)?;
        info!(%aux_id, deployment_id, "auxiliary deleted");
        Ok(())
    }

    // ── Batch variants ─────────────────────────────────────────────
    //
    // Each applies the single-item operation sequentially; the first
    // error aborts the remaining items without rolling back completed
    // ones.

    pub async fn start_all(&self, deployment_id: &str, filter: AuxFilter) -> AuxResult<()> {
        for aux in self.scoped(deployment_id, filter)? {
            self.start(deployment_id, &aux.id).await?;
        }
        Ok(())
    }

    pub async fn stop_all(
        &self,
        cancel: watch::Receiver<bool>,
        deployment_id: &str,
        filter: AuxFilter,
        no_store: bool,
    ) -> AuxResult<()> {
        for aux in self.scoped(deployment_id, filter)? {
            self.stop(cancel.clone(), deployment_id, &aux.id, no_store)
                .await?;
        }
        Ok(())
    }

    pub async fn restart_all(
        &self,
        cancel: watch::Receiver<bool>,
        deployment_id: &str,
        filter: AuxFilter,
    ) -> AuxResult<()> {
        for aux in self.scoped(deployment_id, filter)? {
            self.restart(cancel.clone(), deployment_id, &aux.id).await?;
        }
        Ok(())
    }

    pub async fn delete_all(&self, deployment_id: &str, filter: AuxFilter) -> AuxResult<()> {
        for aux in self.scoped(deployment_id, filter)? {
            self.delete(deployment_id, &aux.id).await?;
        }
        Ok(())
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn scoped(&self, deployment_id: &str, mut filter: AuxFilter) -> AuxResult<Vec<AuxDeployment>> {
        filter.deployment_id = Some(deployment_id.to_string());
        Ok(self.state.list_aux(&filter)?)
    }

    /// Label filter selecting resources of one auxiliary deployment.
    fn aux_scope(&self, deployment_id: &str, aux_id: &str) -> HashMap<String, String> {
        HashMap::from([
            (labels::DEPLOYMENT_ID.to_string(), deployment_id.to_string()),
            (labels::AUX_ID.to_string(), aux_id.to_string()),
        ])
    }

    /// Make sure the image is present, pulling it when missing or forced.
    async fn ensure_image(
        &self,
        cancel: watch::Receiver<bool>,
        image: &str,
        force: bool,
    ) -> AuxResult<()> {
        if !force {
            match self.engine_bounded(self.engine.get_image(image)).await {
                Ok(_) => return Ok(()),
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e.into()),
            }
        }
        let job_id = self
            .engine_bounded(self.engine.add_image(image))
            .await
            .map_err(AuxError::from)?;
        jobs::await_job(self.engine.as_ref(), cancel, &job_id, self.config.job_wait).await?;
        info!(%image, "image pulled");
        Ok(())
    }

    /// Create the given volumes, compensating only the ones that did not
    /// already exist.
    async fn create_volumes(
        &self,
        volumes: &[DesiredVolume],
        deployment_id: &str,
        aux_id: &str,
        comps: &mut Compensations,
    ) -> AuxResult<()> {
        for volume in volumes {
            let spec = VolumeSpec {
                name: volume.name.clone(),
                labels: resources::volume_labels(
                    &self.config.core_id,
                    &self.config.manager_id,
                    deployment_id,
                    aux_id,
                    &volume.volume_ref,
                ),
            };
            let created = self
                .engine_bounded(self.engine.create_volume(&spec))
                .await
                .map_err(AuxError::from)?;
            if created {
                comps.push(Compensation::RemoveVolume {
                    name: volume.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Bound a synchronous engine call by the configured timeout.
    async fn engine_bounded<T>(
        &self,
        call: impl Future<Output = EngineResult<T>>,
    ) -> EngineResult<T> {
        match timeout(self.config.engine_call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(EngineError::Timeout(format!(
                "no response within {:?}",
                self.config.engine_call_timeout
            ))),
        }
    }
}

/// Verify the caller-supplied parent ID against the stored one.
fn authorize(deployment_id: &str, aux: &AuxDeployment) -> AuxResult<()> {
    if aux.deployment_id != deployment_id {
        return Err(AuxError::Forbidden(format!(
            "auxiliary {} does not belong to deployment {deployment_id}",
            aux.id
        )));
    }
    Ok(())
}

/// Resolve the new base record for an update: image re-validated when
/// changed, maps merged or replaced per the incremental flag, run-config
/// and name overridden when supplied. `enabled` is carried over
/// untouched.
fn resolve_update(
    old: &AuxDeployment,
    module: &ModuleDefinition,
    request: &UpdateAuxRequest,
) -> AuxResult<AuxDeployment> {
    let mut new_base = old.clone();
    new_base.container = None;

    if let Some(image) = &request.image {
        if image != &old.image {
            image::validate_image(&module.image_patterns, image)?;
        }
        new_base.image = image.clone();
    }
    if let Some(name) = &request.name {
        new_base.name = name.clone();
    }
    if request.incremental {
        new_base.labels.extend(request.labels.clone());
        new_base.configs.extend(request.configs.clone());
        new_base.volumes.extend(request.volumes.clone());
    } else {
        new_base.labels = request.labels.clone();
        new_base.configs = request.configs.clone();
        new_base.volumes = request.volumes.clone();
    }
    if let Some(run_config) = &request.run_config {
        new_base.run_config = run_config.clone();
    }
    Ok(new_base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_core::module::ConfigValue;
    use berth_core::types::RunConfigOverride;

    fn record() -> AuxDeployment {
        AuxDeployment {
            id: "aux-1".into(),
            deployment_id: "dep-1".into(),
            service_ref: "collector".into(),
            name: "collector".into(),
            image: "ghcr.io/org/collector:1".into(),
            labels: HashMap::from([("a".to_string(), "1".to_string())]),
            configs: HashMap::from([("X".to_string(), ConfigValue::Text("x".into()))]),
            volumes: HashMap::from([("spool".to_string(), "/spool".to_string())]),
            run_config: RunConfigOverride::default(),
            enabled: true,
            created_at: 0,
            updated_at: 0,
            container: Some(ContainerRecord {
                container_id: "ctr-1".into(),
                alias: "alias-1".into(),
            }),
        }
    }

    fn module() -> ModuleDefinition {
        ModuleDefinition {
            name: "analytics".into(),
            image_patterns: vec!["ghcr.io/org/*".into()],
            configs: HashMap::new(),
            volumes: Default::default(),
            aux_services: HashMap::new(),
        }
    }

    #[test]
    fn authorize_rejects_wrong_parent() {
        let aux = record();
        assert!(authorize("dep-1", &aux).is_ok());
        assert!(matches!(
            authorize("dep-2", &aux),
            Err(AuxError::Forbidden(_))
        ));
    }

    #[test]
    fn resolve_update_replaces_maps_wholesale_by_default() {
        let old = record();
        let request = UpdateAuxRequest {
            labels: HashMap::from([("b".to_string(), "2".to_string())]),
            ..UpdateAuxRequest::default()
        };
        let resolved = resolve_update(&old, &module(), &request).unwrap();
        assert_eq!(resolved.labels.len(), 1);
        assert_eq!(resolved.labels["b"], "2");
        assert!(resolved.configs.is_empty());
        assert!(resolved.volumes.is_empty());
        // Carried over untouched.
        assert!(resolved.enabled);
        assert!(resolved.container.is_none());
    }

    #[test]
    fn resolve_update_merges_when_incremental() {
        let old = record();
        let request = UpdateAuxRequest {
            labels: HashMap::from([("b".to_string(), "2".to_string())]),
            volumes: HashMap::from([("extra".to_string(), "/extra".to_string())]),
            incremental: true,
            ..UpdateAuxRequest::default()
        };
        let resolved = resolve_update(&old, &module(), &request).unwrap();
        assert_eq!(resolved.labels.len(), 2);
        assert_eq!(resolved.volumes.len(), 2);
        assert_eq!(resolved.configs.len(), 1);
    }

    #[test]
    fn resolve_update_validates_changed_image_only() {
        let old = record();
        let request = UpdateAuxRequest {
            image: Some("docker.io/other/app:1".into()),
            ..UpdateAuxRequest::default()
        };
        assert!(matches!(
            resolve_update(&old, &module(), &request),
            Err(AuxError::InvalidInput(_))
        ));

        // The unchanged image is accepted even if the allow-list has
        // since shifted.
        let mut shifted = module();
        shifted.image_patterns = vec!["docker.io/other/*".into()];
        let request = UpdateAuxRequest {
            image: Some(old.image.clone()),
            ..UpdateAuxRequest::default()
        };
        assert!(resolve_update(&old, &shifted, &request).is_ok());
    }

    #[test]
    fn resolve_update_applies_run_config_and_name() {
        let old = record();
        let request = UpdateAuxRequest {
            name: Some("renamed".into()),
            run_config: Some(RunConfigOverride {
                command: Some("collector --debug".into()),
                pseudo_tty: Some(true),
            }),
            ..UpdateAuxRequest::default()
        };
        let resolved = resolve_update(&old, &module(), &request).unwrap();
        assert_eq!(resolved.name, "renamed");
        assert_eq!(resolved.run_config.pseudo_tty, Some(true));
    }
}
