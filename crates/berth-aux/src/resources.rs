//! Resource builders.
//!
//! Pure functions turning (module definition, parent deployment,
//! auxiliary record) into the environment, mounts, run-config, and full
//! container spec handed to the engine.

use std::collections::HashMap;

use uuid::Uuid;

use berth_core::labels;
use berth_core::module::{AuxServiceDef, ModuleDefinition, RestartPolicy};
use berth_core::naming;
use berth_core::types::{ParentDeployment, RunConfigOverride};
use berth_engine::{ContainerSpec, Mount};
use berth_state::AuxDeployment;

use crate::error::{AuxError, AuxResult};
use crate::voldiff::DesiredVolume;

/// Reserved env var carrying the parent deployment ID.
pub const ENV_DEPLOYMENT_ID: &str = "BERTH_DEPLOYMENT_ID";
/// Reserved env var carrying the auxiliary deployment ID.
pub const ENV_AUX_ID: &str = "BERTH_AUX_ID";

/// Fallback delimiter for list-typed configs without a declared one.
const DEFAULT_DELIMITER: &str = ",";

/// Resolve module-declared config refs into env pairs.
///
/// A ref var the record overrides directly is skipped here; the
/// override is applied later at higher precedence. Otherwise the value
/// comes from the deployment-level override, then the declared default.
/// A required declaration with neither fails; an optional one is
/// omitted.
fn resolve_config_refs(
    module: &ModuleDefinition,
    svc: &AuxServiceDef,
    parent: &ParentDeployment,
    aux: &AuxDeployment,
) -> AuxResult<Vec<(String, String)>> {
    let mut pairs = Vec::new();
    for (ref_var, config_ref) in &svc.config_refs {
        if aux.configs.contains_key(ref_var) {
            continue;
        }
        let decl = module.configs.get(config_ref).ok_or_else(|| {
            AuxError::Internal(format!(
                "config ref {config_ref} is not declared by module {}",
                module.name
            ))
        })?;
        let value = parent
            .config_overrides
            .get(config_ref)
            .or(decl.default.as_ref());
        match value {
            Some(v) => {
                let delimiter = decl.delimiter.as_deref().unwrap_or(DEFAULT_DELIMITER);
                pairs.push((ref_var.clone(), v.render(delimiter)));
            }
            None if decl.required => {
                return Err(AuxError::Internal(format!(
                    "required config {config_ref} has no value or default"
                )));
            }
            None => {}
        }
    }
    Ok(pairs)
}

/// Assemble the container environment.
///
/// Precedence, lowest to highest: resolved config refs, record-level
/// config overrides, service-reference aliases, external-dependency
/// aliases, and finally the reserved identity variables.
pub fn build_env(
    module: &ModuleDefinition,
    svc: &AuxServiceDef,
    parent: &ParentDeployment,
    aux: &AuxDeployment,
) -> AuxResult<HashMap<String, String>> {
    let mut env = HashMap::new();

    for (var, value) in resolve_config_refs(module, svc, parent, aux)? {
        env.insert(var, value);
    }

    for (ref_var, value) in &aux.configs {
        let delimiter = svc
            .config_refs
            .get(ref_var)
            .and_then(|config_ref| module.configs.get(config_ref))
            .and_then(|decl| decl.delimiter.as_deref())
            .unwrap_or(DEFAULT_DELIMITER);
        env.insert(ref_var.clone(), value.render(delimiter));
    }

    for (var, service) in &svc.service_refs {
        let alias = parent.service_aliases.get(service).ok_or_else(|| {
            AuxError::Internal(format!(
                "service {service} is not defined on deployment {}",
                parent.id
            ))
        })?;
        env.insert(var.clone(), alias.clone());
    }

    for (var, ext) in &svc.external_refs {
        let dep = parent.required.get(&ext.module_ref).ok_or_else(|| {
            AuxError::Internal(format!(
                "required deployment for module {} is missing",
                ext.module_ref
            ))
        })?;
        let alias = dep.service_aliases.get(&ext.service).ok_or_else(|| {
            AuxError::Internal(format!(
                "service {} is not defined on required deployment {}",
                ext.service, dep.id
            ))
        })?;
        env.insert(var.clone(), alias.clone());
    }

    env.insert(ENV_DEPLOYMENT_ID.to_string(), parent.id.clone());
    env.insert(ENV_AUX_ID.to_string(), aux.id.clone());
    Ok(env)
}

/// Compute the full desired volume set for a record: module-level
/// volumes the service mounts (owner = parent deployment), plus
/// record-level volumes (owner = auxiliary deployment).
pub fn desired_volumes(
    module: &ModuleDefinition,
    svc: &AuxServiceDef,
    deployment_id: &str,
    aux: &AuxDeployment,
) -> Vec<DesiredVolume> {
    let mut volumes = Vec::new();
    for mount in &svc.mounts.volumes {
        if !module.volumes.contains(&mount.volume_ref) {
            continue;
        }
        volumes.push(DesiredVolume {
            name: naming::volume_name(deployment_id, &mount.volume_ref),
            volume_ref: mount.volume_ref.clone(),
            target: mount.target.clone(),
        });
    }
    for (volume_ref, target) in &aux.volumes {
        volumes.push(DesiredVolume {
            name: naming::volume_name(&aux.id, volume_ref),
            volume_ref: volume_ref.clone(),
            target: target.clone(),
        });
    }
    volumes.sort_by(|a, b| a.name.cmp(&b.name));
    volumes
}

/// Assemble the mount list: desired volumes, bind mounts, tmpfs mounts.
pub fn build_mounts(
    svc: &AuxServiceDef,
    parent: &ParentDeployment,
    desired: &[DesiredVolume],
) -> Vec<Mount> {
    let mut mounts: Vec<Mount> = desired
        .iter()
        .map(|v| Mount::Volume {
            name: v.name.clone(),
            target: v.target.clone(),
        })
        .collect();
    for bind in &svc.mounts.binds {
        mounts.push(Mount::Bind {
            source: parent.host_root.join(&parent.dir).join(&bind.source),
            target: bind.target.clone(),
            read_only: bind.read_only,
        });
    }
    for tmpfs in &svc.mounts.tmpfs {
        mounts.push(Mount::Tmpfs {
            target: tmpfs.target.clone(),
            size_bytes: tmpfs.size_bytes,
            mode: tmpfs.mode,
        });
    }
    mounts
}

/// Effective run-config after applying record overrides to the module
/// defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub command: Vec<String>,
    pub restart: RestartPolicy,
    pub max_retries: u32,
    pub stop_timeout_secs: u64,
    pub stop_signal: String,
    pub pseudo_tty: bool,
}

/// Apply record overrides to the module's run-config defaults.
///
/// A command override is tokenized on whitespace; quoting is not
/// interpreted.
pub fn build_run_config(svc: &AuxServiceDef, overrides: &RunConfigOverride) -> RunConfig {
    let defaults = &svc.run_config;
    let command = match &overrides.command {
        Some(cmd) => cmd.split_whitespace().map(str::to_string).collect(),
        None => defaults.command.clone(),
    };
    RunConfig {
        command,
        restart: defaults.restart,
        max_retries: defaults.max_retries,
        stop_timeout_secs: defaults.stop_timeout_secs,
        stop_signal: defaults.stop_signal.clone(),
        pseudo_tty: overrides.pseudo_tty.unwrap_or(defaults.pseudo_tty),
    }
}

/// Labels attached to a volume owned by an auxiliary deployment.
pub fn volume_labels(
    core_id: &str,
    manager_id: &str,
    deployment_id: &str,
    aux_id: &str,
    volume_ref: &str,
) -> HashMap<String, String> {
    HashMap::from([
        (labels::CORE_ID.to_string(), core_id.to_string()),
        (labels::MANAGER_ID.to_string(), manager_id.to_string()),
        (labels::DEPLOYMENT_ID.to_string(), deployment_id.to_string()),
        (labels::AUX_ID.to_string(), aux_id.to_string()),
        (labels::VOLUME_REF.to_string(), volume_ref.to_string()),
    ])
}

/// Build the full container spec for a record.
pub fn build_container_spec(
    module: &ModuleDefinition,
    svc: &AuxServiceDef,
    parent: &ParentDeployment,
    aux: &AuxDeployment,
    desired: &[DesiredVolume],
    core_id: &str,
    manager_id: &str,
) -> AuxResult<ContainerSpec> {
    let env = build_env(module, svc, parent, aux)?;
    let mounts = build_mounts(svc, parent, desired);
    let run = build_run_config(svc, &aux.run_config);
    let alias = naming::container_alias(&aux.id, &aux.service_ref);

    let mut container_labels = aux.labels.clone();
    container_labels.insert(labels::CORE_ID.to_string(), core_id.to_string());
    container_labels.insert(labels::MANAGER_ID.to_string(), manager_id.to_string());
    container_labels.insert(labels::DEPLOYMENT_ID.to_string(), aux.deployment_id.clone());
    container_labels.insert(labels::AUX_ID.to_string(), aux.id.clone());
    container_labels.insert(labels::SERVICE_REF.to_string(), aux.service_ref.clone());

    Ok(ContainerSpec {
        name: container_name(&alias),
        alias,
        image: aux.image.clone(),
        command: run.command,
        env,
        labels: container_labels,
        mounts,
        restart: run.restart,
        max_retries: run.max_retries,
        stop_timeout_secs: run.stop_timeout_secs,
        stop_signal: run.stop_signal,
        pseudo_tty: run.pseudo_tty,
    })
}

/// Engine-side container name: the stable alias plus a per-generation
/// nonce, so the old and new containers can coexist during an update
/// swap.
fn container_name(alias: &str) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    format!("{alias}-{}", &nonce[..8])
}
