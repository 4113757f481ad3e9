//! Domain configurators for omnichain application deployments.
//!
//! Each configurator implements one idempotent reconciliation rule: read
//! the current on-chain value, compare it to the declared value using the
//! appropriate equality (exact, semantic, or explicit-vs-default), and emit
//! exactly one corrective transaction when they differ. Running a
//! configurator against already-matching state always yields an empty
//! plan.
//!
//! [`configure_oapp`] composes the rules in real dependency order: library
//! registration precedes selection, selection precedes per-library
//! configuration, and delegate handover runs last.

use crate::combinators::{configure_edges, configure_nodes, ConfigureMultiple};
use crate::{ConfigureError, Configurator};
use async_trait::async_trait;
use futures::FutureExt;
use omni_sdk::{EnforcedOptionParam, OAppFactory, SdkError};
use omni_types::{
	addresses_equal, enforced_options_by_msg_type, normalize_address, OAppEdgeConfig,
	OAppNodeConfig, OmniAddress, OmniGraph, OmniPoint, OmniTransaction, OmniVector, SetConfig,
	SetConfigParam,
};
use std::collections::{HashMap, HashSet};

/// The omnigraph shape all OApp configurators operate on.
pub type OAppGraph = OmniGraph<OAppNodeConfig, OAppEdgeConfig>;

fn node_error(point: &OmniPoint, source: SdkError) -> ConfigureError {
	ConfigureError::Node {
		point: point.clone(),
		source,
	}
}

fn edge_error(vector: &OmniVector, source: SdkError) -> ConfigureError {
	ConfigureError::Edge {
		vector: vector.clone(),
		source,
	}
}

/// Ensures every message library named by an edge is registered with the
/// sender's endpoint before any selection happens.
pub struct ConfigureLibraryRegistrations;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureLibraryRegistrations {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		let mut seen: HashSet<(OmniPoint, OmniAddress)> = HashSet::new();
		let mut transactions = Vec::new();

		for edge in &graph.connections {
			let mut libraries = Vec::new();
			if let Some(lib) = &edge.config.send_library {
				libraries.push(lib.clone());
			}
			if let Some(config) = &edge.config.receive_library_config {
				libraries.push(config.receive_library.clone());
			}
			if libraries.is_empty() {
				continue;
			}

			let vector = &edge.vector;
			let sdk = factory
				.create(&vector.from)
				.await
				.map_err(|e| edge_error(vector, e))?;
			let endpoint = sdk.endpoint().await.map_err(|e| edge_error(vector, e))?;

			for lib in libraries {
				if !seen.insert((vector.from.clone(), normalize_address(&lib))) {
					continue;
				}
				if endpoint
					.is_registered_library(&lib)
					.await
					.map_err(|e| edge_error(vector, e))?
				{
					continue;
				}

				tracing::debug!(point = %vector.from, library = %lib, "Registering library");
				transactions.push(
					endpoint
						.register_library(&lib)
						.await
						.map_err(|e| edge_error(vector, e))?,
				);
			}
		}

		Ok(transactions)
	}
}

/// Links each connection's peer on the sending side.
pub struct ConfigurePeers;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigurePeers {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		configure_edges(graph, factory, |edge, sdk| {
			let vector = edge.vector.clone();
			async move {
				tracing::debug!(vector = %vector, "Checking peer");
				if sdk.has_peer(vector.to.eid, &vector.to.address).await? {
					return Ok(None);
				}

				tracing::debug!(vector = %vector, "Creating connection");
				Ok(Some(vec![
					sdk.set_peer(vector.to.eid, &vector.to.address).await?,
				]))
			}
			.boxed()
		})
		.await
	}
}

/// Selects the declared send library for each connection.
///
/// A connection falling back on the endpoint default is always
/// reconfigured, even when the default happens to equal the declared
/// library, because defaults can be rotated underneath the application.
pub struct ConfigureSendLibraries;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureSendLibraries {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		configure_edges(graph, factory, |edge, sdk| {
			let vector = edge.vector.clone();
			let declared = edge.config.send_library.clone();
			async move {
				let Some(declared) = declared else {
					return Ok(None);
				};

				let endpoint = sdk.endpoint().await?;
				let is_default = endpoint
					.is_default_send_library(&vector.from.address, vector.to.eid)
					.await?;
				let current = endpoint
					.get_send_library(&vector.from.address, vector.to.eid)
					.await?;

				if !is_default
					&& current
						.as_deref()
						.is_some_and(|lib| addresses_equal(lib, &declared))
				{
					return Ok(None);
				}

				tracing::debug!(vector = %vector, library = %declared, "Setting send library");
				Ok(Some(vec![
					endpoint
						.set_send_library(&vector.from.address, vector.to.eid, &declared)
						.await?,
				]))
			}
			.boxed()
		})
		.await
	}
}

/// Selects the declared receive library for each connection.
pub struct ConfigureReceiveLibraries;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureReceiveLibraries {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		configure_edges(graph, factory, |edge, sdk| {
			let vector = edge.vector.clone();
			let declared = edge.config.receive_library_config.clone();
			async move {
				let Some(declared) = declared else {
					return Ok(None);
				};

				let endpoint = sdk.endpoint().await?;
				let (current, is_default) = endpoint
					.get_receive_library(&vector.from.address, vector.to.eid)
					.await?;

				if !is_default
					&& current
						.as_deref()
						.is_some_and(|lib| addresses_equal(lib, &declared.receive_library))
				{
					return Ok(None);
				}

				tracing::debug!(
					vector = %vector,
					library = %declared.receive_library,
					"Setting receive library"
				);
				Ok(Some(vec![
					endpoint
						.set_receive_library(
							&vector.from.address,
							vector.to.eid,
							&declared.receive_library,
							declared.grace_period,
						)
						.await?,
				]))
			}
			.boxed()
		})
		.await
	}
}

/// Applies the declared fallback window for rotated-out receive libraries.
pub struct ConfigureReceiveLibraryTimeouts;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureReceiveLibraryTimeouts {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		configure_edges(graph, factory, |edge, sdk| {
			let vector = edge.vector.clone();
			let declared = edge.config.receive_library_timeout_config.clone();
			async move {
				let Some(declared) = declared else {
					return Ok(None);
				};

				let endpoint = sdk.endpoint().await?;
				let current = endpoint
					.get_receive_library_timeout(&vector.from.address, vector.to.eid)
					.await?;

				if current.is_some_and(|timeout| timeout.matches(&declared)) {
					return Ok(None);
				}

				tracing::debug!(vector = %vector, "Setting receive library timeout");
				Ok(Some(vec![
					endpoint
						.set_receive_library_timeout(
							&vector.from.address,
							vector.to.eid,
							&declared.lib,
							declared.expiry,
						)
						.await?,
				]))
			}
			.boxed()
		})
		.await
	}
}

/// Applies declared executor and ULN settings for the sending direction.
///
/// Writes are batched per sender and send library so each pair produces at
/// most one `set_config` transaction.
pub struct ConfigureSendConfig;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureSendConfig {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		let mut order: Vec<(OmniPoint, OmniAddress)> = Vec::new();
		let mut batches: HashMap<(OmniPoint, OmniAddress), Vec<SetConfigParam>> = HashMap::new();

		for edge in &graph.connections {
			let Some(send_config) = &edge.config.send_config else {
				continue;
			};
			if send_config.executor_config.is_none() && send_config.uln_config.is_none() {
				continue;
			}

			let vector = &edge.vector;
			let sdk = factory
				.create(&vector.from)
				.await
				.map_err(|e| edge_error(vector, e))?;
			let endpoint = sdk.endpoint().await.map_err(|e| edge_error(vector, e))?;

			let library = match &edge.config.send_library {
				Some(lib) => Some(lib.clone()),
				None => endpoint
					.get_send_library(&vector.from.address, vector.to.eid)
					.await
					.map_err(|e| edge_error(vector, e))?,
			};
			let Some(library) = library else {
				return Err(ConfigureError::MissingSendLibrary {
					vector: vector.clone(),
				});
			};

			let key = (vector.from.clone(), normalize_address(&library));
			let push = |param: SetConfigParam,
			                batches: &mut HashMap<(OmniPoint, OmniAddress), Vec<SetConfigParam>>,
			                order: &mut Vec<(OmniPoint, OmniAddress)>| {
				let batch = batches.entry(key.clone()).or_default();
				if batch.is_empty() {
					order.push(key.clone());
				}
				batch.push(param);
			};

			if let Some(executor) = &send_config.executor_config {
				// The check is against the app's explicit config, never the
				// effective value merged with endpoint defaults
				let applied = endpoint
					.has_app_executor_config(&vector.from.address, &library, vector.to.eid, executor)
					.await
					.map_err(|e| edge_error(vector, e))?;
				if !applied {
					push(
						SetConfigParam {
							eid: vector.to.eid,
							config: SetConfig::Executor(executor.clone()),
						},
						&mut batches,
						&mut order,
					);
				}
			}

			if let Some(uln) = &send_config.uln_config {
				let applied = endpoint
					.has_app_uln_config(&vector.from.address, &library, vector.to.eid, uln)
					.await
					.map_err(|e| edge_error(vector, e))?;
				if !applied {
					push(
						SetConfigParam {
							eid: vector.to.eid,
							config: SetConfig::Uln(uln.clone()),
						},
						&mut batches,
						&mut order,
					);
				}
			}
		}

		build_set_config_transactions(order, batches, factory).await
	}
}

/// Applies declared ULN settings for the receiving direction, batched per
/// receiver and receive library.
pub struct ConfigureReceiveConfig;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureReceiveConfig {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		let mut order: Vec<(OmniPoint, OmniAddress)> = Vec::new();
		let mut batches: HashMap<(OmniPoint, OmniAddress), Vec<SetConfigParam>> = HashMap::new();

		for edge in &graph.connections {
			let Some(receive_config) = &edge.config.receive_config else {
				continue;
			};
			let Some(uln) = &receive_config.uln_config else {
				continue;
			};

			let vector = &edge.vector;
			let sdk = factory
				.create(&vector.from)
				.await
				.map_err(|e| edge_error(vector, e))?;
			let endpoint = sdk.endpoint().await.map_err(|e| edge_error(vector, e))?;

			let library = match &edge.config.receive_library_config {
				Some(config) => Some(config.receive_library.clone()),
				None => endpoint
					.get_receive_library(&vector.from.address, vector.to.eid)
					.await
					.map_err(|e| edge_error(vector, e))?
					.0,
			};
			let Some(library) = library else {
				return Err(ConfigureError::MissingReceiveLibrary {
					vector: vector.clone(),
				});
			};

			let applied = endpoint
				.has_app_uln_config(&vector.from.address, &library, vector.to.eid, uln)
				.await
				.map_err(|e| edge_error(vector, e))?;
			if applied {
				continue;
			}

			let key = (vector.from.clone(), normalize_address(&library));
			let batch = batches.entry(key.clone()).or_default();
			if batch.is_empty() {
				order.push(key);
			}
			batch.push(SetConfigParam {
				eid: vector.to.eid,
				config: SetConfig::Uln(uln.clone()),
			});
		}

		build_set_config_transactions(order, batches, factory).await
	}
}

async fn build_set_config_transactions(
	order: Vec<(OmniPoint, OmniAddress)>,
	mut batches: HashMap<(OmniPoint, OmniAddress), Vec<SetConfigParam>>,
	factory: &dyn OAppFactory,
) -> Result<Vec<OmniTransaction>, ConfigureError> {
	let mut transactions = Vec::new();

	for key in order {
		let Some(params) = batches.remove(&key) else {
			continue;
		};
		let (point, library) = key;

		let sdk = factory
			.create(&point)
			.await
			.map_err(|e| node_error(&point, e))?;
		let endpoint = sdk.endpoint().await.map_err(|e| node_error(&point, e))?;

		tracing::debug!(point = %point, library = %library, writes = params.len(), "Applying config");
		transactions.push(
			endpoint
				.set_config(&point.address, &library, params)
				.await
				.map_err(|e| node_error(&point, e))?,
		);
	}

	Ok(transactions)
}

/// Applies declared enforced-option presets, merged per message type and
/// batched into one transaction per sender.
pub struct ConfigureEnforcedOptions;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureEnforcedOptions {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		let mut order: Vec<OmniPoint> = Vec::new();
		let mut params_by_point: HashMap<OmniPoint, Vec<EnforcedOptionParam>> = HashMap::new();

		for edge in &graph.connections {
			let Some(declared) = &edge.config.enforced_options else {
				continue;
			};

			let vector = &edge.vector;
			let merged = enforced_options_by_msg_type(declared)?;
			let sdk = factory
				.create(&vector.from)
				.await
				.map_err(|e| edge_error(vector, e))?;

			for (msg_type, encoded) in merged {
				let current = sdk
					.get_enforced_options(vector.to.eid, msg_type)
					.await
					.map_err(|e| edge_error(vector, e))?;

				if current.eq_ignore_ascii_case(&encoded) {
					continue;
				}

				let batch = params_by_point.entry(vector.from.clone()).or_default();
				if batch.is_empty() {
					order.push(vector.from.clone());
				}
				batch.push(EnforcedOptionParam {
					eid: vector.to.eid,
					msg_type,
					options: encoded,
				});
			}
		}

		let mut transactions = Vec::new();
		for point in order {
			let Some(params) = params_by_point.remove(&point) else {
				continue;
			};

			let sdk = factory
				.create(&point)
				.await
				.map_err(|e| node_error(&point, e))?;

			tracing::debug!(point = %point, presets = params.len(), "Applying enforced options");
			transactions.push(
				sdk.set_enforced_options(params)
					.await
					.map_err(|e| node_error(&point, e))?,
			);
		}

		Ok(transactions)
	}
}

/// Toggles declared read channels per deployment.
///
/// Only meaningful for read-enabled deployments; nodes that declare no
/// channels are left alone. A channel entry with no explicit state is
/// treated as active.
pub struct ConfigureReadChannels;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureReadChannels {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		configure_nodes(graph, factory, |node, sdk| {
			let point = node.point.clone();
			let declared = node.config.read_channel_configs.clone();
			async move {
				let Some(declared) = declared else {
					return Ok(None);
				};

				let mut transactions = Vec::new();
				for channel in declared {
					let desired = channel.is_active();
					if sdk.is_read_channel_active(channel.channel_id).await? == desired {
						continue;
					}

					tracing::debug!(
						point = %point,
						channel = channel.channel_id,
						active = desired,
						"Setting read channel"
					);
					transactions.push(sdk.set_read_channel(channel.channel_id, desired).await?);
				}

				Ok(Some(transactions))
			}
			.boxed()
		})
		.await
	}
}

/// Applies the declared caller fee cap per deployment.
pub struct ConfigureCallerBpsCap;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureCallerBpsCap {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		configure_nodes(graph, factory, |node, sdk| {
			let declared = node.config.caller_bps_cap;
			async move {
				let Some(declared) = declared else {
					return Ok(None);
				};

				if sdk.get_caller_bps_cap().await? == Some(declared) {
					return Ok(None);
				}

				Ok(Some(vec![sdk.set_caller_bps_cap(declared).await?]))
			}
			.boxed()
		})
		.await
	}
}

/// Hands configuration rights to the declared delegate per deployment.
pub struct ConfigureDelegates;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureDelegates {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		configure_nodes(graph, factory, |node, sdk| {
			let point = node.point.clone();
			let declared = node.config.delegate.clone();
			async move {
				let Some(declared) = declared else {
					tracing::debug!(point = %point, "Delegate not declared, skipping");
					return Ok(None);
				};

				if sdk.is_delegate(&declared).await? {
					tracing::debug!(point = %point, delegate = %declared, "Delegate already set");
					return Ok(None);
				}

				tracing::debug!(point = %point, delegate = %declared, "Setting delegate");
				Ok(Some(vec![sdk.set_delegate(&declared).await?]))
			}
			.boxed()
		})
		.await
	}
}

/// Transfers ownership to the declared owner per deployment.
pub struct ConfigureOwners;

#[async_trait]
impl Configurator<OAppNodeConfig, OAppEdgeConfig> for ConfigureOwners {
	async fn configure(
		&self,
		graph: &OAppGraph,
		factory: &dyn OAppFactory,
	) -> Result<Vec<OmniTransaction>, ConfigureError> {
		configure_nodes(graph, factory, |node, sdk| {
			let declared = node.config.owner.clone();
			async move {
				let Some(declared) = declared else {
					return Ok(None);
				};

				let current = sdk.get_owner().await?;
				if current.is_some_and(|owner| addresses_equal(&owner, &declared)) {
					return Ok(None);
				}

				Ok(Some(vec![sdk.set_owner(&declared).await?]))
			}
			.boxed()
		})
		.await
	}
}

/// The composed OApp reconciliation plan, in dependency order.
pub fn configure_oapp() -> ConfigureMultiple<OAppNodeConfig, OAppEdgeConfig> {
	ConfigureMultiple::new(vec![
		Box::new(ConfigureLibraryRegistrations),
		Box::new(ConfigurePeers),
		Box::new(ConfigureSendLibraries),
		Box::new(ConfigureReceiveLibraries),
		Box::new(ConfigureReceiveLibraryTimeouts),
		Box::new(ConfigureSendConfig),
		Box::new(ConfigureReceiveConfig),
		Box::new(ConfigureEnforcedOptions),
		Box::new(ConfigureCallerBpsCap),
		Box::new(ConfigureDelegates),
	])
}

/// The composed reconciliation plan for read-enabled deployments.
///
/// Differs from [`configure_oapp`] in that delegate handover runs first
/// and channel activation precedes library selection, since a channel
/// must exist before anything can be configured against it. Library
/// registration is the endpoint owner's concern for read channels, so no
/// registration pass is composed.
pub fn configure_oapp_read() -> ConfigureMultiple<OAppNodeConfig, OAppEdgeConfig> {
	ConfigureMultiple::new(vec![
		Box::new(ConfigureDelegates),
		Box::new(ConfigurePeers),
		Box::new(ConfigureReadChannels),
		Box::new(ConfigureSendLibraries),
		Box::new(ConfigureReceiveLibraries),
		Box::new(ConfigureReceiveLibraryTimeouts),
		Box::new(ConfigureSendConfig),
		Box::new(ConfigureReceiveConfig),
		Box::new(ConfigureEnforcedOptions),
		Box::new(ConfigureCallerBpsCap),
	])
}

/// Ownership transfer as a separate, deliberately-run plan.
pub fn configure_owners() -> ConfigureMultiple<OAppNodeConfig, OAppEdgeConfig> {
	ConfigureMultiple::new(vec![Box::new(ConfigureOwners)])
}
