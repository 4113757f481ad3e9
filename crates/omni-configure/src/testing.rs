//! In-memory chain fakes shared by the configurator tests.

use async_trait::async_trait;
use omni_sdk::{
	EndpointSdk, EnforcedOptionParam, OAppFactory, OAppSdk, SdkError,
};
use omni_types::{
	EndpointId, ExecutorConfig, OmniAddress, OmniPoint, OmniTransaction, SetConfigParam, Timeout,
	UlnConfig,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Scriptable on-chain state for one deployment.
#[derive(Debug, Default, Clone)]
pub struct MockState {
	pub peers: HashMap<EndpointId, OmniAddress>,
	pub delegate: Option<OmniAddress>,
	pub owner: Option<OmniAddress>,
	pub caller_bps_cap: Option<u128>,
	pub enforced_options: HashMap<(EndpointId, u16), String>,
	/// Read channels currently active on the deployment.
	pub read_channels: HashSet<u32>,
	/// Send library per destination, with the default flag.
	pub send_libraries: HashMap<EndpointId, (OmniAddress, bool)>,
	/// Receive library per source, with the default flag.
	pub receive_libraries: HashMap<EndpointId, (OmniAddress, bool)>,
	pub receive_timeouts: HashMap<EndpointId, Timeout>,
	pub registered_libraries: HashSet<OmniAddress>,
	pub app_uln_configs: HashMap<(OmniAddress, EndpointId), UlnConfig>,
	pub app_executor_configs: HashMap<(OmniAddress, EndpointId), ExecutorConfig>,
}

pub struct MockSdk {
	point: OmniPoint,
	state: Arc<Mutex<MockState>>,
}

impl MockSdk {
	fn transaction(&self, data: String) -> OmniTransaction {
		OmniTransaction::new(self.point.clone(), data)
	}
}

#[async_trait]
impl OAppSdk for MockSdk {
	fn point(&self) -> &OmniPoint {
		&self.point
	}

	async fn endpoint(&self) -> Result<Arc<dyn EndpointSdk>, SdkError> {
		Ok(Arc::new(MockEndpoint {
			point: self.point.clone(),
			state: self.state.clone(),
		}))
	}

	async fn has_peer(&self, eid: EndpointId, address: &str) -> Result<bool, SdkError> {
		let state = self.state.lock().unwrap();
		Ok(state.peers.get(&eid).is_some_and(|peer| peer == address))
	}

	async fn set_peer(&self, eid: EndpointId, address: &str) -> Result<OmniTransaction, SdkError> {
		Ok(self.transaction(format!("set_peer:{}:{}", eid, address)))
	}

	async fn get_enforced_options(
		&self,
		eid: EndpointId,
		msg_type: u16,
	) -> Result<String, SdkError> {
		let state = self.state.lock().unwrap();
		Ok(state
			.enforced_options
			.get(&(eid, msg_type))
			.cloned()
			.unwrap_or_else(|| "0x".to_string()))
	}

	async fn set_enforced_options(
		&self,
		params: Vec<EnforcedOptionParam>,
	) -> Result<OmniTransaction, SdkError> {
		let rendered: Vec<String> = params
			.iter()
			.map(|p| format!("{}/{}/{}", p.eid, p.msg_type, p.options))
			.collect();
		Ok(self.transaction(format!("set_enforced_options:{}", rendered.join(","))))
	}

	async fn is_read_channel_active(&self, channel_id: u32) -> Result<bool, SdkError> {
		Ok(self.state.lock().unwrap().read_channels.contains(&channel_id))
	}

	async fn set_read_channel(
		&self,
		channel_id: u32,
		active: bool,
	) -> Result<OmniTransaction, SdkError> {
		Ok(self.transaction(format!("set_read_channel:{}:{}", channel_id, active)))
	}

	async fn is_delegate(&self, delegate: &str) -> Result<bool, SdkError> {
		let state = self.state.lock().unwrap();
		Ok(state.delegate.as_deref() == Some(delegate))
	}

	async fn set_delegate(&self, delegate: &str) -> Result<OmniTransaction, SdkError> {
		Ok(self.transaction(format!("set_delegate:{}", delegate)))
	}

	async fn get_owner(&self) -> Result<Option<OmniAddress>, SdkError> {
		Ok(self.state.lock().unwrap().owner.clone())
	}

	async fn set_owner(&self, owner: &str) -> Result<OmniTransaction, SdkError> {
		Ok(self.transaction(format!("set_owner:{}", owner)))
	}

	async fn get_caller_bps_cap(&self) -> Result<Option<u128>, SdkError> {
		Ok(self.state.lock().unwrap().caller_bps_cap)
	}

	async fn set_caller_bps_cap(&self, cap: u128) -> Result<OmniTransaction, SdkError> {
		Ok(self.transaction(format!("set_caller_bps_cap:{}", cap)))
	}
}

pub struct MockEndpoint {
	point: OmniPoint,
	state: Arc<Mutex<MockState>>,
}

impl MockEndpoint {
	fn transaction(&self, data: String) -> OmniTransaction {
		OmniTransaction::new(self.point.clone(), data)
	}
}

#[async_trait]
impl EndpointSdk for MockEndpoint {
	async fn is_registered_library(&self, lib: &str) -> Result<bool, SdkError> {
		Ok(self.state.lock().unwrap().registered_libraries.contains(lib))
	}

	async fn register_library(&self, lib: &str) -> Result<OmniTransaction, SdkError> {
		Ok(self.transaction(format!("register_library:{}", lib)))
	}

	async fn is_default_send_library(
		&self,
		_sender: &str,
		dst_eid: EndpointId,
	) -> Result<bool, SdkError> {
		let state = self.state.lock().unwrap();
		Ok(state
			.send_libraries
			.get(&dst_eid)
			.is_none_or(|(_, is_default)| *is_default))
	}

	async fn get_send_library(
		&self,
		_sender: &str,
		dst_eid: EndpointId,
	) -> Result<Option<OmniAddress>, SdkError> {
		let state = self.state.lock().unwrap();
		Ok(state.send_libraries.get(&dst_eid).map(|(lib, _)| lib.clone()))
	}

	async fn set_send_library(
		&self,
		_sender: &str,
		dst_eid: EndpointId,
		lib: &str,
	) -> Result<OmniTransaction, SdkError> {
		Ok(self.transaction(format!("set_send_library:{}:{}", dst_eid, lib)))
	}

	async fn get_receive_library(
		&self,
		_receiver: &str,
		src_eid: EndpointId,
	) -> Result<(Option<OmniAddress>, bool), SdkError> {
		let state = self.state.lock().unwrap();
		Ok(match state.receive_libraries.get(&src_eid) {
			Some((lib, is_default)) => (Some(lib.clone()), *is_default),
			None => (None, true),
		})
	}

	async fn set_receive_library(
		&self,
		_receiver: &str,
		src_eid: EndpointId,
		lib: &str,
		grace_period: u64,
	) -> Result<OmniTransaction, SdkError> {
		Ok(self.transaction(format!(
			"set_receive_library:{}:{}:{}",
			src_eid, lib, grace_period
		)))
	}

	async fn get_receive_library_timeout(
		&self,
		_receiver: &str,
		src_eid: EndpointId,
	) -> Result<Option<Timeout>, SdkError> {
		Ok(self.state.lock().unwrap().receive_timeouts.get(&src_eid).cloned())
	}

	async fn set_receive_library_timeout(
		&self,
		_receiver: &str,
		src_eid: EndpointId,
		lib: &str,
		expiry: u64,
	) -> Result<OmniTransaction, SdkError> {
		Ok(self.transaction(format!(
			"set_receive_library_timeout:{}:{}:{}",
			src_eid, lib, expiry
		)))
	}

	async fn has_app_executor_config(
		&self,
		_oapp: &str,
		lib: &str,
		eid: EndpointId,
		config: &ExecutorConfig,
	) -> Result<bool, SdkError> {
		let state = self.state.lock().unwrap();
		Ok(state
			.app_executor_configs
			.get(&(lib.to_string(), eid))
			.is_some_and(|current| current.matches(config)))
	}

	async fn has_app_uln_config(
		&self,
		_oapp: &str,
		lib: &str,
		eid: EndpointId,
		config: &UlnConfig,
	) -> Result<bool, SdkError> {
		let state = self.state.lock().unwrap();
		Ok(state
			.app_uln_configs
			.get(&(lib.to_string(), eid))
			.is_some_and(|current| current.matches(config)))
	}

	async fn set_config(
		&self,
		_oapp: &str,
		lib: &str,
		params: Vec<SetConfigParam>,
	) -> Result<OmniTransaction, SdkError> {
		let rendered: Vec<String> = params
			.iter()
			.map(|p| {
				let kind = match p.config {
					omni_types::SetConfig::Executor(_) => "executor",
					omni_types::SetConfig::Uln(_) => "uln",
				};
				format!("{}/{}", p.eid, kind)
			})
			.collect();
		Ok(self.transaction(format!("set_config:{}:{}", lib, rendered.join(","))))
	}
}

/// Factory handing out [`MockSdk`]s over per-point scripted state.
#[derive(Default)]
pub struct MockFactory {
	states: Mutex<HashMap<OmniPoint, Arc<Mutex<MockState>>>>,
	created: AtomicUsize,
}

impl MockFactory {
	pub fn new() -> Self {
		Self::default()
	}

	/// Scripts the on-chain state for one point.
	pub fn with_state(self, point: OmniPoint, state: MockState) -> Self {
		self.states
			.lock()
			.unwrap()
			.insert(point, Arc::new(Mutex::new(state)));
		self
	}

	/// How many adapter instances this factory has handed out.
	pub fn created(&self) -> usize {
		self.created.load(Ordering::SeqCst)
	}

	fn state_for(&self, point: &OmniPoint) -> Arc<Mutex<MockState>> {
		self.states
			.lock()
			.unwrap()
			.entry(point.clone())
			.or_default()
			.clone()
	}
}

#[async_trait]
impl OAppFactory for MockFactory {
	async fn create(&self, point: &OmniPoint) -> Result<Arc<dyn OAppSdk>, SdkError> {
		self.created.fetch_add(1, Ordering::SeqCst);
		Ok(Arc::new(MockSdk {
			point: point.clone(),
			state: self.state_for(point),
		}))
	}
}
