use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::os::fd::AsFd;

use nix::sys::memfd::{memfd_create, MemFdCreateFlag};
use thiserror::Error;
use wayland_client::protocol::{wl_output, wl_registry};
use wayland_client::{
	delegate_noop, ConnectError, Connection, Dispatch, DispatchError, EventQueue, QueueHandle,
};
use wayland_protocols_wlr::gamma_control::v1::client::{
	zwlr_gamma_control_manager_v1, zwlr_gamma_control_v1,
};

use crate::color::{Config, GammaRamps};
use crate::util::cstr;

#[derive(Debug, Error)]
pub enum Error {
	#[error("connecting to the wayland display (is WAYLAND_DISPLAY set correctly?)")]
	Connect(#[from] ConnectError),
	#[error("wayland dispatch failed")]
	Dispatch(#[from] DispatchError),
	#[error("compositor does not support wlr-gamma-control-unstable-v1")]
	GammaControlUnsupported,
	#[error("preparing a gamma ramp buffer")]
	RampBuffer(#[from] std::io::Error),
}

const ZWLR_GAMMA_CONTROL_MANAGER_V1_VERSION: u32 = 1;
const WL_OUTPUT_VERSION: u32 = 4;

#[derive(Debug)]
struct Control {
	proxy: zwlr_gamma_control_v1::ZwlrGammaControlV1,
	ramp_size: Option<u32>,
}

#[derive(Debug)]
struct Output {
	output: wl_output::WlOutput,
	name: Option<String>,
	control: Option<Control>,
}

impl Output {
	fn label(&self) -> &str {
		self.name.as_deref().unwrap_or("(unnamed)")
	}
}

#[derive(Debug, Default)]
struct State {
	gamma_manager: Option<zwlr_gamma_control_manager_v1::ZwlrGammaControlManagerV1>,
	outputs: Vec<Output>,
}

impl Dispatch<wl_registry::WlRegistry, ()> for State {
	fn event(
		state: &mut Self,
		registry: &wl_registry::WlRegistry,
		event: wl_registry::Event,
		_data: &(),
		_connection: &Connection,
		handle: &QueueHandle<Self>,
	) {
		let wl_registry::Event::Global {
			name, interface, ..
		} = event
		else {
			return;
		};

		match interface.as_str() {
			"zwlr_gamma_control_manager_v1" => {
				let proxy = registry.bind(name, ZWLR_GAMMA_CONTROL_MANAGER_V1_VERSION, handle, ());
				state.gamma_manager = Some(proxy);
			}
			"wl_output" => {
				let proxy = registry.bind(name, WL_OUTPUT_VERSION, handle, ());
				state.outputs.push(Output {
					output: proxy,
					name: None,
					control: None,
				});
			}
			_ => {}
		}
	}
}

impl Dispatch<wl_output::WlOutput, ()> for State {
	fn event(
		state: &mut Self,
		proxy: &wl_output::WlOutput,
		event: wl_output::Event,
		_data: &(),
		_connection: &Connection,
		_handle: &QueueHandle<Self>,
	) {
		if let wl_output::Event::Name { name } = event {
			if let Some(output) = state
				.outputs
				.iter_mut()
				.find(|output| output.output == *proxy)
			{
				output.name = Some(name);
			}
		}
	}
}

delegate_noop!(State: ignore zwlr_gamma_control_manager_v1::ZwlrGammaControlManagerV1);

impl Dispatch<zwlr_gamma_control_v1::ZwlrGammaControlV1, ()> for State {
	fn event(
		state: &mut Self,
		proxy: &zwlr_gamma_control_v1::ZwlrGammaControlV1,
		event: zwlr_gamma_control_v1::Event,
		_data: &(),
		_connection: &Connection,
		_handle: &QueueHandle<Self>,
	) {
		let Some(output) = state.outputs.iter_mut().find(|output| {
			output
				.control
				.as_ref()
				.is_some_and(|control| control.proxy == *proxy)
		}) else {
			return;
		};

		match event {
			zwlr_gamma_control_v1::Event::GammaSize { size } => {
				if let Some(control) = &mut output.control {
					control.ramp_size = Some(size);
				}
			}
			zwlr_gamma_control_v1::Event::Failed => {
				tracing::warn!(
					output = output.label(),
					"compositor rejected the gamma control; skipping this output"
				);
				output.control = None;
			}
			_ => {}
		}
	}
}

/// A connection to the display server with one gamma control per output.
pub struct Display {
	event_queue: EventQueue<State>,
	state: State,
}

impl Display {
	/// Connects and enumerates outputs. The first roundtrip collects the
	/// registry globals, the second collects each control's ramp size along
	/// with the output names.
	pub fn open() -> Result<Self, Error> {
		let connection = Connection::connect_to_env()?;
		let mut event_queue = connection.new_event_queue();
		let handle = event_queue.handle();
		let _registry = connection.display().get_registry(&handle, ());

		let mut state = State::default();
		event_queue.roundtrip(&mut state)?;

		let gamma_manager = state
			.gamma_manager
			.clone()
			.ok_or(Error::GammaControlUnsupported)?;
		for output in &mut state.outputs {
			let proxy = gamma_manager.get_gamma_control(&output.output, &handle, ());
			output.control = Some(Control {
				proxy,
				ramp_size: None,
			});
		}
		event_queue.roundtrip(&mut state)?;

		tracing::debug!(outputs = state.outputs.len(), "display ready");
		Ok(Self { event_queue, state })
	}

	/// Builds and submits one gamma ramp per output. Each ramp buffer is
	/// scoped to its own submission. An output whose control was rejected is
	/// skipped; that never fails the whole run.
	pub fn apply(&mut self, config: Config) -> Result<(), Error> {
		for output in &self.state.outputs {
			let Some(control) = &output.control else {
				continue;
			};
			let Some(ramp_size) = control.ramp_size else {
				tracing::warn!(
					output = output.label(),
					"no ramp size reported; skipping this output"
				);
				continue;
			};

			let mut ramps = GammaRamps::new(ramp_size as usize);
			config.write_ramps(&mut ramps);

			let mut ramps_fd: File = memfd_create(cstr!("gamma-ramps"), MemFdCreateFlag::MFD_CLOEXEC)
				.map_err(std::io::Error::from)?
				.into();
			ramps_fd.write_all(ramps.as_bytes())?;
			ramps_fd.seek(SeekFrom::Start(0))?;

			tracing::debug!(output = output.label(), ramp_size, "submitting gamma ramps");
			control.proxy.set_gamma(ramps_fd.as_fd());
		}

		// Flushes the submissions; a control that fails here is logged by the
		// dispatch handler.
		self.event_queue.roundtrip(&mut self.state)?;
		Ok(())
	}
}
