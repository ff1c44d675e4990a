use clap::Parser;

use crate::color::{Config, Temperature};

/// The original `sct` accepts `-r` as its first argument to mean "as warm as
/// possible", so we keep that spelling instead of a proper flag.
const RESET_ARG: &str = "-r";

#[derive(Parser, Debug, Clone)]
#[command(
	name = "wlsct",
	version,
	about = "Set the screen color temperature and brightness"
)]
pub struct Opts {
	/// Color temperature in Kelvin (500-10000), or `-r` to reset to the warmest
	/// temperature. Invalid or missing values fall back to 6500.
	#[arg(allow_hyphen_values = true)]
	pub temperature: Option<String>,

	/// Brightness multiplier (0.1-1.0). Invalid or missing values fall back to
	/// 1.0.
	#[arg(allow_hyphen_values = true)]
	pub brightness: Option<String>,
}

impl Opts {
	/// Unparseable or out-of-range arguments coerce silently to the defaults
	/// rather than erroring, matching `atoi`/`atof` leniency.
	#[must_use]
	pub fn config(&self) -> Config {
		let temperature = match self.temperature.as_deref() {
			Some(RESET_ARG) => Some(Temperature::MIN.get()),
			Some(raw) => raw.parse().ok(),
			None => None,
		};
		let brightness = self
			.brightness
			.as_deref()
			.and_then(|raw| raw.parse().ok());
		Config::coerced(temperature, brightness)
	}
}
