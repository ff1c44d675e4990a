#![deny(
	absolute_paths_not_starting_with_crate,
	keyword_idents,
	macro_use_extern_crate,
	meta_variable_misuse,
	missing_abi,
	missing_copy_implementations,
	non_ascii_idents,
	nonstandard_style,
	noop_method_call,
	rust_2018_idioms,
	unused_qualifications
)]
#![warn(clippy::pedantic)]
// We do a lot of conversions between floats and integers and precision is not really important.
#![allow(
	clippy::cast_precision_loss,
	clippy::cast_sign_loss,
	clippy::cast_possible_truncation
)]
#![forbid(unsafe_code)]

use anyhow::Context;
use clap::Parser;

use crate::cli::Opts;
use crate::wayland::Display;

mod cli;
mod color;
mod util;
mod wayland;

fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt::init();

	let opts = Opts::parse();
	let config = opts.config();
	tracing::debug!(?config, "requested settings");

	let mut display = Display::open().context("opening the display connection")?;
	display.apply(config).context("applying gamma ramps")?;

	// Note that compositors restore the previous ramps once the gamma control
	// objects go away with our connection.
	Ok(())
}
