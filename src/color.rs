use crate::util::lerp;

/// Kelvins, restricted to the range covered by the whitepoint table (invariant).
///
/// Because the only constructor validates the range, the table index arithmetic
/// in `white_point` can never go out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temperature(u32);

impl Temperature {
	pub const MAX: Self = Self(10_000);
	pub const MIN: Self = Self(500);
	pub const NEUTRAL: Self = Self(6500);

	pub fn new(kelvin: u32) -> Option<Self> {
		(Self::MIN.0..=Self::MAX.0)
			.contains(&kelvin)
			.then_some(Self(kelvin))
	}

	pub fn get(self) -> u32 {
		self.0
	}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
	temperature: Temperature,
	/// 0.1..=1.0 (invariant) where 1.0 is full brightness.
	brightness: f32,
}

const BRIGHTNESS_RANGE: std::ops::RangeInclusive<f32> = 0.1..=1.0;

impl Config {
	/// Out-of-range or absent values fall back to the defaults, each field
	/// independently. This never fails and emits no diagnostic.
	pub fn coerced(temperature: Option<u32>, brightness: Option<f32>) -> Self {
		Self {
			temperature: temperature
				.and_then(Temperature::new)
				.unwrap_or(Temperature::NEUTRAL),
			brightness: brightness
				.filter(|brightness| BRIGHTNESS_RANGE.contains(brightness))
				.unwrap_or(1.0),
		}
	}

	fn channel_gains(self) -> [f32; 3] {
		let white_point = white_point(self.temperature);
		[white_point.red, white_point.green, white_point.blue].map(|v| v * self.brightness)
	}

	pub fn write_ramps(self, ramps: &mut GammaRamps) {
		let gains = self.channel_gains().map(f64::from);
		let size = ramps.ramp_size();
		let [red, green, blue] = ramps.channels_mut();
		for i in 0..size {
			let base = 65535.0 * i as f64 / size as f64;
			// These casts are saturating, which also covers the top row if the
			// product ever rounds past 65535.
			red[i] = (base * gains[0]) as u16;
			green[i] = (base * gains[1]) as u16;
			blue[i] = (base * gains[2]) as u16;
		}
	}
}

impl Default for Config {
	fn default() -> Self {
		Self {
			temperature: Temperature::NEUTRAL,
			brightness: 1.0,
		}
	}
}

/// Gamma ramp buffer for one output controller.
pub struct GammaRamps {
	/// Invariant: `data.len() == ramp_size * 3`, laid out as three consecutive
	/// channel sections: red, green, blue. This is the layout the compositor
	/// reads back out of the ramp fd.
	data: Box<[u16]>,
}

impl GammaRamps {
	pub fn new(ramp_size: usize) -> Self {
		Self {
			data: vec![0; ramp_size * 3].into(),
		}
	}

	fn ramp_size(&self) -> usize {
		self.data.len() / 3
	}

	fn channels_mut(&mut self) -> [&mut [u16]; 3] {
		let ramp_size = self.ramp_size();
		let (red, rest) = self.data.split_at_mut(ramp_size);
		let (green, blue) = rest.split_at_mut(ramp_size);
		[red, green, blue]
	}

	pub fn as_bytes(&self) -> &[u8] {
		bytemuck::cast_slice(&self.data)
	}
}

#[derive(Debug, Clone, Copy)]
struct ColorF32 {
	red: f32,
	green: f32,
	blue: f32,
}

impl ColorF32 {
	fn lerp(from: Self, to: Self, t: f32) -> Self {
		Self {
			red: lerp(from.red, to.red, t),
			green: lerp(from.green, to.green, t),
			blue: lerp(from.blue, to.blue, t),
		}
	}
}

const TABLE_STEP: u32 = 500;

/// Whitepoint values at 500K intervals starting at 1000K, from redshift's
/// table. Index 0 is the clamp for temperatures below 1000K.
#[allow(
	clippy::unreadable_literal, // More readable.
	clippy::excessive_precision, // Consistency.
)]
#[rustfmt::skip] // Single-line form.
const WHITE_POINTS: &[ColorF32; 21] = &[
	ColorF32 { red: 1.00000000, green: 0.00000000, blue: 0.00000000 }, // low clamp
	ColorF32 { red: 1.00000000, green: 0.18172716, blue: 0.00000000 }, // 1000K
	ColorF32 { red: 1.00000000, green: 0.42322816, blue: 0.00000000 },
	ColorF32 { red: 1.00000000, green: 0.54360078, blue: 0.08679949 },
	ColorF32 { red: 1.00000000, green: 0.64373109, blue: 0.28819679 },
	ColorF32 { red: 1.00000000, green: 0.71976951, blue: 0.42860152 },
	ColorF32 { red: 1.00000000, green: 0.77987699, blue: 0.54642268 },
	ColorF32 { red: 1.00000000, green: 0.82854786, blue: 0.64816570 },
	ColorF32 { red: 1.00000000, green: 0.86860704, blue: 0.73688797 },
	ColorF32 { red: 1.00000000, green: 0.90198230, blue: 0.81465502 },
	ColorF32 { red: 1.00000000, green: 0.93853986, blue: 0.88130458 },
	ColorF32 { red: 1.00000000, green: 0.97107439, blue: 0.94305985 },
	ColorF32 { red: 1.00000000, green: 1.00000000, blue: 1.00000000 }, // 6500K
	ColorF32 { red: 0.95160805, green: 0.96983355, blue: 1.00000000 },
	ColorF32 { red: 0.91194747, green: 0.94470005, blue: 1.00000000 },
	ColorF32 { red: 0.87906581, green: 0.92357340, blue: 1.00000000 },
	ColorF32 { red: 0.85139976, green: 0.90559011, blue: 1.00000000 },
	ColorF32 { red: 0.82782969, green: 0.89011714, blue: 1.00000000 },
	ColorF32 { red: 0.80753191, green: 0.87667891, blue: 1.00000000 },
	ColorF32 { red: 0.78988728, green: 0.86491137, blue: 1.00000000 }, // 10_000K
	ColorF32 { red: 0.77442176, green: 0.85453121, blue: 1.00000000 },
];

/// Interpolates the whitepoint for a temperature. The bucket index tops out at
/// 19 for 10_000K, so `bucket + 1` always lands on a valid entry.
fn white_point(temperature: Temperature) -> ColorF32 {
	let t = temperature.get() - Temperature::MIN.get();
	let bucket = (t / TABLE_STEP) as usize;
	let ratio = (t % TABLE_STEP) as f32 / TABLE_STEP as f32;
	ColorF32::lerp(WHITE_POINTS[bucket], WHITE_POINTS[bucket + 1], ratio)
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	fn gains(temperature: u32, brightness: f32) -> [f32; 3] {
		Config::coerced(Some(temperature), Some(brightness)).channel_gains()
	}

	fn ramps_for(temperature: u32, brightness: f32, ramp_size: usize) -> GammaRamps {
		let mut ramps = GammaRamps::new(ramp_size);
		Config::coerced(Some(temperature), Some(brightness)).write_ramps(&mut ramps);
		ramps
	}

	#[test]
	fn whitepoint_exact_at_table_boundaries() {
		assert_eq!(gains(500, 1.0), [1.0, 0.0, 0.0]);
		assert_eq!(gains(1000, 1.0), [1.0, 0.18172716, 0.0]);
		assert_eq!(gains(6500, 1.0), [1.0, 1.0, 1.0]);
		assert_eq!(gains(10_000, 1.0), [0.78988728, 0.86491137, 1.0]);
	}

	#[test]
	fn whitepoint_finite_and_bounded_across_domain() {
		for kelvin in 500..=10_000 {
			for gain in gains(kelvin, 1.0) {
				assert!(gain.is_finite(), "gain not finite at {kelvin}K");
				assert!(
					(0.0..=1.0).contains(&gain),
					"gain {gain} out of range at {kelvin}K"
				);
			}
		}
	}

	#[test]
	fn neutral_ramp_matches_reference_values() {
		let mut ramps = ramps_for(6500, 1.0, 4);
		for channel in ramps.channels_mut() {
			assert_eq!(&*channel, &[0, 16383, 32767, 49151]);
		}
	}

	#[test]
	fn warmest_table_entry_zeroes_the_blue_channel() {
		let mut ramps = ramps_for(1000, 1.0, 256);
		let [red, green, blue] = ramps.channels_mut();
		assert!(blue.iter().all(|&v| v == 0));
		assert!(red.iter().skip(1).all(|&v| v > 0));
		assert!(green.iter().skip(1).all(|&v| v > 0));
	}

	#[test]
	fn ramp_generation_is_idempotent() {
		let first = ramps_for(3400, 0.7, 1024);
		let second = ramps_for(3400, 0.7, 1024);
		assert_eq!(first.as_bytes(), second.as_bytes());
	}

	#[test]
	fn ramps_are_pointwise_monotone_in_brightness() {
		let mut previous = ramps_for(3000, 0.1, 256);
		for step in 2..=10 {
			let mut current = ramps_for(3000, step as f32 / 10.0, 256);
			for (prev, cur) in previous
				.channels_mut()
				.into_iter()
				.zip(current.channels_mut())
			{
				assert!(prev.iter().zip(cur.iter()).all(|(p, c)| p <= c));
			}
			previous = current;
		}
	}

	#[test]
	fn ramp_rows_stay_within_u16() {
		// Row 0 is always zero; the last row must survive rounding at every
		// ramp size, including sizes that are not powers of two.
		for ramp_size in [4, 255, 256, 1024] {
			let mut ramps = ramps_for(6500, 1.0, ramp_size);
			for channel in ramps.channels_mut() {
				assert_eq!(channel[0], 0);
				// The base value never reaches 65535.0 exactly, and the
				// saturating cast would clamp it even if rounding overshot.
				assert!(channel[ramp_size - 1] < u16::MAX);
				assert!(channel[ramp_size - 1] > channel[ramp_size - 2]);
			}
		}
	}

	#[test]
	fn out_of_range_inputs_coerce_to_defaults_independently() {
		let config = Config::coerced(Some(99_999), Some(0.5));
		assert_eq!(config.temperature, Temperature::NEUTRAL);
		assert_eq!(config.brightness, 0.5);

		let config = Config::coerced(Some(3000), Some(5.0));
		assert_eq!(config.temperature.get(), 3000);
		assert_eq!(config.brightness, 1.0);

		let config = Config::coerced(None, None);
		assert_eq!(config.temperature, Temperature::NEUTRAL);
		assert_eq!(config.brightness, 1.0);
	}
}
