//! Content fingerprints for catalog generations

use xxhash_rust::xxh3::Xxh3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint(u64);

impl Fingerprint {
	/// Hash product ids and the exact bits of their vectors, in order
	pub fn of_entries<'a, I>(entries: I) -> Self
	where
		I: IntoIterator<Item = (u64, &'a [f32])>,
	{
		let mut hasher = Xxh3::new();
		for (id, vector) in entries {
			hasher.update(&id.to_le_bytes());
			for v in vector {
				hasher.update(&v.to_bits().to_le_bytes());
			}
		}
		Self(hasher.digest())
	}

	pub fn short(&self) -> String {
		format!("{:08x}", self.0 >> 32)
	}
}

impl std::fmt::Display for Fingerprint {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{:016x}", self.0)
	}
}
